//! Autonomous navigation for computer-controlled characters
//!
//! The AI thinks in blocks: it picks a Free or Raft block in the row ahead,
//! walks sideways until it lines up with it and then walks forward. Every new
//! target rerolls a horizontal margin so a crowd sharing a column does not walk
//! in lockstep.
//!
//! Obstacles are steered around rather than walked into. Each obstacle near the
//! host gets a keep-out zone the size of its collision reach; sideways moves
//! slide through the gaps between zones and forward moves step off a zone's
//! column before they meet it.

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::element::BlockType;
use super::geom::Area;
use super::physics::{CHARACTER_STOP_ACCELERATION, obstacle_reach};
use super::track::{Block, Track};
use crate::consts::*;
use crate::random_min_max;

/// Closer than this to the edge of its row, a waiting AI stops creeping forward
pub const WAIT_DISTANCE: f32 = 3.0;
/// Extra room kept around an obstacle's reach
const CLEARANCE: f32 = 0.3;
/// How far past a keep-out zone edge a lane runs
const LANE_EPSILON: f32 = 0.2;
/// Minimum distance kept from the zones in front and behind while sliding sideways
const LANE_MARGIN: f32 = 1.0;
/// A sideways slide holds this far beyond the point where the target row is reached
const LANE_OVERREACH: f32 = 0.5;
/// Riders keep at least this much raft under them on both sides
const RAFT_FOOTING: f32 = 1.0;

/// Per-character navigation state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ai {
    target: Option<Block>,
    horizontal_margin: f32,
}

impl Ai {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the current target (respawn, knock-back)
    pub fn reset(&mut self) {
        self.target = None;
    }

    pub fn target(&self) -> Option<&Block> {
        self.target.as_ref()
    }

    pub fn horizontal_margin(&self) -> f32 {
        self.horizontal_margin
    }

    /// Movement intent for `host` moving at `velocity` this tick: unit length or zero
    pub fn movement<R: Rng + ?Sized>(
        &mut self,
        host: Area,
        velocity: Vec2,
        track: &Track,
        rng: &mut R,
    ) -> Vec2 {
        if track.is_empty() {
            return Vec2::ZERO;
        }

        let center = host.center();
        // Row by the back edge, the same edge `has_reached_target` looks at
        let current = track.block_at(Vec2::new(center.x, host.bottom()));
        let element = track.get(current.row);

        // Riding a raft across a chasm: keep both feet on it and stay put until it docks
        if element.is_chasm() {
            if let Some(raft) = track.raft_under(&host) {
                if host.left() < raft.left() + RAFT_FOOTING {
                    return Vec2::X;
                }
                if host.right() > raft.right() - RAFT_FOOTING {
                    return Vec2::NEG_X;
                }
            }
            if !track.is_free(current.row, current.col) && host.top() >= element.y {
                return Vec2::ZERO;
            }
        }

        let needs_target = match &self.target {
            None => true,
            Some(target) => has_reached_target(&host, target),
        };
        if needs_target {
            self.target = self.choose_target(&host, &current, track, rng);
        }
        let Some(target) = self.target else {
            // Stuck; the world may change by next tick
            return Vec2::ZERO;
        };

        // Knocked back, or somehow past the target
        if target.row < current.row || target.row > current.row + 1 {
            self.target = None;
            return Vec2::ZERO;
        }

        let zones = keep_out_zones(&host, track, current.row);
        let span_left = target.area.left() + self.horizontal_margin;
        let span_right = target.area.right() - self.horizontal_margin;
        let lateral = if center.x < span_left {
            1
        } else if center.x > span_right {
            -1
        } else {
            0
        };

        if lateral != 0 {
            let side_col = current.col + lateral;
            let side = track.block_type(current.row, side_col);
            let next_row = current.row + 1;

            if side.is_crossable() {
                let to_x = if lateral > 0 { span_left } else { span_right };
                let route = Route::new(&host, &target, &zones, to_x);
                let aim_x = (span_left + span_right) / 2.0;
                if let Some(steer) = steer_around(&host, velocity, track, &route, aim_x) {
                    return steer;
                }

                let in_front_half = center.y < element.y + element.height / 2.0;
                if side == BlockType::Free
                    && in_front_half
                    && next_row < track.len()
                    && track.is_free(next_row, side_col)
                {
                    return Vec2::new(lateral as f32, -1.0).normalize();
                }
                return Vec2::new(lateral as f32, 0.0);
            }

            // No way sideways in this row; try to find one in the next
            if current.col != target.col {
                if next_row < track.len() && track.is_free(next_row, current.col) {
                    return forward(center, &target);
                }
                self.target = None;
                return Vec2::ZERO;
            }
        }

        if track.is_free(target.row, target.col) {
            let reach_y = target.area.bottom() - host.height / 2.0;
            if let Some(zone) = blocker_ahead(&zones, center, reach_y) {
                return sidestep(track, current.row, zone, center);
            }
            return forward(center, &target);
        }

        // Target is a raft that isn't here yet
        if element.has_raft() || element.is_chasm() {
            return Vec2::ZERO;
        }
        if host.top() - element.y < WAIT_DISTANCE {
            return Vec2::ZERO;
        }
        forward(center, &target)
    }

    fn choose_target<R: Rng + ?Sized>(
        &mut self,
        host: &Area,
        current: &Block,
        track: &Track,
        rng: &mut R,
    ) -> Option<Block> {
        let row = (current.row + 1).min(track.len() - 1);
        let col = current.col.clamp(0, BLOCK_COUNT as i32 - 1);

        self.horizontal_margin = random_min_max(rng, host.width * 0.6, BLOCK_WIDTH * 0.45);

        if is_target(track, row, col) {
            return Some(track.block(row, col));
        }

        // Walk outward while the current row still offers a sideways path
        let mut open = [true, true];
        for i in 1..BLOCK_COUNT as i32 {
            let mut sides = [(0, -i), (1, i)];
            if rng.random_bool(0.5) {
                sides.swap(0, 1);
            }
            for (side, offset) in sides {
                if !open[side] {
                    continue;
                }
                let c = col + offset;
                if !track.block_type(current.row, c).is_crossable() {
                    open[side] = false;
                    continue;
                }
                if is_target(track, row, c) {
                    return Some(track.block(row, c));
                }
            }
            if !open[0] && !open[1] {
                break;
            }
        }

        // A raft on the far side of a chasm is out of reach until it comes back
        if track.get(row).is_chasm() {
            return None;
        }
        (0..BLOCK_COUNT as i32)
            .find(|&c| is_target(track, row, c))
            .map(|c| track.block(row, c))
    }
}

/// Blocks worth aiming for; over a chasm only where a raft is parked right now
fn is_target(track: &Track, row: usize, col: i32) -> bool {
    if track.get(row).is_chasm() {
        return track.is_free(row, col);
    }
    track.block_type(row, col).is_target()
}

/// The host's bottom edge has crossed into the target row over the target column
#[inline]
fn has_reached_target(host: &Area, target: &Block) -> bool {
    let x = host.center().x;
    host.bottom() < target.area.bottom() && target.area.left() <= x && x < target.area.right()
}

/// Toward the finish, nudged back toward the middle of the target column
fn forward(center: Vec2, target: &Block) -> Vec2 {
    let dx = ((target.area.center().x - center.x) / BLOCK_WIDTH).clamp(-0.5, 0.5);
    Vec2::new(dx, -1.0).normalize()
}

/// Distance covered while braking from `speed` to a standstill, signed like `speed`
fn stopping_offset(speed: f32) -> f32 {
    speed * speed.abs() / (2.0 * CHARACTER_STOP_ACCELERATION)
}

/// Centre positions the host must keep out of, for obstacles in the rows around `row`
fn keep_out_zones(host: &Area, track: &Track, row: usize) -> Vec<Area> {
    let rows = row.saturating_sub(1)..(row + 2).min(track.len());
    rows.flat_map(move |r| track.get(r).obstacles.iter())
        .map(|obstacle| {
            let reach = obstacle_reach(host, &obstacle.area) + Vec2::splat(CLEARANCE);
            let c = obstacle.area.center();
            Area::new(c.x - reach.x, c.y - reach.y, reach.x * 2.0, reach.y * 2.0)
        })
        .collect()
}

#[inline]
fn spans_x(zone: &Area, x: f32) -> bool {
    zone.left() < x && x < zone.right()
}

#[inline]
fn spans_y(zone: &Area, y: f32) -> bool {
    zone.top() < y && y < zone.bottom()
}

/// A centre walking along column `x` between `from_y` and `to_y` enters `zone`
fn blocks_column(zone: &Area, x: f32, from_y: f32, to_y: f32) -> bool {
    spans_x(zone, x) && zone.top() < from_y.max(to_y) && zone.bottom() > from_y.min(to_y)
}

/// The nearest zone in front of `center` on its way forward to `to_y`
fn blocker_ahead(zones: &[Area], center: Vec2, to_y: f32) -> Option<&Area> {
    zones
        .iter()
        .filter(|z| z.top() < center.y && blocks_column(z, center.x, center.y, to_y))
        .max_by(|a, b| a.bottom().total_cmp(&b.bottom()))
}

/// Sideways off the column of `zone`, toward its nearer edge the row allows
fn sidestep(track: &Track, row: usize, zone: &Area, center: Vec2) -> Vec2 {
    let edges = [
        (zone.left() - LANE_EPSILON, Vec2::NEG_X),
        (zone.right() + LANE_EPSILON, Vec2::X),
    ];
    edges
        .into_iter()
        .filter(|&(x, _)| {
            let col = ((x - LEFTMOST_EDGE) / BLOCK_WIDTH).floor() as i32;
            track.block_type(row, col).is_crossable()
        })
        .min_by(|a, b| (a.0 - center.x).abs().total_cmp(&(b.0 - center.x).abs()))
        .map_or(Vec2::ZERO, |(_, direction)| direction)
}

/// Host standing with its centre at height `y` still has ground under it
fn is_footed(track: &Track, host: &Area, y: f32) -> bool {
    let spot = Area::new(host.x, y - host.height / 2.0, host.width, host.height);
    track.is_on_platform(track.between(spot.top(), spot.bottom()), &spot)
}

/// Geometry of one sideways move toward the target span
struct Route<'a> {
    to_x: f32,
    zones: &'a [Area],
    /// Zones lying across the sideways path
    crossing: Vec<&'a Area>,
    /// Centre height at which the host's back edge enters the target row
    reach_y: f32,
    lower: f32,
    upper: f32,
}

impl<'a> Route<'a> {
    fn new(host: &Area, target: &Block, zones: &'a [Area], to_x: f32) -> Self {
        let x = host.center().x;
        let (lo, hi) = (x.min(to_x), x.max(to_x));
        let bottom = target.area.bottom();
        Self {
            to_x,
            zones,
            crossing: zones.iter().filter(|z| z.left() < hi && z.right() > lo).collect(),
            reach_y: bottom - host.height / 2.0,
            lower: bottom - host.height,
            upper: bottom + ELEMENT_HEIGHT - host.height / 2.0,
        }
    }

    /// Sliding sideways at centre height `y` meets no zone, and neither does the
    /// walk forward from the end of the slide
    fn is_open_at(&self, y: f32) -> bool {
        if self.crossing.iter().any(|z| spans_y(z, y)) {
            return false;
        }
        y <= self.reach_y
            || !self
                .zones
                .iter()
                .any(|z| blocks_column(z, self.to_x, y, self.reach_y))
    }

    /// Nearest height the host can walk straight to and slide sideways from
    fn find_lane(&self, host: &Area, track: &Track) -> Option<f32> {
        let center = host.center();
        self.zones
            .iter()
            .flat_map(|z| [z.top() - LANE_EPSILON, z.bottom() + LANE_EPSILON])
            .filter(|&y| (self.lower..=self.upper).contains(&y))
            .filter(|&y| self.is_open_at(y))
            .filter(|&y| !self.zones.iter().any(|z| blocks_column(z, center.x, center.y, y)))
            .filter(|&y| is_footed(track, host, y))
            .min_by(|a, b| (a - center.y).abs().total_cmp(&(b - center.y).abs()))
    }
}

/// Movement for a sideways move that has obstacles to mind, or `None` when the
/// plain sideways rules apply
fn steer_around(
    host: &Area,
    velocity: Vec2,
    track: &Track,
    route: &Route,
    aim_x: f32,
) -> Option<Vec2> {
    let center = host.center();
    let predicted = center + Vec2::new(stopping_offset(velocity.x), stopping_offset(velocity.y));

    if route.is_open_at(center.y) {
        if route.crossing.is_empty() {
            return None;
        }
        // Slide between the zones in front and behind, as far forward as they allow
        let front = route
            .crossing
            .iter()
            .map(|z| z.bottom())
            .filter(|&b| b <= center.y)
            .fold(route.lower.min(center.y), f32::max);
        let back = route
            .crossing
            .iter()
            .map(|z| z.top())
            .filter(|&t| t >= center.y)
            .fold(route.upper.max(center.y), f32::min);
        let mut hold = if back - front > 2.0 * LANE_MARGIN {
            (route.reach_y - LANE_OVERREACH).clamp(front + LANE_MARGIN, back - LANE_MARGIN)
        } else {
            (front + back) / 2.0
        };
        if !is_footed(track, host, hold) {
            hold = hold.max(route.reach_y + LANE_MARGIN);
        }
        let dx = (aim_x - predicted.x).clamp(-1.0, 1.0);
        let dy = (hold - predicted.y).clamp(-1.0, 1.0);
        return Some(Vec2::new(dx, dy).normalize_or_zero());
    }

    if let Some(lane) = route.find_lane(host, track) {
        return Some(if lane < predicted.y { Vec2::NEG_Y } else { Vec2::Y });
    }

    let row = track.block_at(Vec2::new(center.x, host.bottom())).row;
    blocker_ahead(route.zones, center, route.lower).map(|zone| sidestep(track, row, zone, center))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::character::Character;
    use crate::sim::template::TrackTemplate as T;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn host_at(track: &Track, row: usize, x: f32) -> Area {
        // Lower part of the element, clear of its front edge
        let y = track.get(row).y + ELEMENT_HEIGHT - 4.0;
        Area::new(x - 1.5, y, 3.0, 3.0)
    }

    fn col_center(col: i32) -> f32 {
        LEFTMOST_EDGE + (col as f32 + 0.5) * BLOCK_WIDTH
    }

    #[test]
    fn test_walks_forward_on_open_track() {
        let track = Track::new(&[T::FullWidth, T::FullWidth, T::Finish], 400.0).unwrap();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut ai = Ai::new();
        let host = host_at(&track, 0, col_center(4));

        let m = ai.movement(host, Vec2::ZERO, &track, &mut rng);
        let target = ai.target().copied().unwrap();
        assert_eq!((target.row, target.col), (1, 4));
        assert!(m.y < 0.0);
        assert!((m.length() - 1.0).abs() < 1e-5);
        assert!(ai.horizontal_margin() >= 1.8 && ai.horizontal_margin() <= 4.5);
    }

    #[test]
    fn test_steers_sideways_into_passage() {
        let track = Track::new(&[T::FullWidth, T::DualPassage, T::Finish], 400.0).unwrap();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut ai = Ai::new();
        let host = host_at(&track, 0, col_center(4));

        let m = ai.movement(host, Vec2::ZERO, &track, &mut rng);
        let target = ai.target().copied().unwrap();
        assert_eq!(target.row, 1);
        assert!(target.col == 2 || target.col == 6, "col {}", target.col);
        // Lower half of the element: purely sideways
        assert_eq!(m.y, 0.0);
        assert_eq!(m.x.signum(), (target.col - 4).signum() as f32);
    }

    #[test]
    fn test_goes_diagonal_in_front_half() {
        let track = Track::new(&[T::FullWidth, T::FullWidth, T::Finish], 400.0).unwrap();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut ai = Ai::new();
        // Off to the left edge of column 0, in the front half of row 0
        let y = track.get(0).y + 2.0;
        let host = Area::new(LEFTMOST_EDGE + 0.5, y, 3.0, 3.0);
        ai.target = Some(track.block(1, 1));
        ai.horizontal_margin = 2.0;

        let m = ai.movement(host, Vec2::ZERO, &track, &mut rng);
        assert!(m.x > 0.0 && m.y < 0.0);
    }

    #[test]
    fn test_rides_raft_while_chasm_ahead() {
        let track =
            Track::new(&[T::FullWidth, T::Raft, T::Chasm, T::FullWidth, T::Finish], 400.0)
                .unwrap();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut ai = Ai::new();
        // Standing on the raft at home: nothing to aim for until it crosses
        let host = host_at(&track, 1, col_center(4));

        assert_eq!(ai.movement(host, Vec2::ZERO, &track, &mut rng), Vec2::ZERO);
        assert!(ai.target().is_none());
    }

    #[test]
    fn test_waits_for_raft_at_row_edge() {
        let track = Track::new(
            &[T::FullWidth, T::TwoRafts, T::Chasm, T::FullWidth, T::Finish],
            400.0,
        )
        .unwrap();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut ai = Ai::new();
        // Right-hand raft starts docked over the chasm, away from its slot
        ai.target = Some(track.block(1, 6));
        ai.horizontal_margin = 2.0;
        assert!(!track.is_free(1, 6));

        let edge = track.get(0).y;
        let near = Area::new(col_center(6) - 1.5, edge + 1.0, 3.0, 3.0);
        assert_eq!(ai.movement(near, Vec2::ZERO, &track, &mut rng), Vec2::ZERO);

        let far = host_at(&track, 0, col_center(6));
        assert!(ai.movement(far, Vec2::ZERO, &track, &mut rng).y < 0.0);
    }

    #[test]
    fn test_knocked_back_clears_target() {
        let track = Track::new(&[T::FullWidth, T::FullWidth, T::FullWidth, T::Finish], 400.0)
            .unwrap();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut ai = Ai::new();
        ai.target = Some(track.block(3, 4));
        let host = host_at(&track, 0, col_center(4));

        assert_eq!(ai.movement(host, Vec2::ZERO, &track, &mut rng), Vec2::ZERO);
        assert!(ai.target().is_none());
    }

    #[test]
    fn test_retargets_after_reaching_row() {
        let track = Track::new(&[T::FullWidth, T::FullWidth, T::FullWidth, T::Finish], 400.0)
            .unwrap();
        let mut rng = Pcg32::seed_from_u64(4);
        let mut ai = Ai::new();
        ai.target = Some(track.block(1, 4));
        let host = host_at(&track, 1, col_center(4));

        ai.movement(host, Vec2::ZERO, &track, &mut rng);
        assert_eq!(ai.target().map(|b| b.row), Some(2));
    }

    #[test]
    fn test_target_reached_only_over_its_column() {
        let track = Track::new(&[T::FullWidth, T::FullWidth, T::FullWidth, T::Finish], 400.0)
            .unwrap();
        let mut rng = Pcg32::seed_from_u64(6);
        let mut ai = Ai::new();
        ai.target = Some(track.block(1, 2));
        ai.horizontal_margin = 2.0;
        // Into the target row, two columns off to the right
        let host = host_at(&track, 1, col_center(4));

        let m = ai.movement(host, Vec2::ZERO, &track, &mut rng);
        assert_eq!(ai.target().map(|b| (b.row, b.col)), Some((1, 2)));
        assert_eq!(m, Vec2::NEG_X);
    }

    #[test]
    fn test_walks_to_lane_before_sliding_past_obstacle() {
        // Obstacles at columns 1, 3, 5, 7 then 0, 2, 4, 6, 8
        let track = Track::new(
            &[
                T::FullWidth,
                T::FullWidthWithObstacles,
                T::FullWidthWithMoreObstacles,
                T::FullWidth,
                T::Finish,
            ],
            400.0,
        )
        .unwrap();
        let mut rng = Pcg32::seed_from_u64(8);
        let mut ai = Ai::new();
        ai.target = Some(track.block(2, 3));
        ai.horizontal_margin = 2.0;
        let row_y = track.get(1).y;

        // Level with the column 3 obstacle: walk forward out of its way first
        let beside = Area::new(-1.5, row_y + 6.5, 3.0, 3.0);
        assert_eq!(ai.movement(beside, Vec2::ZERO, &track, &mut rng), Vec2::NEG_Y);

        // In the lane in front of it: slide over while easing forward
        let in_lane = Area::new(-1.5, row_y + 0.5, 3.0, 3.0);
        let m = ai.movement(in_lane, Vec2::ZERO, &track, &mut rng);
        assert!(m.x < 0.0 && m.y < 0.0, "{m}");
        assert_eq!(ai.target().map(|b| (b.row, b.col)), Some((2, 3)));
    }

    #[test]
    fn test_sidesteps_obstacle_ahead() {
        let track = Track::new(
            &[T::FullWidth, T::FullWidthWithObstacleAtCenter, T::FullWidth, T::Finish],
            400.0,
        )
        .unwrap();
        let mut rng = Pcg32::seed_from_u64(9);
        let mut ai = Ai::new();
        ai.target = Some(track.block(2, 4));
        ai.horizontal_margin = 2.0;
        // Right behind the centre obstacle, lined up with the target
        let host = Area::new(-1.5, track.get(1).y + 12.0, 3.0, 3.0);

        assert_eq!(ai.movement(host, Vec2::ZERO, &track, &mut rng), Vec2::NEG_X);
    }

    #[test]
    fn test_ignores_raft_docked_across_chasm() {
        let track = Track::new(
            &[T::FullWidth, T::TwoRafts, T::Chasm, T::FullWidth, T::Finish],
            400.0,
        )
        .unwrap();
        let mut rng = Pcg32::seed_from_u64(12);
        let mut ai = Ai::new();
        // On the left raft at home; the right one sits over the chasm
        let host = host_at(&track, 1, col_center(1));

        assert_eq!(ai.movement(host, Vec2::ZERO, &track, &mut rng), Vec2::ZERO);
        assert!(ai.target().is_none());
    }

    #[test]
    fn test_keeps_footing_on_moving_raft() {
        let mut track =
            Track::new(&[T::FullWidth, T::Raft, T::Chasm, T::FullWidth, T::Finish], 400.0)
                .unwrap();
        let mut riders: Vec<Character> = Vec::new();
        for i in 1..=100 {
            track.update(i as f32 * FRAME_DT, FRAME_DT, &mut riders);
        }
        let raft = track.get(1).surfaces[0].area;
        let y = track.get(2).y + 8.0;
        assert!(raft.top() < y && y + 3.0 < raft.bottom());
        let mut rng = Pcg32::seed_from_u64(13);
        let mut ai = Ai::new();

        // Right foot past the raft's edge: step back on
        let edge = Area::new(raft.right() - 0.16, y, 3.0, 3.0);
        assert_eq!(ai.movement(edge, Vec2::ZERO, &track, &mut rng), Vec2::NEG_X);
        let edge = Area::new(raft.left() - 2.5, y, 3.0, 3.0);
        assert_eq!(ai.movement(edge, Vec2::ZERO, &track, &mut rng), Vec2::X);

        // Well on board: wait for the dock
        let centred = Area::new(-1.5, y, 3.0, 3.0);
        assert_eq!(ai.movement(centred, Vec2::ZERO, &track, &mut rng), Vec2::ZERO);
    }
}
