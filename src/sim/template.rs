//! Track templates: the level-design vocabulary
//!
//! Every template kind maps to one fixed recipe of surfaces and obstacles laid out on
//! the block grid. Courses are plain ordered lists of template kinds, so adding a
//! course is just data (see `crate::tracks`).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::element::{ElementType, Obstacle, Surface, TrackElement};
use super::geom::Area;
use crate::consts::*;
use crate::error::TrackError;

/// One slice kind of a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackTemplate {
    FullWidth,
    Basic,
    Narrow,
    VeryNarrow,
    RightPassage,
    DualPassage,
    DualPassageExt,
    TriplePassage,
    BasicSlope,
    BasicSteepSlope,
    SlopeEmptyPassage,
    PassageEmptySlope,
    SlopeEmptySlope,
    SlopeObstacleSlope,
    FullWidthWithObstacleAtCenter,
    FullWidthWithObstacles,
    FullWidthWithMoreObstacles,
    FullWidthWithObstaclesOnRight,
    FullWidthWithObstaclesOnRight2,
    Chasm,
    Raft,
    TwoRafts,
    Checkpoint,
    Finish,
}

/// How a recipe surface behaves
#[derive(Debug, Clone, Copy)]
enum Kind {
    Solid,
    Slope(f32),
    /// Raft that starts at home heading out
    RaftOut,
    /// Raft that starts docked at the far end
    RaftDocked,
}

/// Surface spanning block columns `first..=last`
#[derive(Debug, Clone, Copy)]
struct Span {
    first: usize,
    last: usize,
    kind: Kind,
}

const fn solid(first: usize, last: usize) -> Span {
    Span {
        first,
        last,
        kind: Kind::Solid,
    }
}

const fn slope(first: usize, last: usize, force: f32) -> Span {
    Span {
        first,
        last,
        kind: Kind::Slope(force),
    }
}

const fn raft(first: usize, last: usize, kind: Kind) -> Span {
    Span { first, last, kind }
}

struct Recipe {
    element_type: ElementType,
    surfaces: &'static [Span],
    /// Obstacle columns, vertically centred in the element
    obstacles: &'static [usize],
}

const GENTLE_SLOPE: f32 = 0.3;
const STEEP_SLOPE: f32 = 0.6;
const SIDE_SLOPE: f32 = 0.4;

const FULL: &[Span] = &[solid(0, 8)];
const BASIC: &[Span] = &[solid(1, 7)];
const NARROW: &[Span] = &[solid(2, 6)];
const VERY_NARROW: &[Span] = &[solid(3, 5)];
const RIGHT_PASSAGE: &[Span] = &[solid(5, 7)];
const DUAL: &[Span] = &[solid(1, 2), solid(6, 7)];
const DUAL_EXT: &[Span] = &[solid(0, 2), solid(6, 8)];
const TRIPLE: &[Span] = &[solid(0, 1), solid(4, 4), solid(7, 8)];
const BASIC_SLOPE: &[Span] = &[slope(1, 7, GENTLE_SLOPE)];
const STEEP_SLOPE_SPANS: &[Span] = &[slope(1, 7, STEEP_SLOPE)];
const SLOPE_EMPTY_PASSAGE: &[Span] = &[slope(0, 2, SIDE_SLOPE), solid(6, 8)];
const PASSAGE_EMPTY_SLOPE: &[Span] = &[solid(0, 2), slope(6, 8, SIDE_SLOPE)];
const SLOPE_EMPTY_SLOPE: &[Span] = &[slope(0, 2, SIDE_SLOPE), slope(6, 8, SIDE_SLOPE)];
const SLOPE_OBSTACLE_SLOPE: &[Span] = &[
    slope(0, 3, SIDE_SLOPE),
    solid(4, 4),
    slope(5, 8, SIDE_SLOPE),
];
const ONE_RAFT: &[Span] = &[raft(3, 5, Kind::RaftOut)];
const TWO_RAFTS: &[Span] = &[raft(1, 2, Kind::RaftOut), raft(6, 7, Kind::RaftDocked)];

fn recipe(template: TrackTemplate) -> Recipe {
    use ElementType::Normal;
    use TrackTemplate as T;

    let (element_type, surfaces, obstacles): (ElementType, &'static [Span], &'static [usize]) =
        match template {
            T::FullWidth => (Normal, FULL, &[]),
            T::Basic => (Normal, BASIC, &[]),
            T::Narrow => (Normal, NARROW, &[]),
            T::VeryNarrow => (Normal, VERY_NARROW, &[]),
            T::RightPassage => (Normal, RIGHT_PASSAGE, &[]),
            T::DualPassage => (Normal, DUAL, &[]),
            T::DualPassageExt => (Normal, DUAL_EXT, &[]),
            T::TriplePassage => (Normal, TRIPLE, &[]),
            T::BasicSlope => (Normal, BASIC_SLOPE, &[]),
            T::BasicSteepSlope => (Normal, STEEP_SLOPE_SPANS, &[]),
            T::SlopeEmptyPassage => (Normal, SLOPE_EMPTY_PASSAGE, &[]),
            T::PassageEmptySlope => (Normal, PASSAGE_EMPTY_SLOPE, &[]),
            T::SlopeEmptySlope => (Normal, SLOPE_EMPTY_SLOPE, &[]),
            T::SlopeObstacleSlope => (Normal, SLOPE_OBSTACLE_SLOPE, &[4]),
            T::FullWidthWithObstacleAtCenter => (Normal, FULL, &[4]),
            T::FullWidthWithObstacles => (Normal, FULL, &[1, 3, 5, 7]),
            T::FullWidthWithMoreObstacles => (Normal, FULL, &[0, 2, 4, 6, 8]),
            T::FullWidthWithObstaclesOnRight => (Normal, FULL, &[5, 7]),
            T::FullWidthWithObstaclesOnRight2 => (Normal, FULL, &[6, 8]),
            T::Chasm => (Normal, &[], &[]),
            T::Raft => (ElementType::Raft, ONE_RAFT, &[]),
            T::TwoRafts => (ElementType::Raft, TWO_RAFTS, &[]),
            T::Checkpoint => (ElementType::Checkpoint, FULL, &[]),
            T::Finish => (ElementType::Finish, FULL, &[]),
        };

    Recipe {
        element_type,
        surfaces,
        obstacles,
    }
}

impl TrackTemplate {
    /// Lays down a raft that later elements can cross a chasm on
    pub fn has_raft(self) -> bool {
        matches!(self, TrackTemplate::Raft | TrackTemplate::TwoRafts)
    }

    /// Has any surface at its home position
    pub fn is_walkable(self) -> bool {
        self != TrackTemplate::Chasm
    }
}

/// Reject courses that can't be raced
pub fn validate_templates(templates: &[TrackTemplate]) -> Result<(), TrackError> {
    let (first, last) = match (templates.first(), templates.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(TrackError::Empty),
    };

    if !first.is_walkable() || first.has_raft() {
        return Err(TrackError::UnwalkableStart);
    }

    let finishes = templates
        .iter()
        .filter(|t| **t == TrackTemplate::Finish)
        .count();
    if last != TrackTemplate::Finish || finishes != 1 {
        return Err(TrackError::MissingFinish);
    }

    for (index, pair) in templates.windows(2).enumerate() {
        if pair[1] == TrackTemplate::Chasm && !pair[0].has_raft() {
            return Err(TrackError::UnbridgedChasm { index: index + 1 });
        }
    }

    Ok(())
}

/// Build the elements for `templates`, element `i` starting at
/// `start_y - ELEMENT_HEIGHT * (i + 1)`
pub fn create_track(templates: &[TrackTemplate], start_y: f32) -> Vec<TrackElement> {
    let mut next_obstacle_id = 1;

    templates
        .iter()
        .enumerate()
        .map(|(i, template)| {
            let y = start_y - ELEMENT_HEIGHT * (i + 1) as f32;
            let center_y = y + ELEMENT_HEIGHT / 2.0;
            let recipe = recipe(*template);

            let surfaces = recipe
                .surfaces
                .iter()
                .map(|span| {
                    let x = LEFTMOST_EDGE + span.first as f32 * BLOCK_WIDTH;
                    let width = (span.last - span.first + 1) as f32 * BLOCK_WIDTH;
                    let area = Area::new(x, y, width, ELEMENT_HEIGHT);
                    match span.kind {
                        Kind::Solid => Surface::solid(area),
                        Kind::Slope(force) => Surface::slope(area, force),
                        Kind::RaftOut => Surface::raft(area, -1.0),
                        Kind::RaftDocked => Surface::raft(
                            Area {
                                y: y - ELEMENT_HEIGHT,
                                ..area
                            },
                            0.0,
                        ),
                    }
                })
                .collect();

            let obstacles = recipe
                .obstacles
                .iter()
                .map(|col| {
                    let id = next_obstacle_id;
                    next_obstacle_id += 1;
                    Obstacle::new(
                        id,
                        Vec2::new(
                            LEFTMOST_EDGE + *col as f32 * BLOCK_WIDTH,
                            center_y - OBSTACLE_HEIGHT / 2.0,
                        ),
                    )
                })
                .collect();

            TrackElement::new(y, recipe.element_type, surfaces, obstacles)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::element::BlockType;
    use TrackTemplate as T;

    #[test]
    fn test_elements_stack_toward_finish() {
        let elements = create_track(&[T::Checkpoint, T::Basic, T::Finish], 400.0);
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].y, 384.0);
        assert_eq!(elements[1].y, 368.0);
        assert_eq!(elements[2].y, 352.0);
        assert_eq!(elements[0].element_type, ElementType::Checkpoint);
        assert_eq!(elements[2].element_type, ElementType::Finish);
    }

    #[test]
    fn test_dual_passage_columns() {
        let elements = create_track(&[T::DualPassage], 0.0);
        let free: Vec<usize> = (0..BLOCK_COUNT)
            .filter(|c| elements[0].block_type(*c) == BlockType::Free)
            .collect();
        assert_eq!(free, vec![1, 2, 6, 7]);
        assert_eq!(elements[0].min_x, LEFTMOST_EDGE + BLOCK_WIDTH);
        assert_eq!(elements[0].max_x, RIGHTMOST_EDGE - BLOCK_WIDTH);
    }

    #[test]
    fn test_obstacles_get_unique_ids() {
        let elements = create_track(
            &[T::FullWidthWithObstacles, T::FullWidthWithMoreObstacles],
            0.0,
        );
        let mut ids: Vec<u32> = elements
            .iter()
            .flat_map(|e| e.obstacles.iter().map(|o| o.id))
            .collect();
        assert_eq!(ids.len(), 9);
        ids.dedup();
        assert_eq!(ids.len(), 9);
        assert_eq!(elements[1].block_type(4), BlockType::Obstacle);
        assert_eq!(elements[1].block_type(3), BlockType::Free);
    }

    #[test]
    fn test_two_rafts_start_out_of_phase() {
        let elements = create_track(&[T::TwoRafts], 0.0);
        let e = &elements[0];
        assert_eq!(e.element_type, ElementType::Raft);
        assert_eq!(e.surfaces[0].area.y, e.y);
        assert_eq!(e.surfaces[1].area.y, e.y - ELEMENT_HEIGHT);
        // Only the raft at home makes its columns vacant right now
        assert!(e.blocks[1]);
        assert!(!e.blocks[6]);
    }

    #[test]
    fn test_validate_templates() {
        assert_eq!(validate_templates(&[]), Err(TrackError::Empty));
        assert_eq!(
            validate_templates(&[T::Chasm, T::Finish]),
            Err(TrackError::UnwalkableStart)
        );
        assert_eq!(
            validate_templates(&[T::Checkpoint, T::Basic]),
            Err(TrackError::MissingFinish)
        );
        assert_eq!(
            validate_templates(&[T::Checkpoint, T::Finish, T::Basic, T::Finish]),
            Err(TrackError::MissingFinish)
        );
        assert_eq!(
            validate_templates(&[T::Checkpoint, T::Basic, T::Chasm, T::Finish]),
            Err(TrackError::UnbridgedChasm { index: 2 })
        );
        assert_eq!(
            validate_templates(&[T::Checkpoint, T::Raft, T::Chasm, T::Chasm, T::Finish]),
            Err(TrackError::UnbridgedChasm { index: 3 })
        );
        assert!(validate_templates(&[T::Checkpoint, T::Raft, T::Chasm, T::Finish]).is_ok());
    }
}
