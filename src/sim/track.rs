//! The track: an ordered stack of elements from the starting line to the finish
//!
//! Element 0 sits just above `start_y`; every following element is one
//! `ELEMENT_HEIGHT` closer to the finish (smaller Y). A point exactly on the border
//! of two elements belongs to the one nearer the start.

use glam::Vec2;
use serde::Serialize;

use super::element::{BlockType, ElementType, RaftMotion, SurfaceKind, TrackElement};
use super::geom::{Area, includes, overlap};
use super::physics::MAX_SPEED;
use super::template::{TrackTemplate, create_track, validate_templates};
use crate::clamp_speed;
use crate::consts::*;
use crate::error::TrackError;

/// Something the track can push around: slopes change its velocity, rafts carry it
pub trait Body {
    /// Out of the race or mid-fall bodies are left where they are
    fn is_grounded(&self) -> bool;
    fn area(&self) -> Area;
    fn velocity_mut(&mut self) -> &mut Vec2;
    fn translate_y(&mut self, dy: f32);
}

/// Element indices `start..end` (half-open; may be empty)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub start: usize,
    pub end: usize,
}

impl IndexRange {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, i: usize) -> bool {
        self.start <= i && i < self.end
    }

    pub fn iter(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// One cell of the coarse grid the AI navigates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Block {
    pub row: usize,
    /// May lie outside `0..BLOCK_COUNT` when looked up off the track
    pub col: i32,
    pub area: Area,
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    element: usize,
    /// Crossing above this Y (minus forgiveness) counts as passing the checkpoint
    y: f32,
}

#[derive(Debug, Clone)]
pub struct Track {
    elements: Vec<TrackElement>,
    start_y: f32,
    checkpoints: Vec<Checkpoint>,
    /// Only elements with rafts or slopes need a per-tick visit
    special_elements: Vec<usize>,
    pub finish_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Track {
    /// Validate `templates` and lay the course down above `start_y`
    pub fn new(templates: &[TrackTemplate], start_y: f32) -> Result<Self, TrackError> {
        validate_templates(templates)?;

        let elements = create_track(templates, start_y);

        let special_elements = elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_special())
            .map(|(i, _)| i)
            .collect();

        let min_x = elements.iter().map(|e| e.min_x).fold(f32::MAX, f32::min);
        let max_x = elements.iter().map(|e| e.max_x).fold(f32::MIN, f32::max);

        // The start element always counts as a checkpoint
        let checkpoints = elements
            .iter()
            .enumerate()
            .filter(|(i, e)| {
                *i == 0 || e.element_type == ElementType::Checkpoint
            })
            .map(|(i, e)| Checkpoint {
                element: i,
                y: e.y + e.height,
            })
            .collect();

        Ok(Self {
            finish_y: start_y - (elements.len() - 1) as f32 * ELEMENT_HEIGHT,
            width: max_x - min_x,
            height: elements.len() as f32 * ELEMENT_HEIGHT,
            elements,
            start_y,
            checkpoints,
            special_elements,
        })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn start_y(&self) -> f32 {
        self.start_y
    }

    pub fn get(&self, i: usize) -> &TrackElement {
        &self.elements[i]
    }

    pub fn elements(&self) -> &[TrackElement] {
        &self.elements
    }

    /// Advance rafts and apply slope forces for one tick.
    ///
    /// `t` is the simulation time and `dt` the step, both in ms.
    pub fn update<B: Body>(&mut self, t: f32, dt: f32, bodies: &mut [B]) {
        for &ei in &self.special_elements {
            let element = &mut self.elements[ei];
            let home = element.y;
            let mut raft_moved = false;

            for surface in element.surfaces.iter_mut() {
                match surface.kind {
                    SurfaceKind::Solid => {}
                    SurfaceKind::Slope { force } => {
                        for body in bodies.iter_mut().filter(|b| b.is_grounded()) {
                            if includes(&surface.area, &body.area()) {
                                let v = body.velocity_mut();
                                v.y -= SLOPE_FORCE_FACTOR * force * dt;
                                *v = clamp_speed(*v, MAX_SPEED);
                            }
                        }
                    }
                    SurfaceKind::Raft(ref mut motion) => {
                        let dy = step_raft(motion, &mut surface.area.y, home, t, dt);
                        if dy != 0.0 {
                            raft_moved = true;
                            for body in bodies.iter_mut().filter(|b| b.is_grounded()) {
                                if overlap(&surface.area, &body.area()) {
                                    body.translate_y(dy);
                                }
                            }
                        }
                    }
                }
            }

            if raft_moved {
                element.calculate_blocks();
            }
        }
    }

    /// Row index containing `y`, unclamped (-1 at or behind the starting line)
    fn row_of(&self, y: f32) -> i64 {
        ((self.start_y - y).max(0.0) / ELEMENT_HEIGHT).ceil() as i64 - 1
    }

    pub fn block_type(&self, row: usize, col: i32) -> BlockType {
        match (self.elements.get(row), usize::try_from(col)) {
            (Some(element), Ok(col)) => element.block_type(col),
            _ => BlockType::Empty,
        }
    }

    /// Whether block (`row`, `col`) can be stood on right now
    pub fn is_free(&self, row: usize, col: i32) -> bool {
        let (Some(element), Ok(col)) = (self.elements.get(row), usize::try_from(col)) else {
            return false;
        };
        if col >= BLOCK_COUNT {
            return false;
        }

        // A chasm is only crossable while the raft behind it is parked over it
        if element.is_chasm() {
            let previous = &self.elements[row.saturating_sub(1)];
            return previous.is_vacant_at(element.y, col);
        }

        element.blocks[col]
    }

    pub fn block(&self, row: usize, col: i32) -> Block {
        let y = self.elements[row].y;
        let x = LEFTMOST_EDGE + col as f32 * BLOCK_WIDTH;
        Block {
            row,
            col,
            area: Area::new(x, y, BLOCK_WIDTH, ELEMENT_HEIGHT),
        }
    }

    pub fn block_at(&self, position: Vec2) -> Block {
        let last = self.elements.len() as i64 - 1;
        let row = self.row_of(position.y).clamp(0, last.max(0)) as usize;
        let col = ((position.x - LEFTMOST_EDGE) / BLOCK_WIDTH).floor() as i32;
        self.block(row, col)
    }

    /// Elements touching the Y span `top_y..=bottom_y`, plus one more behind it so a
    /// raft that has left its own slot is still found
    pub fn between(&self, top_y: f32, bottom_y: f32) -> IndexRange {
        let n = self.elements.len() as i64;
        let to_bottom = ((self.start_y - bottom_y).max(0.0) / ELEMENT_HEIGHT).floor() as i64;

        let start = (to_bottom - 1).max(0);
        let end = (self.row_of(top_y) + 1).clamp(0, n);

        IndexRange {
            start: start as usize,
            end: end.max(start) as usize,
        }
    }

    /// Elements to draw for the visible Y span
    pub fn visible(&self, top_y: f32, bottom_y: f32) -> &[TrackElement] {
        let range = self.between(top_y, bottom_y);
        &self.elements[range.start..range.end]
    }

    /// True if `area` touches any surface of the elements in `range`
    pub fn is_on_platform(&self, range: IndexRange, area: &Area) -> bool {
        range.iter().rev().any(|i| {
            self.elements[i]
                .surfaces
                .iter()
                .any(|s| overlap(area, &s.area))
        })
    }

    /// Area of the first raft `area` stands on, if any
    pub fn raft_under(&self, area: &Area) -> Option<Area> {
        self.between(area.top(), area.bottom())
            .iter()
            .flat_map(move |i| self.elements[i].surfaces.iter())
            .find(|s| s.is_raft() && overlap(area, &s.area))
            .map(|s| s.area)
    }

    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }

    /// Element of checkpoint `index` (0 is the start)
    pub fn checkpoint(&self, index: usize) -> &TrackElement {
        let index = index.min(self.checkpoints.len() - 1);
        &self.elements[self.checkpoints[index].element]
    }

    /// Index of the furthest checkpoint already passed at `y`
    pub fn find_latest_checkpoint(&self, y: f32) -> usize {
        self.checkpoints
            .iter()
            .rposition(|cp| y < cp.y - self.elements[cp.element].height * 0.15)
            .unwrap_or(0)
    }

}

/// Move one raft for this tick; returns how far it moved
fn step_raft(motion: &mut RaftMotion, y: &mut f32, home: f32, t: f32, dt: f32) -> f32 {
    let far_end = home - ELEMENT_HEIGHT;
    let docked_for = t - motion.dock_start_time;

    if motion.y_direction < 0.0 && *y <= far_end {
        motion.y_direction = 0.0;
        motion.dock_start_time = t;
    } else if motion.y_direction == 0.0 && *y <= far_end && docked_for > RAFT_DOCK_TIME {
        motion.y_direction = 1.0;
    } else if motion.y_direction > 0.0 && *y >= home {
        motion.y_direction = 0.0;
        motion.dock_start_time = t;
    } else if motion.y_direction == 0.0 && *y >= home && docked_for > RAFT_DOCK_TIME {
        motion.y_direction = -1.0;
    }

    let new_y = (*y + motion.y_direction * RAFT_SPEED * dt).clamp(far_end, home);
    let dy = new_y - *y;
    *y = new_y;
    dy
}
