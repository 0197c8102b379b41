//! Track elements: one horizontal slice of the track
//!
//! A track is composed by laying down elements one after the other. Each element
//! carries its walkable surfaces, the obstacles standing on them and a coarse grid
//! of block vacancy that the AI reasons about.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geom::{Area, Dimensions, includes, overlap};
use crate::consts::*;
use crate::random_min_max;

/// Movement state of a raft surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaftMotion {
    /// -1 toward the finish, 1 back home, 0 docked
    pub y_direction: f32,
    /// Simulation time (ms) when the raft last docked
    pub dock_start_time: f32,
}

/// What a surface does to whoever stands on it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SurfaceKind {
    Solid,
    /// Pushes occupants toward the finish; force is in [0, 1)
    Slope { force: f32 },
    /// Oscillates between its home slot and the slot ahead of it
    Raft(RaftMotion),
}

/// A walkable region of an element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub area: Area,
    pub kind: SurfaceKind,
}

impl Surface {
    pub fn solid(area: Area) -> Self {
        Self {
            area,
            kind: SurfaceKind::Solid,
        }
    }

    pub fn slope(area: Area, force: f32) -> Self {
        Self {
            area,
            kind: SurfaceKind::Slope { force },
        }
    }

    pub fn raft(area: Area, y_direction: f32) -> Self {
        Self {
            area,
            kind: SurfaceKind::Raft(RaftMotion {
                y_direction,
                dock_start_time: 0.0,
            }),
        }
    }

    #[inline]
    pub fn is_raft(&self) -> bool {
        matches!(self.kind, SurfaceKind::Raft(_))
    }

    #[inline]
    pub fn slope_force(&self) -> Option<f32> {
        match self.kind {
            SurfaceKind::Slope { force } => Some(force),
            _ => None,
        }
    }
}

/// A stationary obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub area: Area,
}

impl Obstacle {
    /// An obstacle of the default footprint with its top-left at `position`
    pub fn new(id: u32, position: Vec2) -> Self {
        Self {
            id,
            area: Area::new(position.x, position.y, OBSTACLE_WIDTH, OBSTACLE_HEIGHT),
        }
    }
}

/// Element classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    Normal,
    Checkpoint,
    Finish,
    Raft,
}

/// Coarse classification of one block column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockType {
    /// Walkable and unobstructed
    Free,
    /// An obstacle stands in the column
    Obstacle,
    /// A raft travels through the column (may or may not be here right now)
    Raft,
    /// Nothing to stand on
    Empty,
}

impl BlockType {
    /// Worth targeting: solid ground or a raft to wait for
    #[inline]
    pub fn is_target(self) -> bool {
        matches!(self, BlockType::Free | BlockType::Raft)
    }

    /// Can be walked across sideways, perhaps with a bump
    #[inline]
    pub fn is_crossable(self) -> bool {
        !matches!(self, BlockType::Empty)
    }
}

/// World-space area of block column `col` in a slice starting at `y`
#[inline]
pub fn column_area(y: f32, col: usize) -> Area {
    Area::new(
        LEFTMOST_EDGE + col as f32 * BLOCK_WIDTH,
        y,
        BLOCK_WIDTH,
        ELEMENT_HEIGHT,
    )
}

/// One horizontal slice of the track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackElement {
    pub y: f32,
    pub element_type: ElementType,
    pub surfaces: Vec<Surface>,
    pub obstacles: Vec<Obstacle>,
    /// Vacancy per block column; refreshed by `calculate_blocks`
    pub blocks: [bool; BLOCK_COUNT],
    pub min_x: f32,
    pub max_x: f32,
    pub width: f32,
    pub height: f32,
}

impl TrackElement {
    pub fn new(
        y: f32,
        element_type: ElementType,
        surfaces: Vec<Surface>,
        obstacles: Vec<Obstacle>,
    ) -> Self {
        let (min_x, max_x) = if surfaces.is_empty() {
            // Chasm: keep bounds sane so spot searches and culling stay finite
            (LEFTMOST_EDGE, RIGHTMOST_EDGE)
        } else {
            surfaces.iter().fold((f32::MAX, f32::MIN), |(lo, hi), s| {
                (lo.min(s.area.left()), hi.max(s.area.right()))
            })
        };

        let mut element = Self {
            y,
            element_type,
            surfaces,
            obstacles,
            blocks: [false; BLOCK_COUNT],
            min_x,
            max_x,
            width: max_x - min_x,
            height: ELEMENT_HEIGHT,
        };
        element.calculate_blocks();
        element
    }

    /// Presentation colour hint
    pub fn color(&self) -> &'static str {
        match self.element_type {
            ElementType::Checkpoint => "rgb(20, 50, 20)",
            ElementType::Finish => "rgb(0, 255, 0)",
            _ => "rgb(40, 10, 40)",
        }
    }

    pub fn has_raft(&self) -> bool {
        self.surfaces.iter().any(Surface::is_raft)
    }

    pub fn is_chasm(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Strongest slope force on this element (0 = flat)
    pub fn slope(&self) -> f32 {
        self.surfaces
            .iter()
            .filter_map(Surface::slope_force)
            .fold(0.0, f32::max)
    }

    /// Has moving or pushing surfaces that `Track::update` must visit
    pub fn is_special(&self) -> bool {
        self.surfaces
            .iter()
            .any(|s| !matches!(s.kind, SurfaceKind::Solid))
    }

    /// Recompute the vacancy grid from the current surface positions
    pub fn calculate_blocks(&mut self) {
        for col in 0..BLOCK_COUNT {
            self.blocks[col] = self.is_vacant_at(self.y, col);
        }
    }

    /// Vacancy of column `col` for a slice starting at `y`, using this element's
    /// surfaces wherever they are right now
    pub fn is_vacant_at(&self, y: f32, col: usize) -> bool {
        if col >= BLOCK_COUNT {
            return false;
        }
        let block = column_area(y, col).inset(BLOCK_MARGIN);

        self.surfaces.iter().any(|s| includes(&s.area, &block))
            && !self.obstacles.iter().any(|o| overlap(&o.area, &block))
    }

    pub fn block_type(&self, col: usize) -> BlockType {
        if col >= BLOCK_COUNT {
            return BlockType::Empty;
        }
        let block = column_area(self.y, col).inset(BLOCK_MARGIN);

        if self
            .surfaces
            .iter()
            .any(|s| s.is_raft() && s.area.overlaps_x(&block))
        {
            BlockType::Raft
        } else if self.obstacles.iter().any(|o| o.area.overlaps_x(&block)) {
            BlockType::Obstacle
        } else if self.blocks[col] {
            BlockType::Free
        } else {
            BlockType::Empty
        }
    }

    /// Random free spot for something of `dims`, clear of obstacles and `occupants`.
    ///
    /// Returns the top-left position, or `None` after `EMPTY_SPOT_ATTEMPTS` misses.
    /// Callers retry on a later tick.
    pub fn find_empty_spot<R: Rng + ?Sized>(
        &self,
        dims: Dimensions,
        occupants: &[Area],
        rng: &mut R,
    ) -> Option<Vec2> {
        let margin = dims.width * 0.5;
        let with_margin = Dimensions {
            width: dims.width + 2.0 * margin,
            height: dims.height + 2.0 * margin,
        };

        for _ in 0..EMPTY_SPOT_ATTEMPTS {
            let x = random_min_max(rng, self.min_x, self.max_x - with_margin.width);
            let y = self.y + random_min_max(rng, 0.0, self.height - with_margin.height);
            let spot = Area::new(x, y, with_margin.width, with_margin.height);

            if !self.surfaces.iter().any(|s| includes(&s.area, &spot)) {
                continue;
            }
            if self.obstacles.iter().any(|o| overlap(&o.area, &spot)) {
                continue;
            }
            if occupants.iter().any(|o| overlap(o, &spot)) {
                continue;
            }

            return Some(Vec2::new(x + margin, y + margin));
        }

        None
    }
}
