//! Thirteenth Guy - an obstacle race where you don't want to be the 13th guy
//!
//! Core modules:
//! - `sim`: Deterministic simulation (track, physics, AI, race state)
//! - `tracks`: Course data built from track templates
//! - `settings`: Race configuration
//! - `platform`: Browser bindings for the presentation layer
//! - `error`: Error types for course and race construction

pub mod error;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tracks;

pub use error::{LevelError, SettingsError, TrackError};
pub use settings::{EliminationPolicy, RaceSettings};

use glam::Vec2;
use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Nominal frame interval (ms) the simulation is tuned for
    pub const FRAME_DT: f32 = 1000.0 / 60.0;
    /// Largest step a single tick may take, so a backgrounded tab can't teleport anyone
    pub const MAX_FRAME_DT: f32 = 5.0 * FRAME_DT;

    /// Track grid
    pub const BLOCK_WIDTH: f32 = 10.0;
    pub const BLOCK_COUNT: usize = 9;
    pub const ELEMENT_HEIGHT: f32 = 16.0;
    pub const FULL_WIDTH: f32 = BLOCK_WIDTH * BLOCK_COUNT as f32;
    pub const LEFTMOST_EDGE: f32 = -FULL_WIDTH / 2.0;
    pub const RIGHTMOST_EDGE: f32 = FULL_WIDTH / 2.0;
    /// Inset applied to a block before vacancy tests
    pub const BLOCK_MARGIN: f32 = BLOCK_WIDTH * 0.1;

    /// Obstacle footprint
    pub const OBSTACLE_WIDTH: f32 = 10.0;
    pub const OBSTACLE_HEIGHT: f32 = 10.0;

    /// Rafts travel one element length, then dock
    pub const RAFT_SPEED: f32 = 0.005;
    pub const RAFT_DOCK_TIME: f32 = 2000.0;
    /// Slope push per ms per unit of slope force
    pub const SLOPE_FORCE_FACTOR: f32 = 0.0001;

    /// Rejection-sampling budget for a free spot
    pub const EMPTY_SPOT_ATTEMPTS: usize = 50;

    /// Character defaults (world units, before per-character scale)
    pub const CHARACTER_SIZE: f32 = 3.0;
    pub const CHARACTER_MIN_SCALE: f32 = 0.9;
    pub const CHARACTER_MAX_SCALE: f32 = 1.15;

    /// Y of the starting line
    pub const TRACK_START_Y: f32 = 400.0;
}

/// Horizontal distance between two points
#[inline]
pub fn distance_x(a: Vec2, b: Vec2) -> f32 {
    (a.x - b.x).abs()
}

/// Vertical distance between two points
#[inline]
pub fn distance_y(a: Vec2, b: Vec2) -> f32 {
    (a.y - b.y).abs()
}

/// Scale `v` down to `max` length if it is longer (zero stays zero)
#[inline]
pub fn clamp_speed(v: Vec2, max: f32) -> Vec2 {
    if v.length() > max {
        v.normalize_or_zero() * max
    } else {
        v
    }
}

/// Uniform float in `[min, max)`, or `min` when the range is empty
#[inline]
pub fn random_min_max<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    min + rng.random::<f32>() * (max - min)
}
