//! Deterministic race simulation
//!
//! All race logic lives here. This module must stay pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (roster order)
//! - No rendering, audio or input dependencies

pub mod ai;
pub mod character;
pub mod element;
pub mod geom;
pub mod level;
pub mod physics;
pub mod rounds;
pub mod template;
pub mod tick;
pub mod track;

pub use ai::Ai;
pub use character::{AnimationState, Character, Controller, Facing, HUMAN_ID};
pub use element::{BlockType, ElementType, Obstacle, Surface, SurfaceKind, TrackElement};
pub use geom::{Area, Dimensions, includes, overlap};
pub use level::{CharacterSnapshot, Contestant, Level, LevelSnapshot, RaceState, SimEvent};
pub use physics::{Collision, MAX_SPEED, collide_characters, collide_with_obstacle, movement_velocity};
pub use rounds::{Championship, RoundOutcome, roster};
pub use template::TrackTemplate;
pub use tick::{TickInput, tick};
pub use track::{Block, Body, IndexRange, Track};
