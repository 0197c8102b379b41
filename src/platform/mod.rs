//! Platform boundary
//!
//! The race runs headless; whatever draws it hands in key state and reads back
//! snapshots and events. The browser bindings live in `web`.

#[cfg(target_arch = "wasm32")]
pub mod web;

use glam::Vec2;

use crate::sim::TickInput;

/// Direction keys held this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputIntent {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl InputIntent {
    pub fn from_keys(left: bool, right: bool, up: bool, down: bool) -> Self {
        Self {
            left,
            right,
            up,
            down,
        }
    }

    /// Unit movement vector; left wins over right and up over down
    pub fn movement(&self) -> Vec2 {
        let dx = if self.left {
            -1.0
        } else if self.right {
            1.0
        } else {
            0.0
        };
        let dy = if self.up {
            -1.0
        } else if self.down {
            1.0
        } else {
            0.0
        };
        Vec2::new(dx, dy).normalize_or_zero()
    }

    pub fn tick_input(&self) -> TickInput {
        TickInput::new(self.movement())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_to_movement() {
        assert_eq!(InputIntent::default().movement(), Vec2::ZERO);
        assert_eq!(InputIntent::from_keys(false, false, true, false).movement(), Vec2::NEG_Y);
        assert_eq!(InputIntent::from_keys(true, true, false, false).movement(), Vec2::NEG_X);

        let diagonal = InputIntent::from_keys(false, true, true, false).movement();
        assert!((diagonal.length() - 1.0).abs() < 1e-6);
        assert!(diagonal.x > 0.0 && diagonal.y < 0.0);
    }
}
