//! Racing characters

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ai::Ai;
use super::geom::{Area, Dimensions};
use super::track::Body;
use crate::consts::CHARACTER_SIZE;

/// Id of the character steered by the player
pub const HUMAN_ID: u32 = 0;

/// Where a character's movement intent comes from
#[derive(Debug, Clone, PartialEq)]
pub enum Controller {
    /// Intent arrives from outside each tick
    Human,
    Autonomous(Ai),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationState {
    Still,
    Walk,
    Fall,
}

/// Sprite orientation derived from the latest non-zero direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Forward,
    Backward,
    ForwardRight,
    BackwardRight,
    Right,
}

#[derive(Debug, Clone)]
pub struct Character {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub velocity: Vec2,
    direction: Vec2,
    latest_direction: Vec2,
    /// 1-based; frozen once finished or eliminated
    pub rank: usize,
    pub finished: bool,
    pub eliminated: bool,
    /// Arrival order among finishers (0 = first)
    pub finish_order: Option<usize>,
    pub latest_checkpoint_index: usize,
    /// Simulation time when the ground disappeared
    pub fall_start_time: Option<f32>,
    pub controller: Controller,
}

impl Character {
    pub fn new(id: u32, position: Vec2, scale: f32) -> Self {
        let controller = if id == HUMAN_ID {
            Controller::Human
        } else {
            Controller::Autonomous(Ai::new())
        };

        Self {
            id,
            x: position.x,
            y: position.y,
            width: CHARACTER_SIZE * scale,
            height: CHARACTER_SIZE * scale,
            velocity: Vec2::ZERO,
            direction: Vec2::ZERO,
            latest_direction: Vec2::ZERO,
            rank: 0,
            finished: false,
            eliminated: false,
            finish_order: None,
            latest_checkpoint_index: 0,
            fall_start_time: None,
            controller,
        }
    }

    #[inline]
    pub fn is_human(&self) -> bool {
        matches!(self.controller, Controller::Human)
    }

    #[inline]
    pub fn area(&self) -> Area {
        Area::new(self.x, self.y, self.width, self.height)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.area().center()
    }

    /// Still racing: neither finished nor eliminated
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.finished && !self.eliminated
    }

    #[inline]
    pub fn is_falling(&self) -> bool {
        self.fall_start_time.is_some()
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn latest_direction(&self) -> Vec2 {
        self.latest_direction
    }

    pub fn set_direction(&mut self, direction: Vec2) {
        self.direction = direction;
        if direction != Vec2::ZERO {
            self.latest_direction = direction;
        }
    }

    /// Stop dead
    pub fn freeze(&mut self) {
        self.velocity = Vec2::ZERO;
        self.direction = Vec2::ZERO;
    }

    /// Put back on solid ground at `position` (top-left)
    pub fn drop_to(&mut self, position: Vec2) {
        self.x = position.x;
        self.y = position.y;
        self.fall_start_time = None;
        self.freeze();
        if let Controller::Autonomous(ai) = &mut self.controller {
            ai.reset();
        }
    }

    pub fn animation(&self) -> AnimationState {
        if self.is_falling() {
            AnimationState::Fall
        } else if self.direction == Vec2::ZERO {
            AnimationState::Still
        } else {
            AnimationState::Walk
        }
    }

    pub fn facing(&self) -> Facing {
        let d = self.latest_direction;
        if d.y == 0.0 {
            Facing::Right
        } else if d.x == 0.0 {
            if d.y < 0.0 {
                Facing::Forward
            } else {
                Facing::Backward
            }
        } else if d.y > 0.0 {
            Facing::BackwardRight
        } else {
            Facing::ForwardRight
        }
    }

    /// Right-facing sprites are flipped when heading left
    pub fn mirrored(&self) -> bool {
        self.latest_direction.x < 0.0
    }
}

impl Body for Character {
    fn is_grounded(&self) -> bool {
        self.is_active() && !self.is_falling()
    }

    fn area(&self) -> Area {
        Character::area(self)
    }

    fn velocity_mut(&mut self) -> &mut Vec2 {
        &mut self.velocity
    }

    fn translate_y(&mut self, dy: f32) {
        self.y += dy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_and_ai_controllers() {
        let human = Character::new(HUMAN_ID, Vec2::ZERO, 1.0);
        assert!(human.is_human());
        let ai = Character::new(3, Vec2::ZERO, 1.1);
        assert!(matches!(ai.controller, Controller::Autonomous(_)));
        assert!((ai.width - CHARACTER_SIZE * 1.1).abs() < 1e-6);
        assert_eq!(ai.width, ai.height);
    }

    #[test]
    fn test_facing_and_mirroring() {
        let mut c = Character::new(1, Vec2::ZERO, 1.0);
        assert_eq!(c.facing(), Facing::Right);
        assert_eq!(c.animation(), AnimationState::Still);

        c.set_direction(Vec2::NEG_Y);
        assert_eq!(c.facing(), Facing::Forward);
        assert_eq!(c.animation(), AnimationState::Walk);

        c.set_direction(Vec2::new(-1.0, 1.0).normalize());
        assert_eq!(c.facing(), Facing::BackwardRight);
        assert!(c.mirrored());

        c.set_direction(Vec2::new(1.0, -1.0).normalize());
        assert_eq!(c.facing(), Facing::ForwardRight);
        assert!(!c.mirrored());

        // Stopping keeps the last facing
        c.set_direction(Vec2::ZERO);
        assert_eq!(c.facing(), Facing::ForwardRight);
        assert_eq!(c.animation(), AnimationState::Still);
    }

    #[test]
    fn test_drop_to_clears_fall() {
        let mut c = Character::new(2, Vec2::ZERO, 1.0);
        c.velocity = Vec2::new(0.01, 0.02);
        c.fall_start_time = Some(100.0);
        assert_eq!(c.animation(), AnimationState::Fall);

        c.drop_to(Vec2::new(5.0, 6.0));
        assert!(!c.is_falling());
        assert_eq!(c.velocity, Vec2::ZERO);
        assert_eq!((c.x, c.y), (5.0, 6.0));
        if let Controller::Autonomous(ai) = &c.controller {
            assert!(ai.target().is_none());
        }
    }
}
