//! Movement integration and collision response
//!
//! Stateless functions over areas and velocities. Velocities are in world units
//! per ms. Collisions look one step ahead (`center + velocity`) and answer by
//! bouncing velocities; positions are only ever changed by the level's move step.

use glam::Vec2;

use super::geom::Area;
use crate::{clamp_speed, distance_x, distance_y};

/// The maximum speed that anything can reach. The limit keeps inaccuracies in
/// collision detection from making things go too fast.
pub const MAX_SPEED: f32 = 0.08;

pub const CHARACTER_MAX_RUN_SPEED: f32 = 0.025;
pub const CHARACTER_RUN_ACCELERATION: f32 = 0.0002;
pub const CHARACTER_STOP_ACCELERATION: f32 = 0.0002;

pub const OBSTACLE_BOUNCE_FACTOR: f32 = 2.0;
/// Both bodies leave with `(|va·d| + |vb·d|) * CHARACTER_BOUNCE_FACTOR` along the contact
/// normal. Absorbing each body's own approach speed instead stops a head-on pair dead.
pub const CHARACTER_BOUNCE_FACTOR: f32 = 0.9;

/// Collisions further than this from the listener are silent
pub const HEARING_DISTANCE: f32 = 60.0;

/// Where a collision happened, for sound cues
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    pub point: Vec2,
}

impl Collision {
    /// Loudness in [0, 1] for someone listening at `listener`
    pub fn volume(&self, listener: Vec2) -> f32 {
        (1.0 - self.point.distance(listener) / HEARING_DISTANCE).clamp(0.0, 1.0)
    }
}

/// New velocity after steering toward `direction` (unit length or zero) for `dt` ms.
///
/// Zero intent brakes toward a standstill without reversing.
pub fn movement_velocity(velocity: Vec2, direction: Vec2, dt: f32) -> Vec2 {
    if direction == Vec2::ZERO {
        let speed = velocity.length();
        let braking = CHARACTER_STOP_ACCELERATION * dt;
        if speed <= braking {
            return Vec2::ZERO;
        }
        return clamp_speed(velocity.normalize_or_zero() * (speed - braking), MAX_SPEED);
    }

    let change_of_speed = (CHARACTER_RUN_ACCELERATION * dt).min(CHARACTER_MAX_RUN_SPEED);
    clamp_speed(velocity + direction * change_of_speed, CHARACTER_MAX_RUN_SPEED)
}

/// Per-axis centre distance below which a body at `area` touches `obstacle`
pub fn obstacle_reach(area: &Area, obstacle: &Area) -> Vec2 {
    // Obstacles look round from above; their footprint is flatter than their box
    Vec2::new(
        area.width / 2.0 + obstacle.width / 2.0,
        area.height / 2.0 + obstacle.height / 3.5,
    )
}

/// Bounce `velocity` of a body at `area` off `obstacle` if they are about to touch
pub fn collide_with_obstacle(area: &Area, velocity: &mut Vec2, obstacle: &Area) -> Option<Collision> {
    let reach = obstacle_reach(area, obstacle);

    let center = area.center();
    let center_next = center + *velocity;
    let obstacle_center = obstacle.center();

    if distance_x(center_next, obstacle_center) >= reach.x
        || distance_y(center_next, obstacle_center) >= reach.y
    {
        return None;
    }

    let mut to_obstacle = (obstacle_center - center).normalize_or_zero();
    if to_obstacle == Vec2::ZERO {
        to_obstacle = Vec2::NEG_Y;
    }
    let speed_to_obstacle = velocity.dot(to_obstacle);
    let bounce = to_obstacle * (-speed_to_obstacle.abs() * OBSTACLE_BOUNCE_FACTOR);

    *velocity = clamp_speed(*velocity + bounce, MAX_SPEED);

    Some(Collision {
        point: (center + obstacle_center) / 2.0,
    })
}

/// Exchange momentum between two characters that are about to overlap
pub fn collide_characters(
    a: &Area,
    va: &mut Vec2,
    b: &Area,
    vb: &mut Vec2,
) -> Option<Collision> {
    let radius_a = a.width * 0.4;
    let radius_b = b.width * 0.4;

    let center_a = a.center();
    let center_b = b.center();

    if (center_a + *va).distance(center_b + *vb) >= radius_a + radius_b {
        return None;
    }

    let mut a_to_b = (center_b - center_a).normalize_or_zero();
    if a_to_b == Vec2::ZERO {
        a_to_b = Vec2::X;
    }

    // Absolute values so bodies already separating still get pushed apart
    let speed_a_to_b = va.dot(a_to_b).abs();
    let speed_b_to_a = vb.dot(-a_to_b).abs();
    let push = (speed_a_to_b + speed_b_to_a) * CHARACTER_BOUNCE_FACTOR;

    *va = clamp_speed(*va - a_to_b * push, MAX_SPEED);
    *vb = clamp_speed(*vb + a_to_b * push, MAX_SPEED);

    Some(Collision {
        point: (center_a + center_b) / 2.0,
    })
}
