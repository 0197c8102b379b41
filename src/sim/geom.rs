//! Axis-aligned rectangles
//!
//! `x, y` is the corner with the smallest coordinates. Y decreases toward the
//! finish, so `top()` is the edge nearest the finish.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Width and height of something that has no position yet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Area {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Area {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// Shrink by `margin` on every side
    pub fn inset(&self, margin: f32) -> Self {
        Self {
            x: self.x + margin,
            y: self.y + margin,
            width: self.width - 2.0 * margin,
            height: self.height - 2.0 * margin,
        }
    }

    /// True if the X spans of the two areas overlap
    #[inline]
    pub fn overlaps_x(&self, other: &Area) -> bool {
        self.x < other.right() && other.x < self.right()
    }
}

/// True if the two areas share some interior
#[inline]
pub fn overlap(a: &Area, b: &Area) -> bool {
    a.x < b.right() && b.x < a.right() && a.y < b.bottom() && b.y < a.bottom()
}

/// True if `inner` lies entirely inside `outer` (edges may touch)
#[inline]
pub fn includes(outer: &Area, inner: &Area) -> bool {
    outer.x <= inner.x
        && inner.right() <= outer.right()
        && outer.y <= inner.y
        && inner.bottom() <= outer.bottom()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap() {
        let a = Area::new(0.0, 0.0, 10.0, 10.0);
        assert!(overlap(&a, &Area::new(5.0, 5.0, 10.0, 10.0)));
        // Touching edges don't overlap
        assert!(!overlap(&a, &Area::new(10.0, 0.0, 5.0, 5.0)));
        assert!(!overlap(&a, &Area::new(0.0, -5.0, 5.0, 5.0)));
        assert!(!overlap(&a, &Area::new(20.0, 20.0, 1.0, 1.0)));
    }

    #[test]
    fn test_includes() {
        let outer = Area::new(-45.0, 0.0, 90.0, 16.0);
        assert!(includes(&outer, &Area::new(-44.0, 1.0, 8.0, 14.0)));
        assert!(includes(&outer, &outer));
        assert!(!includes(&outer, &Area::new(40.0, 1.0, 8.0, 14.0)));
        assert!(!includes(&outer, &Area::new(0.0, -1.0, 1.0, 1.0)));
    }

    #[test]
    fn test_inset_and_center() {
        let a = Area::new(0.0, 0.0, 10.0, 16.0).inset(1.0);
        assert_eq!(a, Area::new(1.0, 1.0, 8.0, 14.0));
        assert_eq!(a.center(), Vec2::new(5.0, 8.0));
        assert_eq!(a.bottom(), 15.0);
    }
}
