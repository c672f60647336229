//! 2D geometry for bodies and hitboxes.
//!
//! World space is y-up: positive `y` points away from the ground.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Horizontal facing of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Facing negative x
    Left,
    /// Facing positive x (default)
    #[default]
    Right,
}

impl Facing {
    /// Sign of the facing along x (-1.0 or 1.0).
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// The opposite facing.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Facing that points from `from` toward `to`. Ties keep `self`.
    #[must_use]
    pub fn toward(self, from: Vec2, to: Vec2) -> Self {
        let dx = to.x - from.x;
        if dx > 0.0 {
            Self::Right
        } else if dx < 0.0 {
            Self::Left
        } else {
            self
        }
    }

    /// Unit vector along the facing.
    #[must_use]
    pub const fn to_vec2(self) -> Vec2 {
        Vec2::new(self.sign(), 0.0)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Aabb {
    /// Creates an AABB from its corners.
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Creates an AABB from center and half-extents.
    #[must_use]
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Half-extents along each axis.
    #[must_use]
    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Checks if this AABB overlaps another. Touching edges count.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Closest point inside the box to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }

    /// Returns the AABB translated by a vector.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::from_center(Vec2::ZERO, Vec2::splat(0.5))
    }
}

/// Hit geometry, positioned at a query origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HitShape {
    /// Axis-aligned box centered on the origin
    Box {
        /// Half-extents of the box
        half_extents: Vec2,
    },
    /// Circle centered on the origin
    Circle {
        /// Radius of the circle
        radius: f32,
    },
}

impl HitShape {
    /// Box shape from full width and height.
    #[must_use]
    pub fn rect(width: f32, height: f32) -> Self {
        Self::Box {
            half_extents: Vec2::new(width * 0.5, height * 0.5),
        }
    }

    /// Circle shape.
    #[must_use]
    pub const fn circle(radius: f32) -> Self {
        Self::Circle { radius }
    }

    /// Checks if this shape, placed at `origin`, overlaps `body`.
    #[must_use]
    pub fn overlaps(&self, origin: Vec2, body: &Aabb) -> bool {
        match *self {
            Self::Box { half_extents } => Aabb::from_center(origin, half_extents).overlaps(body),
            Self::Circle { radius } => {
                body.closest_point(origin).distance_squared(origin) <= radius * radius
            },
        }
    }

    /// Bounding box of the shape placed at `origin`.
    #[must_use]
    pub fn bounds(&self, origin: Vec2) -> Aabb {
        match *self {
            Self::Box { half_extents } => Aabb::from_center(origin, half_extents),
            Self::Circle { radius } => Aabb::from_center(origin, Vec2::splat(radius)),
        }
    }
}

impl Default for HitShape {
    fn default() -> Self {
        Self::rect(1.5, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_toward() {
        let f = Facing::Right;
        assert_eq!(f.toward(Vec2::ZERO, Vec2::new(-2.0, 0.0)), Facing::Left);
        assert_eq!(f.toward(Vec2::ZERO, Vec2::new(0.0, 5.0)), Facing::Right);
        assert_eq!(Facing::Left.flipped(), Facing::Right);
        assert_eq!(Facing::Left.sign(), -1.0);
    }

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb::from_center(Vec2::ZERO, Vec2::splat(1.0));
        let b = Aabb::from_center(Vec2::new(1.5, 0.0), Vec2::splat(1.0));
        let c = Aabb::from_center(Vec2::new(3.0, 0.0), Vec2::splat(0.5));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_circle_against_box_corner() {
        let body = Aabb::from_center(Vec2::new(2.0, 2.0), Vec2::splat(0.5));
        // Closest corner is (1.5, 1.5), distance ~2.12 from origin
        assert!(!HitShape::circle(2.0).overlaps(Vec2::ZERO, &body));
        assert!(HitShape::circle(2.2).overlaps(Vec2::ZERO, &body));
    }

    #[test]
    fn test_circle_inside_box() {
        let body = Aabb::from_center(Vec2::ZERO, Vec2::splat(5.0));
        assert!(HitShape::circle(0.1).overlaps(Vec2::new(1.0, 1.0), &body));
    }

    #[test]
    fn test_shape_bounds() {
        let bounds = HitShape::rect(2.0, 4.0).bounds(Vec2::new(1.0, 1.0));
        assert_eq!(bounds.min, Vec2::new(0.0, -1.0));
        assert_eq!(bounds.max, Vec2::new(2.0, 3.0));
        assert_eq!(bounds.center(), Vec2::new(1.0, 1.0));
    }

    proptest::proptest! {
        #[test]
        fn shape_overlap_implies_bounds_overlap(
            ox in -5.0f32..5.0, oy in -5.0f32..5.0,
            bx in -5.0f32..5.0, by in -5.0f32..5.0,
            radius in 0.1f32..3.0, half in 0.1f32..2.0,
        ) {
            let origin = Vec2::new(ox, oy);
            let body = Aabb::from_center(Vec2::new(bx, by), Vec2::splat(half));
            for shape in [HitShape::circle(radius), HitShape::rect(radius * 2.0, radius)] {
                if shape.overlaps(origin, &body) {
                    proptest::prop_assert!(shape.bounds(origin).overlaps(&body));
                }
            }
        }
    }
}
