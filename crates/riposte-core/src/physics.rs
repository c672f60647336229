//! Physics collaborator interface.
//!
//! Collision resolution lives outside the combat core. The core only asks
//! whether a shape touches terrain, whether a point is on the ground and
//! whether a body is blocked, and it lets the collaborator move bodies.

use glam::Vec2;
use riposte_common::{Aabb, HitShape};

/// Body state handed to [`PhysicsQuery::integrate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    /// Body center
    pub position: Vec2,
    /// Body velocity
    pub velocity: Vec2,
}

/// Trait for querying level geometry.
pub trait PhysicsQuery {
    /// Checks if `shape` placed at `origin` overlaps solid terrain.
    fn overlaps_terrain(&self, shape: &HitShape, origin: Vec2) -> bool;

    /// Checks if a body whose feet are at `feet` stands on the ground.
    fn is_grounded(&self, feet: Vec2) -> bool;

    /// Checks if a body at `position` is pressed against a wall.
    fn is_blocked(&self, position: Vec2, half_extents: Vec2) -> bool;

    /// Moves a body by one step. The default is plain Euler integration.
    fn integrate(&self, motion: Motion, _half_extents: Vec2, dt: f32) -> Motion {
        Motion {
            position: motion.position + motion.velocity * dt,
            velocity: motion.velocity,
        }
    }
}

/// Flat floor between two walls, with gravity.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatArena {
    /// Floor height
    pub ground_y: f32,
    /// Inner face of the left wall
    pub left_wall: f32,
    /// Inner face of the right wall
    pub right_wall: f32,
    /// Downward acceleration
    pub gravity: f32,
}

impl Default for FlatArena {
    fn default() -> Self {
        Self {
            ground_y: 0.0,
            left_wall: -20.0,
            right_wall: 20.0,
            gravity: 30.0,
        }
    }
}

impl FlatArena {
    /// Arena between two walls with the floor at zero.
    #[must_use]
    pub fn new(left_wall: f32, right_wall: f32) -> Self {
        Self {
            left_wall,
            right_wall,
            ..Self::default()
        }
    }

    /// Sets the gravity.
    #[must_use]
    pub const fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    fn terrain(&self) -> [Aabb; 3] {
        const DEPTH: f32 = 1000.0;
        [
            Aabb::new(
                Vec2::new(self.left_wall - DEPTH, self.ground_y - DEPTH),
                Vec2::new(self.right_wall + DEPTH, self.ground_y),
            ),
            Aabb::new(
                Vec2::new(self.left_wall - DEPTH, self.ground_y - DEPTH),
                Vec2::new(self.left_wall, self.ground_y + DEPTH),
            ),
            Aabb::new(
                Vec2::new(self.right_wall, self.ground_y - DEPTH),
                Vec2::new(self.right_wall + DEPTH, self.ground_y + DEPTH),
            ),
        ]
    }
}

impl PhysicsQuery for FlatArena {
    fn overlaps_terrain(&self, shape: &HitShape, origin: Vec2) -> bool {
        self.terrain()
            .iter()
            .any(|solid| shape.overlaps(origin, solid))
    }

    fn is_grounded(&self, feet: Vec2) -> bool {
        feet.y <= self.ground_y + 1e-3
    }

    fn is_blocked(&self, position: Vec2, half_extents: Vec2) -> bool {
        position.x - half_extents.x <= self.left_wall
            || position.x + half_extents.x >= self.right_wall
    }

    fn integrate(&self, motion: Motion, half_extents: Vec2, dt: f32) -> Motion {
        let mut velocity = motion.velocity;
        velocity.y -= self.gravity * dt;
        let mut position = motion.position + velocity * dt;

        let floor = self.ground_y + half_extents.y;
        if position.y <= floor {
            position.y = floor;
            velocity.y = velocity.y.max(0.0);
        }

        let min_x = self.left_wall + half_extents.x;
        let max_x = self.right_wall - half_extents.x;
        if position.x <= min_x {
            position.x = min_x;
            velocity.x = velocity.x.max(0.0);
        } else if position.x >= max_x {
            position.x = max_x;
            velocity.x = velocity.x.min(0.0);
        }

        Motion { position, velocity }
    }
}
