//! # Riposte Core
//!
//! Real-time combat core for a 2D action game.
//!
//! This crate provides the simulation side of combat:
//! - Timed task scheduler for attack windups, hit phases and recoveries
//! - Generic enemy state machine and a distance-bucketed boss selector
//! - Player action locks, hit-frame driven swings, casts and dashes
//! - Hit queries, damage, knockback and death
//! - Telegraphs, counters and parries with slow motion
//! - Status effects (confused, frozen, invincible)
//! - Event bus for presentation, audio and rewards
//!
//! Rendering, animation, audio and collision resolution stay outside; the
//! core reaches level geometry through [`physics::PhysicsQuery`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod actor;
pub mod boss;
pub mod clock;
pub mod config;
pub mod enemy;
pub mod events;
pub mod hit;
pub mod parry;
pub mod physics;
pub mod player;
pub mod scheduler;
pub mod status;
pub mod timeline;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::actor::*;
    pub use crate::boss::*;
    pub use crate::clock::*;
    pub use crate::config::*;
    pub use crate::enemy::*;
    pub use crate::events::*;
    pub use crate::hit::*;
    pub use crate::parry::*;
    pub use crate::physics::*;
    pub use crate::player::*;
    pub use crate::scheduler::*;
    pub use crate::status::*;
    pub use crate::timeline::{CombatAction, Strike};
    pub use crate::world::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_default_config_builds_a_world() {
        let world = CombatWorld::new(CombatConfig::default());
        assert!(world.is_ok());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = CombatConfig::default();
        config.parry.parry_window = -1.0;
        assert!(CombatWorld::new(config).is_err());
    }

    #[test]
    fn test_arena_round_settles_on_the_floor() {
        let mut world = CombatWorld::new(CombatConfig::default()).unwrap();
        let player = world.spawn_player(Vec2::new(-3.0, 2.0));
        let enemy = world.spawn_enemy(Vec2::new(15.0, 0.75), EnemyConfig::default()).unwrap();

        let arena = FlatArena::default();
        let ctx = TickContext::new(&arena);
        for _ in 0..120 {
            world.tick(1.0 / 60.0, &ctx);
        }

        let body = world.actor(player).unwrap();
        assert!(body.grounded);
        assert_eq!(body.position.y, body.half_extents().y);
        assert_eq!(world.enemy_state(enemy), Some(EnemyState::Patrol));
    }
}
