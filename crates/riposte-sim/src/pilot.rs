//! Scripted player.
//!
//! Stands in for a human and a presentation layer: walks to the nearest
//! enemy, swings when in reach, reports the swing's hit frame and end, and
//! counters parryable telegraphs inside their parry window.

use glam::Vec2;
use riposte_common::ActorId;
use riposte_core::{CombatEvent, CombatWorld, Faction, PlayerInput, PlayerLock, Strike};

use crate::config::PilotConfig;

/// Scripted player driver.
#[derive(Debug)]
pub struct Pilot {
    player: ActorId,
    config: PilotConfig,
    /// Inputs waiting for their world time
    pending: Vec<(f64, PlayerInput)>,
}

impl Pilot {
    /// Pilot for the given player.
    #[must_use]
    pub fn new(player: ActorId, config: PilotConfig) -> Self {
        Self {
            player,
            config,
            pending: Vec::new(),
        }
    }

    /// Number of inputs waiting to be released.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Reacts to a combat event published at world time `now`.
    pub fn observe(&mut self, event: &CombatEvent, now: f64, parry_window: f32) {
        match event {
            CombatEvent::TelegraphStart {
                window_close,
                parryable: true,
                ..
            } if self.config.parry => {
                let at = window_close - f64::from(parry_window) * 0.5;
                self.pending.push((at.max(now), PlayerInput::Counter));
            },
            CombatEvent::AttackStarted {
                actor,
                strike: Strike::Nail(_),
            } if *actor == self.player => {
                let hit = now + f64::from(self.config.hit_frame_delay);
                let end = now + f64::from(self.config.swing_length);
                self.pending.push((hit, PlayerInput::AttackHitFrame));
                self.pending.push((end, PlayerInput::AttackEnd));
            },
            // A hurt player loses the swing; its presentation callbacks never come
            CombatEvent::Hurt { actor, .. } if *actor == self.player => {
                self.pending.retain(|(_, input)| {
                    !matches!(input, PlayerInput::AttackHitFrame | PlayerInput::AttackEnd)
                });
            },
            _ => {},
        }
    }

    /// Inputs for the next tick of `step` real seconds.
    pub fn drive(&mut self, world: &CombatWorld, step: f32) -> Vec<PlayerInput> {
        let horizon = world.now() + f64::from(step * world.time_scale());
        let mut inputs = Vec::new();

        self.pending.sort_by(|a, b| a.0.total_cmp(&b.0));
        let due = self.pending.partition_point(|(at, _)| *at <= horizon);
        inputs.extend(self.pending.drain(..due).map(|(_, input)| input));

        let Some(player) = world.actor(self.player).filter(|actor| actor.is_alive()) else {
            return inputs;
        };
        let Some(target) = world
            .actors()
            .filter(|actor| actor.faction() == Faction::Enemy && actor.is_alive())
            .min_by(|a, b| {
                let da = a.position.distance_squared(player.position);
                let db = b.position.distance_squared(player.position);
                da.total_cmp(&db)
            })
        else {
            inputs.push(PlayerInput::Move(Vec2::ZERO));
            return inputs;
        };

        let dx = target.position.x - player.position.x;
        if dx.abs() > self.config.reach {
            inputs.push(PlayerInput::Move(Vec2::new(dx.signum(), 0.0)));
        } else {
            // Face the target without stepping into it
            inputs.push(PlayerInput::Move(Vec2::new(dx.signum() * 0.01, 0.0)));
            let free = player.as_player().is_some_and(|p| p.lock() == PlayerLock::Free);
            if free && !self.swinging() {
                inputs.push(PlayerInput::Attack);
            }
        }
        inputs
    }

    fn swinging(&self) -> bool {
        self.pending
            .iter()
            .any(|(_, input)| matches!(input, PlayerInput::AttackEnd))
    }
}
