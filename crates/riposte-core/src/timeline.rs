//! Step sequences for attacks, casts and dashes.
//!
//! Every timed combat sequence is a list of [`Step`]s carrying a
//! [`CombatAction`]. The world interprets the actions when the scheduler
//! hands them back.

use serde::{Deserialize, Serialize};

use crate::boss::BossAttack;
use crate::config::{AttackProfile, PlayerConfig};
use crate::player::AttackKind;
use crate::scheduler::Step;

/// Hit phase identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strike {
    /// Generic enemy melee
    Melee,
    /// Generic enemy spell, landing on the target
    Spell,
    /// Boss attack
    Boss(BossAttack),
    /// Player nail swing
    Nail(AttackKind),
    /// Player spell
    PlayerSpell,
}

/// Action carried by a timed step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CombatAction {
    /// Scale horizontal velocity (0 locks it).
    Brace {
        /// Velocity multiplier
        factor: f32,
    },
    /// Open a telegraph closing after `duration`.
    Telegraph {
        /// Warning length
        duration: f32,
        /// Whether a counter can parry it
        parryable: bool,
    },
    /// Pin the owner in place for the windup. Knockback keeps its angle.
    Hold,
    /// Windup is over; close the owner's telegraphs and release a hold.
    EndWindup,
    /// Resolve a hit phase.
    Strike(Strike),
    /// Move along facing at `speed`.
    Surge {
        /// Horizontal speed
        speed: f32,
    },
    /// Start a charge along facing; the world watches for walls and contact.
    Charge {
        /// Horizontal speed
        speed: f32,
    },
    /// Stop horizontal movement.
    Halt,
    /// Sequence complete; release the owner.
    Finish,
}

/// Telegraphed attack: brace, warn, hit at `hit_offset`, stop, recover.
///
/// There is exactly one hit phase.
#[must_use]
pub fn attack(
    profile: &AttackProfile,
    strike: Strike,
    brace: f32,
    parryable: bool,
) -> Vec<Step<CombatAction>> {
    let mut steps = Vec::with_capacity(6);
    steps.push(Step::now(CombatAction::Brace { factor: brace }));
    if let Some(duration) = profile.telegraph {
        steps.push(Step::now(CombatAction::Telegraph {
            duration,
            parryable,
        }));
    }
    steps.push(Step::after(profile.hit_offset, CombatAction::EndWindup));
    steps.push(Step::now(CombatAction::Strike(strike)));
    steps.push(Step::now(CombatAction::Halt));
    steps.push(Step::after(profile.recovery, CombatAction::Finish));
    steps
}

/// Player spell: windup, release, recovery.
#[must_use]
pub fn player_cast(config: &PlayerConfig) -> Vec<Step<CombatAction>> {
    vec![
        Step::now(CombatAction::Brace { factor: 0.0 }),
        Step::after(config.cast_windup, CombatAction::Strike(Strike::PlayerSpell)),
        Step::after(config.cast_recovery, CombatAction::Finish),
    ]
}

/// Player dash: hold dash velocity, then stop.
#[must_use]
pub fn player_dash(config: &PlayerConfig) -> Vec<Step<CombatAction>> {
    vec![
        Step::now(CombatAction::Surge {
            speed: config.dash_speed,
        }),
        Step::after(config.dash_duration, CombatAction::Halt),
        Step::now(CombatAction::Finish),
    ]
}

/// Number of hit phases in a step list.
#[must_use]
pub fn strike_count(steps: &[Step<CombatAction>]) -> usize {
    steps
        .iter()
        .filter(|step| matches!(step.action, CombatAction::Strike(_)))
        .count()
}
