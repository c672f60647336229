//! Combat event stream for presentation, audio and reward systems.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use glam::Vec2;
use riposte_common::{ActorId, TelegraphId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::enemy::EnemyState;
use crate::parry::TelegraphState;
use crate::status::StatusKind;
use crate::timeline::Strike;

/// Events emitted by the combat core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// Enemy state machine transitioned
    StateChanged {
        /// Enemy
        actor: ActorId,
        /// Previous state
        from: EnemyState,
        /// New state
        to: EnemyState,
    },
    /// An attack began its windup (or the player's swing started)
    AttackStarted {
        /// Attacker
        actor: ActorId,
        /// Attack being performed
        strike: Strike,
    },
    /// A hit phase resolved
    AttackHitFrame {
        /// Attacker
        actor: ActorId,
        /// Attack that produced the hit phase
        strike: Strike,
        /// Actors struck, in query order
        targets: Vec<ActorId>,
    },
    /// An actor lost health
    Hurt {
        /// Damaged actor
        actor: ActorId,
        /// Health removed
        amount: f32,
        /// Attacker, if any
        source: Option<ActorId>,
    },
    /// An actor reached the dead state
    Death {
        /// Dead actor
        actor: ActorId,
    },
    /// A telegraph opened
    TelegraphStart {
        /// Telegraph ID
        telegraph: TelegraphId,
        /// Attacker
        attacker: ActorId,
        /// World time the warning started
        window_open: f64,
        /// World time the attack lands
        window_close: f64,
        /// Whether a counter can parry it
        parryable: bool,
    },
    /// A telegraph resolved
    TelegraphEnd {
        /// Telegraph ID
        telegraph: TelegraphId,
        /// Attacker
        attacker: ActorId,
        /// Final state
        outcome: TelegraphState,
    },
    /// A counter parried an attack
    Parried {
        /// Countering actor
        defender: ActorId,
        /// Parried attacker
        attacker: ActorId,
        /// Parried telegraph
        telegraph: TelegraphId,
    },
    /// Global slow motion started
    SlowMotion {
        /// Time scale
        scale: f32,
        /// Real-time duration
        duration: f32,
    },
    /// An actor was stunned
    Stunned {
        /// Stunned actor
        actor: ActorId,
        /// Stun duration
        duration: f32,
    },
    /// A status was applied
    StatusApplied {
        /// Affected actor
        actor: ActorId,
        /// Status kind
        kind: StatusKind,
        /// Duration
        duration: f32,
    },
    /// A status ran out
    StatusExpired {
        /// Affected actor
        actor: ActorId,
        /// Status kind
        kind: StatusKind,
    },
    /// A boss entered its armor phase
    BossArmorUp {
        /// Boss
        actor: ActorId,
        /// Damage multiplier now in effect
        multiplier: f32,
    },
    /// The player earned mana by landing a hit
    ManaGained {
        /// Player
        actor: ActorId,
        /// Mana gained
        amount: f32,
    },
    /// A defeated enemy dropped its loot
    LootDropped {
        /// Defeated enemy
        actor: ActorId,
        /// Drop position
        position: Vec2,
    },
    /// The player asked to jump (handled by physics/presentation)
    JumpRequested {
        /// Player
        actor: ActorId,
    },
    /// A dead actor was removed from the simulation
    Despawned {
        /// Removed actor
        actor: ActorId,
    },
}

impl CombatEvent {
    /// Actor the event is about.
    #[must_use]
    pub fn actor(&self) -> ActorId {
        match self {
            Self::StateChanged { actor, .. }
            | Self::AttackStarted { actor, .. }
            | Self::AttackHitFrame { actor, .. }
            | Self::Hurt { actor, .. }
            | Self::Death { actor }
            | Self::Stunned { actor, .. }
            | Self::StatusApplied { actor, .. }
            | Self::StatusExpired { actor, .. }
            | Self::BossArmorUp { actor, .. }
            | Self::ManaGained { actor, .. }
            | Self::LootDropped { actor, .. }
            | Self::JumpRequested { actor }
            | Self::Despawned { actor } => *actor,
            Self::TelegraphStart { attacker, .. } | Self::TelegraphEnd { attacker, .. } => {
                *attacker
            },
            Self::Parried { defender, .. } => *defender,
            Self::SlowMotion { .. } => ActorId::NULL,
        }
    }

    /// Event name for logs and tallies.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "state_changed",
            Self::AttackStarted { .. } => "attack_started",
            Self::AttackHitFrame { .. } => "attack_hit_frame",
            Self::Hurt { .. } => "hurt",
            Self::Death { .. } => "death",
            Self::TelegraphStart { .. } => "telegraph_start",
            Self::TelegraphEnd { .. } => "telegraph_end",
            Self::Parried { .. } => "parried",
            Self::SlowMotion { .. } => "slow_motion",
            Self::Stunned { .. } => "stunned",
            Self::StatusApplied { .. } => "status_applied",
            Self::StatusExpired { .. } => "status_expired",
            Self::BossArmorUp { .. } => "boss_armor_up",
            Self::ManaGained { .. } => "mana_gained",
            Self::LootDropped { .. } => "loot_dropped",
            Self::JumpRequested { .. } => "jump_requested",
            Self::Despawned { .. } => "despawned",
        }
    }
}

/// Bounded event bus.
///
/// Publishing never blocks: when the bus is full the event is dropped and a
/// warning is logged.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for publishing events
    sender: Sender<CombatEvent>,
    /// Receiver for collecting events
    receiver: Receiver<CombatEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: CombatEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {},
            Err(TrySendError::Full(event)) => {
                warn!(capacity = self.capacity, ?event, "event bus full, dropping event");
            },
            Err(TrySendError::Disconnected(_)) => {},
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<CombatEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<CombatEvent> {
        self.sender.clone()
    }
}
