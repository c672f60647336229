//! Timed status effects: confusion, freeze and invincibility.
//!
//! This module only keeps the timers. The world reacts to applications and
//! expiries (cancelling tasks, restoring frozen actors, resetting enemy
//! state machines).

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Kind of timed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    /// Idle-like movement, no attack initiation.
    Confused,
    /// Full action lock.
    Frozen,
    /// Incoming damage is ignored.
    Invincible,
}

impl StatusKind {
    /// All status kinds.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Confused, Self::Frozen, Self::Invincible]
    }
}

/// Physical configuration saved when an actor is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreezeSnapshot {
    /// Velocity before the freeze.
    pub velocity: Vec2,
    /// Whether the actor was already held in a scripted position.
    pub forced_position: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Frozen {
    remaining: f32,
    snapshot: FreezeSnapshot,
}

/// Statuses that ran out during a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusExpiry {
    /// Confusion ended.
    pub confused: bool,
    /// Freeze ended; carries the configuration to restore.
    pub frozen: Option<FreezeSnapshot>,
    /// Invincibility ended.
    pub invincible: bool,
}

impl StatusExpiry {
    /// Check if anything expired.
    #[must_use]
    pub fn any(&self) -> bool {
        self.confused || self.frozen.is_some() || self.invincible
    }
}

/// Status timers of one actor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects {
    confused: Option<f32>,
    frozen: Option<Frozen>,
    invincible: Option<f32>,
}

impl StatusEffects {
    /// Create with no active status.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a status is active.
    #[must_use]
    pub fn is_active(&self, kind: StatusKind) -> bool {
        match kind {
            StatusKind::Confused => self.confused.is_some(),
            StatusKind::Frozen => self.frozen.is_some(),
            StatusKind::Invincible => self.invincible.is_some(),
        }
    }

    /// Remaining time of a status, if active.
    #[must_use]
    pub fn remaining(&self, kind: StatusKind) -> Option<f32> {
        match kind {
            StatusKind::Confused => self.confused,
            StatusKind::Frozen => self.frozen.map(|f| f.remaining),
            StatusKind::Invincible => self.invincible,
        }
    }

    /// Check if confused.
    #[must_use]
    pub fn is_confused(&self) -> bool {
        self.confused.is_some()
    }

    /// Check if frozen.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Check if invincible.
    #[must_use]
    pub fn is_invincible(&self) -> bool {
        self.invincible.is_some()
    }

    /// Confuse for `duration`, keeping the longer of old and new timers.
    pub fn confuse(&mut self, duration: f32) {
        self.confused = Some(self.confused.unwrap_or(0.0).max(duration));
    }

    /// Grant invincibility for `duration`, keeping the longer timer.
    pub fn grant_invincibility(&mut self, duration: f32) {
        self.invincible = Some(self.invincible.unwrap_or(0.0).max(duration));
    }

    /// Freeze for `duration`.
    ///
    /// Re-freezing an already frozen actor extends the timer but keeps the
    /// original snapshot, so expiry restores the configuration from before the
    /// first freeze. Returns `true` if this started a new freeze.
    pub fn freeze(&mut self, duration: f32, snapshot: FreezeSnapshot) -> bool {
        match &mut self.frozen {
            Some(frozen) => {
                frozen.remaining = frozen.remaining.max(duration);
                false
            },
            None => {
                self.frozen = Some(Frozen {
                    remaining: duration,
                    snapshot,
                });
                true
            },
        }
    }

    /// Count all timers down by `dt` and report what expired.
    pub fn tick(&mut self, dt: f32) -> StatusExpiry {
        let mut expiry = StatusExpiry::default();

        if let Some(remaining) = self.confused.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.confused = None;
                expiry.confused = true;
            }
        }

        if let Some(frozen) = self.frozen.as_mut() {
            frozen.remaining -= dt;
            if frozen.remaining <= 0.0 {
                expiry.frozen = Some(frozen.snapshot);
                self.frozen = None;
            }
        }

        if let Some(remaining) = self.invincible.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.invincible = None;
                expiry.invincible = true;
            }
        }

        expiry
    }

    /// Drop every status without reporting expiry (used on death).
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(vx: f32) -> FreezeSnapshot {
        FreezeSnapshot {
            velocity: Vec2::new(vx, 0.0),
            forced_position: false,
        }
    }

    #[test]
    fn test_confusion_expires() {
        let mut status = StatusEffects::new();
        status.confuse(1.0);
        assert!(status.is_confused());

        assert!(!status.tick(0.5).any());
        let expiry = status.tick(0.6);
        assert!(expiry.confused);
        assert!(!status.is_confused());
    }

    #[test]
    fn test_longer_timer_wins() {
        let mut status = StatusEffects::new();
        status.grant_invincibility(2.0);
        status.grant_invincibility(0.5);
        assert_eq!(status.remaining(StatusKind::Invincible), Some(2.0));
    }

    #[test]
    fn test_refreeze_keeps_original_snapshot() {
        let mut status = StatusEffects::new();
        assert!(status.freeze(1.0, snapshot(3.0)));
        assert!(!status.freeze(2.0, snapshot(0.0)));

        assert!(status.tick(1.5).frozen.is_none());
        let expiry = status.tick(0.6);
        assert_eq!(expiry.frozen, Some(snapshot(3.0)));
        assert!(!status.is_frozen());
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut status = StatusEffects::new();
        status.confuse(1.0);
        status.freeze(1.0, snapshot(0.0));
        status.grant_invincibility(1.0);
        status.clear();
        for kind in StatusKind::all() {
            assert!(!status.is_active(kind));
        }
        assert!(!status.tick(5.0).any());
    }
}
