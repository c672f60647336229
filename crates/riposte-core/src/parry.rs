//! Attack telegraphs and counter resolution.
//!
//! An attacker opens a telegraph when its windup starts. The parry sub-window
//! is anchored to the telegraph's close:
//!
//! ```text
//! open                      close - parry_window        close
//!  |---------------------------------|======================|
//!                                     counter here = Parried
//! ```
//!
//! Each telegraph resolves to exactly one outcome. It is either `Parried` by a
//! counter inside the sub-window or `Expired` when the windup ends.

use std::collections::BTreeMap;

use riposte_common::{ActorId, IdAllocator, TelegraphId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lifecycle of a parry opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelegraphState {
    /// Window open, no outcome yet
    Armed,
    /// Countered inside the parry sub-window
    Parried,
    /// Closed without being parried
    Expired,
}

/// Time-bounded warning that an attack is about to land.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackTelegraph {
    /// Telegraph ID
    pub id: TelegraphId,
    /// Actor performing the attack
    pub attacker: ActorId,
    /// World time the warning started
    pub window_open: f64,
    /// World time the attack lands
    pub window_close: f64,
    /// Length of the parry sub-window
    pub parry_window: f32,
    /// Whether a counter can parry this attack at all
    pub parryable: bool,
    /// Current lifecycle state
    pub state: TelegraphState,
}

impl AttackTelegraph {
    /// Start of the parry sub-window.
    #[must_use]
    pub fn parry_start(&self) -> f64 {
        (self.window_close - f64::from(self.parry_window)).max(self.window_open)
    }

    /// Checks if `time` falls inside the parry sub-window (inclusive).
    #[must_use]
    pub fn in_parry_window(&self, time: f64) -> bool {
        time >= self.parry_start() && time <= self.window_close
    }

    /// Checks if the telegraph can still be parried at `time`.
    #[must_use]
    pub fn can_parry_at(&self, time: f64) -> bool {
        self.parryable && self.state == TelegraphState::Armed && self.in_parry_window(time)
    }
}

/// Outcome of a counter input.
#[derive(Debug, Clone, PartialEq)]
pub enum ParryResolution {
    /// A telegraph was parried; it has been removed from the registry.
    Parried(AttackTelegraph),
    /// No armed telegraph was in its parry sub-window.
    NoEffect,
}

/// Registry of live telegraphs.
#[derive(Debug, Clone, Default)]
pub struct TelegraphRegistry {
    telegraphs: BTreeMap<TelegraphId, AttackTelegraph>,
    ids: IdAllocator,
}

impl TelegraphRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a telegraph that closes `duration` seconds after `now`.
    pub fn open(
        &mut self,
        attacker: ActorId,
        now: f64,
        duration: f32,
        parry_window: f32,
        parryable: bool,
    ) -> &AttackTelegraph {
        let id = self.ids.next_telegraph();
        let telegraph = AttackTelegraph {
            id,
            attacker,
            window_open: now,
            window_close: now + f64::from(duration.max(0.0)),
            parry_window: parry_window.max(0.0),
            parryable,
            state: TelegraphState::Armed,
        };
        debug!(?id, %attacker, open = now, close = telegraph.window_close, "telegraph opened");
        self.telegraphs.entry(id).or_insert(telegraph)
    }

    /// Looks up a live telegraph.
    #[must_use]
    pub fn get(&self, id: TelegraphId) -> Option<&AttackTelegraph> {
        self.telegraphs.get(&id)
    }

    /// Number of live telegraphs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.telegraphs.len()
    }

    /// Checks if no telegraph is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.telegraphs.is_empty()
    }

    /// Iterates live telegraphs in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &AttackTelegraph> {
        self.telegraphs.values()
    }

    /// Resolves a counter input at `now`.
    ///
    /// The first armed, parryable telegraph (in ID order) whose sub-window
    /// contains `now` and that `accept` agrees to is parried. A counter
    /// outside every sub-window changes nothing; the telegraphs stay armed.
    pub fn resolve_counter<F>(&mut self, now: f64, mut accept: F) -> ParryResolution
    where
        F: FnMut(&AttackTelegraph) -> bool,
    {
        let Some(id) = self
            .telegraphs
            .values()
            .find(|t| t.can_parry_at(now) && accept(t))
            .map(|t| t.id)
        else {
            return ParryResolution::NoEffect;
        };

        match self.telegraphs.remove(&id) {
            Some(mut telegraph) => {
                telegraph.state = TelegraphState::Parried;
                debug!(?id, attacker = %telegraph.attacker, at = now, "telegraph parried");
                ParryResolution::Parried(telegraph)
            },
            None => ParryResolution::NoEffect,
        }
    }

    /// Closes every telegraph owned by `attacker`, marking them expired.
    pub fn close_attacker(&mut self, attacker: ActorId) -> Vec<AttackTelegraph> {
        self.remove_where(|t| t.attacker == attacker)
    }

    /// Removes every telegraph whose close lies strictly before `now`.
    pub fn expire(&mut self, now: f64) -> Vec<AttackTelegraph> {
        self.remove_where(|t| now > t.window_close)
    }

    fn remove_where<F>(&mut self, mut pred: F) -> Vec<AttackTelegraph>
    where
        F: FnMut(&AttackTelegraph) -> bool,
    {
        let ids: Vec<TelegraphId> = self
            .telegraphs
            .values()
            .filter(|t| pred(t))
            .map(|t| t.id)
            .collect();

        ids.into_iter()
            .filter_map(|id| self.telegraphs.remove(&id))
            .map(|mut telegraph| {
                telegraph.state = TelegraphState::Expired;
                telegraph
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attacker() -> ActorId {
        ActorId::from_raw(7)
    }

    /// Window [1.0, 1.5] with a 0.15 s sub-window.
    fn registry() -> (TelegraphRegistry, TelegraphId) {
        let mut registry = TelegraphRegistry::new();
        let id = registry.open(attacker(), 1.0, 0.5, 0.15, true).id;
        (registry, id)
    }

    #[test]
    fn test_parry_sub_window_bounds() {
        let (registry, id) = registry();
        let telegraph = registry.get(id).unwrap();
        assert!((telegraph.parry_start() - 1.35).abs() < 1e-6);
        assert!(telegraph.in_parry_window(1.5));
        assert!(!telegraph.in_parry_window(1.3));
        assert!(!telegraph.in_parry_window(1.51));
    }

    #[test]
    fn test_counter_inside_sub_window_parries() {
        let (mut registry, id) = registry();
        match registry.resolve_counter(1.4, |_| true) {
            ParryResolution::Parried(telegraph) => {
                assert_eq!(telegraph.id, id);
                assert_eq!(telegraph.state, TelegraphState::Parried);
            },
            ParryResolution::NoEffect => panic!("expected a parry"),
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_early_counter_has_no_effect() {
        let (mut registry, id) = registry();
        assert_eq!(registry.resolve_counter(1.2, |_| true), ParryResolution::NoEffect);
        assert_eq!(registry.get(id).unwrap().state, TelegraphState::Armed);
        // A later counter inside the window still works
        assert!(matches!(
            registry.resolve_counter(1.45, |_| true),
            ParryResolution::Parried(_)
        ));
    }

    #[test]
    fn test_at_most_one_outcome() {
        let (mut registry, _) = registry();
        assert!(matches!(
            registry.resolve_counter(1.4, |_| true),
            ParryResolution::Parried(_)
        ));
        assert_eq!(registry.resolve_counter(1.45, |_| true), ParryResolution::NoEffect);
        assert!(registry.expire(2.0).is_empty());
    }

    #[test]
    fn test_unparryable_and_rejected() {
        let mut registry = TelegraphRegistry::new();
        registry.open(attacker(), 0.0, 1.0, 0.2, false);
        assert_eq!(registry.resolve_counter(0.9, |_| true), ParryResolution::NoEffect);

        registry.open(ActorId::from_raw(8), 0.0, 1.0, 0.2, true);
        assert_eq!(registry.resolve_counter(0.9, |_| false), ParryResolution::NoEffect);
    }

    #[test]
    fn test_short_telegraph_clamps_to_open() {
        let mut registry = TelegraphRegistry::new();
        let telegraph = registry.open(attacker(), 2.0, 0.1, 0.5, true);
        assert_eq!(telegraph.parry_start(), 2.0);
    }

    #[test]
    fn test_expire_is_strictly_after_close() {
        let (mut registry, id) = registry();
        assert!(registry.expire(1.5).is_empty());
        let expired = registry.expire(1.6);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, id);
        assert_eq!(expired[0].state, TelegraphState::Expired);
    }

    #[test]
    fn test_close_attacker() {
        let (mut registry, _) = registry();
        registry.open(ActorId::from_raw(99), 1.0, 0.5, 0.1, true);
        let closed = registry.close_attacker(attacker());
        assert_eq!(closed.len(), 1);
        assert_eq!(registry.len(), 1);
    }
}
