//! Hit detection, damage and knockback.

use ahash::AHashSet;
use glam::Vec2;
use riposte_common::{ActorId, HitShape};
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, Faction};

/// Which actors a hit query may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetFilter {
    /// Faction that can be hit
    pub faction: Faction,
    /// Actor that never matches (usually the attacker)
    pub exclude: Option<ActorId>,
}

impl TargetFilter {
    /// Matches live actors of `faction`.
    #[must_use]
    pub const fn faction(faction: Faction) -> Self {
        Self {
            faction,
            exclude: None,
        }
    }

    /// Excludes one actor.
    #[must_use]
    pub const fn excluding(mut self, id: ActorId) -> Self {
        self.exclude = Some(id);
        self
    }

    /// Checks if an actor passes the filter.
    #[must_use]
    pub fn accepts(&self, actor: &Actor) -> bool {
        actor.is_alive() && actor.faction() == self.faction && self.exclude != Some(actor.id())
    }
}

/// Returns every accepted actor whose body overlaps `shape` placed at `origin`.
///
/// Pure query: nothing is mutated.
pub fn query_hit<'a>(
    shape: &HitShape,
    origin: Vec2,
    targets: impl IntoIterator<Item = &'a Actor>,
    filter: &TargetFilter,
) -> Vec<ActorId> {
    targets
        .into_iter()
        .filter(|actor| filter.accepts(actor))
        .filter(|actor| shape.overlaps(origin, &actor.body()))
        .map(Actor::id)
        .collect()
}

/// Result of applying damage to one actor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Nothing happened (dead, invincible or a non-positive amount).
    Ignored,
    /// Health went down; the actor survived.
    Damaged {
        /// Health actually removed
        dealt: f32,
        /// Health left
        remaining: f32,
    },
    /// This hit killed the actor. Returned once per actor.
    Died {
        /// Health actually removed
        dealt: f32,
    },
}

impl DamageOutcome {
    /// Checks if the hit landed.
    #[must_use]
    pub const fn landed(&self) -> bool {
        !matches!(self, Self::Ignored)
    }

    /// Health removed by the hit.
    #[must_use]
    pub const fn dealt(&self) -> f32 {
        match *self {
            Self::Ignored => 0.0,
            Self::Damaged { dealt, .. } | Self::Died { dealt } => dealt,
        }
    }
}

/// Subtracts `amount * armor` from the actor's health, clamped at zero.
pub fn apply_damage(actor: &mut Actor, amount: f32) -> DamageOutcome {
    if actor.is_dead() || actor.status.is_invincible() || amount <= 0.0 {
        return DamageOutcome::Ignored;
    }

    let armor = actor.armor;
    let dealt = actor.health_mut().damage(amount * armor);
    if actor.health().is_empty() {
        if actor.mark_dead() {
            return DamageOutcome::Died { dealt };
        }
        return DamageOutcome::Ignored;
    }

    DamageOutcome::Damaged {
        dealt,
        remaining: actor.health().current(),
    }
}

/// Knockback direction after the upward floor is applied.
///
/// A zero direction falls back to pushing the actor backwards from its
/// facing. Unless `forced` is set the vertical component is raised to at
/// least `min_upward_bias`.
#[must_use]
pub fn knockback_direction(
    direction: Vec2,
    facing_back: Vec2,
    forced: bool,
    min_upward_bias: f32,
) -> Vec2 {
    let mut dir = direction.normalize_or_zero();
    if dir == Vec2::ZERO {
        dir = facing_back;
    }
    if forced || dir.y >= min_upward_bias {
        return dir;
    }

    let y = min_upward_bias.clamp(0.0, 1.0);
    let x = (1.0 - y * y).sqrt();
    let sign = if dir.x < 0.0 { -1.0 } else { 1.0 };
    Vec2::new(x * sign, y)
}

/// Replaces the actor's velocity with a knockback impulse.
///
/// Frozen actors are held in place and ignore knockback.
pub fn apply_knockback(actor: &mut Actor, direction: Vec2, magnitude: f32, min_upward_bias: f32) {
    if actor.status.is_frozen() {
        return;
    }
    let back = -actor.facing.to_vec2();
    let dir = knockback_direction(direction, back, actor.forced_position, min_upward_bias);
    actor.velocity = dir * magnitude.max(0.0);
}

/// Targets already struck during one hit phase.
#[derive(Debug, Clone, Default)]
pub struct HitList {
    seen: AHashSet<ActorId>,
    order: Vec<ActorId>,
}

impl HitList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a target. Returns `false` if it was already struck.
    pub fn insert(&mut self, id: ActorId) -> bool {
        if self.seen.insert(id) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    /// Records several targets.
    pub fn extend(&mut self, ids: impl IntoIterator<Item = ActorId>) {
        for id in ids {
            self.insert(id);
        }
    }

    /// Checks if a target was struck.
    #[must_use]
    pub fn contains(&self, id: ActorId) -> bool {
        self.seen.contains(&id)
    }

    /// Number of distinct targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Checks if nothing was struck.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Targets in first-struck order.
    #[must_use]
    pub fn into_vec(self) -> Vec<ActorId> {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Role;
    use crate::config::{EnemyConfig, PlayerConfig};
    use crate::enemy::EnemyBrain;
    use crate::player::PlayerController;
    use crate::status::FreezeSnapshot;

    fn enemy(id: u64, x: f32) -> Actor {
        let config = EnemyConfig {
            max_health: 10.0,
            ..EnemyConfig::default()
        };
        let position = Vec2::new(x, 0.75);
        Actor::new(
            ActorId::from_raw(id),
            Faction::Enemy,
            position,
            config.half_extents,
            config.max_health,
            Role::Enemy(EnemyBrain::standard(config, position)),
        )
    }

    fn player(x: f32) -> Actor {
        let config = PlayerConfig::default();
        Actor::new(
            ActorId::from_raw(1),
            Faction::Player,
            Vec2::new(x, 0.8),
            config.half_extents,
            config.max_health,
            Role::Player(PlayerController::new(config)),
        )
    }

    #[test]
    fn test_query_filters_faction_and_dead() {
        let mut dead = enemy(3, 1.0);
        apply_damage(&mut dead, 100.0);
        let actors = vec![player(0.5), enemy(2, 1.0), dead, enemy(4, 9.0)];

        let hits = query_hit(
            &HitShape::rect(3.0, 2.0),
            Vec2::new(1.0, 0.75),
            &actors,
            &TargetFilter::faction(Faction::Enemy),
        );
        assert_eq!(hits, vec![ActorId::from_raw(2)]);
    }

    #[test]
    fn test_query_excludes_attacker() {
        let actors = vec![enemy(2, 0.0), enemy(3, 0.5)];
        let filter = TargetFilter::faction(Faction::Enemy).excluding(ActorId::from_raw(2));
        let hits = query_hit(&HitShape::circle(2.0), Vec2::ZERO, &actors, &filter);
        assert_eq!(hits, vec![ActorId::from_raw(3)]);
    }

    #[test]
    fn test_damage_kills_once() {
        let mut actor = enemy(2, 0.0);
        assert_eq!(apply_damage(&mut actor, 15.0), DamageOutcome::Died { dealt: 10.0 });
        assert_eq!(actor.health().current(), 0.0);
        assert_eq!(apply_damage(&mut actor, 5.0), DamageOutcome::Ignored);
    }

    #[test]
    fn test_damage_respects_armor_and_invincibility() {
        let mut actor = enemy(2, 0.0);
        actor.armor = 0.5;
        assert_eq!(
            apply_damage(&mut actor, 4.0),
            DamageOutcome::Damaged {
                dealt: 2.0,
                remaining: 8.0
            }
        );

        actor.status.grant_invincibility(1.0);
        assert_eq!(apply_damage(&mut actor, 4.0), DamageOutcome::Ignored);
        assert_eq!(apply_damage(&mut enemy(5, 0.0), 0.0), DamageOutcome::Ignored);
    }

    #[test]
    fn test_knockback_upward_floor() {
        let mut actor = enemy(2, 0.0);
        apply_knockback(&mut actor, Vec2::new(-3.0, 0.0), 10.0, 0.35);
        assert!((actor.velocity.y - 3.5).abs() < 1e-4);
        assert!(actor.velocity.x < 0.0);
        assert!((actor.velocity.length() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_knockback_keeps_steep_direction() {
        let mut actor = enemy(2, 0.0);
        apply_knockback(&mut actor, Vec2::new(0.0, 2.0), 5.0, 0.35);
        assert_eq!(actor.velocity, Vec2::new(0.0, 5.0));
    }

    #[test]
    fn test_knockback_forced_position_skips_floor() {
        let mut actor = enemy(2, 0.0);
        actor.forced_position = true;
        apply_knockback(&mut actor, Vec2::new(1.0, -1.0), 2.0, 0.35);
        assert!(actor.velocity.y < 0.0);
    }

    #[test]
    fn test_zero_knockback_falls_back_to_facing() {
        let mut actor = enemy(2, 0.0);
        apply_knockback(&mut actor, Vec2::ZERO, 1.0, 0.0);
        assert_eq!(actor.velocity, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_frozen_ignores_knockback() {
        let mut actor = enemy(2, 0.0);
        actor.status.freeze(
            1.0,
            FreezeSnapshot {
                velocity: Vec2::ZERO,
                forced_position: false,
            },
        );
        apply_knockback(&mut actor, Vec2::X, 10.0, 0.35);
        assert_eq!(actor.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_hit_list_dedupes() {
        let mut hits = HitList::new();
        assert!(hits.insert(ActorId::from_raw(3)));
        assert!(!hits.insert(ActorId::from_raw(3)));
        hits.extend([ActorId::from_raw(1), ActorId::from_raw(3)]);
        assert_eq!(hits.len(), 2);
        assert!(hits.contains(ActorId::from_raw(1)));
        assert_eq!(hits.into_vec(), vec![ActorId::from_raw(3), ActorId::from_raw(1)]);
    }
}
