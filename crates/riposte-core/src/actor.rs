//! Actor and health model shared by every combatant.

use glam::Vec2;
use riposte_common::{Aabb, ActorId, Facing};
use serde::{Deserialize, Serialize};

use crate::enemy::EnemyBrain;
use crate::player::{CounterState, PlayerController};
use crate::status::StatusEffects;

/// Side an actor fights for. Hit queries only reach the opposing faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// The player character
    Player,
    /// Enemies and bosses
    Enemy,
}

impl Faction {
    /// The faction this one fights.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }
}

/// Health pool clamped to `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    current: f32,
    max: f32,
}

impl Health {
    /// Full health pool.
    #[must_use]
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    /// Current health.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Maximum health.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Current health as a fraction of maximum.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.current / self.max
        }
    }

    /// Subtract damage, clamping at zero. Returns the amount removed.
    pub fn damage(&mut self, amount: f32) -> f32 {
        let before = self.current;
        self.current = (self.current - amount.max(0.0)).max(0.0);
        before - self.current
    }

    /// Restore health, clamping at maximum. Returns the amount restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.current;
        self.current = (self.current + amount.max(0.0)).min(self.max);
        self.current - before
    }

    /// Check if the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current <= 0.0
    }
}

/// Timed recoil after a hit. Input is suppressed while it runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Recoil {
    timer: f32,
    length: f32,
    active: bool,
}

impl Recoil {
    /// Start (or restart) recoiling for `length` seconds.
    pub fn start(&mut self, length: f32) {
        self.timer = 0.0;
        self.length = length.max(0.0);
        self.active = true;
    }

    /// Advance the timer. Returns `true` on the tick recoil ends.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }
        self.timer += dt;
        if self.timer >= self.length {
            self.active = false;
            return true;
        }
        false
    }

    /// Stop recoiling immediately.
    pub fn clear(&mut self) {
        self.active = false;
    }

    /// Check if recoiling.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Time spent recoiling so far.
    #[must_use]
    pub const fn timer(&self) -> f32 {
        self.timer
    }

    /// Length of the current recoil.
    #[must_use]
    pub const fn length(&self) -> f32 {
        self.length
    }
}

/// Role-specific controller of an actor.
#[derive(Debug, Clone)]
pub enum Role {
    /// Input-driven player character
    Player(PlayerController),
    /// AI-driven enemy or boss
    Enemy(EnemyBrain),
}

/// A combatant in the simulation.
#[derive(Debug, Clone)]
pub struct Actor {
    id: ActorId,
    faction: Faction,
    /// Body center in world space.
    pub position: Vec2,
    /// Current velocity.
    pub velocity: Vec2,
    /// Horizontal facing.
    pub facing: Facing,
    half_extents: Vec2,
    health: Health,
    /// Multiplier applied to incoming damage.
    pub armor: f32,
    /// Hit recoil.
    pub recoil: Recoil,
    /// Timed statuses.
    pub status: StatusEffects,
    /// Held in place by a scripted sequence; knockback keeps its raw direction.
    pub forced_position: bool,
    /// Ground contact, refreshed from physics every tick.
    pub grounded: bool,
    dead: bool,
    dead_time: f32,
    role: Role,
}

impl Actor {
    /// Create an actor at full health.
    #[must_use]
    pub fn new(
        id: ActorId,
        faction: Faction,
        position: Vec2,
        half_extents: Vec2,
        max_health: f32,
        role: Role,
    ) -> Self {
        Self {
            id,
            faction,
            position,
            velocity: Vec2::ZERO,
            facing: Facing::default(),
            half_extents,
            health: Health::new(max_health),
            armor: 1.0,
            recoil: Recoil::default(),
            status: StatusEffects::new(),
            forced_position: false,
            grounded: true,
            dead: false,
            dead_time: 0.0,
            role,
        }
    }

    /// Actor ID.
    #[must_use]
    pub const fn id(&self) -> ActorId {
        self.id
    }

    /// Actor faction.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Health pool.
    #[must_use]
    pub const fn health(&self) -> &Health {
        &self.health
    }

    /// Mutable health pool. Damage should go through [`crate::hit::apply_damage`].
    pub(crate) fn health_mut(&mut self) -> &mut Health {
        &mut self.health
    }

    /// Body half-extents.
    #[must_use]
    pub const fn half_extents(&self) -> Vec2 {
        self.half_extents
    }

    /// Body bounds at the current position.
    #[must_use]
    pub fn body(&self) -> Aabb {
        Aabb::from_center(self.position, self.half_extents)
    }

    /// Bottom-center of the body, used for ground checks.
    #[must_use]
    pub fn feet(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.y - self.half_extents.y)
    }

    /// Point relative to the actor, with `x` mirrored by facing.
    #[must_use]
    pub fn local_point(&self, offset: Vec2) -> Vec2 {
        self.position + Vec2::new(offset.x * self.facing.sign(), offset.y)
    }

    /// Check if the actor reached the terminal dead state.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Check if the actor is alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Enter the dead state. Returns `false` if already dead.
    pub(crate) fn mark_dead(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        self.dead_time = 0.0;
        self.velocity.x = 0.0;
        self.recoil.clear();
        self.status.clear();
        true
    }

    /// Advance the corpse timer. Returns seconds spent dead.
    pub(crate) fn tick_dead(&mut self, dt: f32) -> f32 {
        self.dead_time += dt;
        self.dead_time
    }

    /// Check if input and AI are suppressed by recoil.
    #[must_use]
    pub fn is_recoiling(&self) -> bool {
        match &self.role {
            Role::Player(player) => self.recoil.is_active() || player.recoil().is_active(),
            Role::Enemy(_) => self.recoil.is_active(),
        }
    }

    /// Check if the actor may act at all (alive and not frozen).
    #[must_use]
    pub fn can_act(&self) -> bool {
        !self.dead && !self.status.is_frozen()
    }

    /// Role controller.
    #[must_use]
    pub const fn role(&self) -> &Role {
        &self.role
    }

    /// Mutable role controller.
    pub fn role_mut(&mut self) -> &mut Role {
        &mut self.role
    }

    /// Player controller, if this is the player.
    #[must_use]
    pub fn as_player(&self) -> Option<&PlayerController> {
        match &self.role {
            Role::Player(player) => Some(player),
            Role::Enemy(_) => None,
        }
    }

    /// Mutable player controller, if this is the player.
    pub fn as_player_mut(&mut self) -> Option<&mut PlayerController> {
        match &mut self.role {
            Role::Player(player) => Some(player),
            Role::Enemy(_) => None,
        }
    }

    /// Enemy brain, if this is an enemy.
    #[must_use]
    pub fn as_enemy(&self) -> Option<&EnemyBrain> {
        match &self.role {
            Role::Enemy(brain) => Some(brain),
            Role::Player(_) => None,
        }
    }

    /// Mutable enemy brain, if this is an enemy.
    pub fn as_enemy_mut(&mut self) -> Option<&mut EnemyBrain> {
        match &mut self.role {
            Role::Enemy(brain) => Some(brain),
            Role::Player(_) => None,
        }
    }

    /// Counter capability of this actor, if it has one.
    ///
    /// Players can counter. Plain enemies cannot.
    #[must_use]
    pub fn counter_state(&self) -> Option<CounterState> {
        match &self.role {
            Role::Player(player) => Some(player.counter_state()),
            Role::Enemy(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnemyConfig, PlayerConfig};

    fn enemy() -> Actor {
        let config = EnemyConfig::default();
        Actor::new(
            ActorId::from_raw(2),
            Faction::Enemy,
            Vec2::new(0.0, 0.75),
            config.half_extents,
            config.max_health,
            Role::Enemy(EnemyBrain::standard(config, Vec2::new(0.0, 0.75))),
        )
    }

    #[test]
    fn test_health_clamps() {
        let mut health = Health::new(10.0);
        assert_eq!(health.damage(15.0), 10.0);
        assert_eq!(health.current(), 0.0);
        assert!(health.is_empty());

        assert_eq!(health.heal(25.0), 10.0);
        assert_eq!(health.current(), 10.0);
    }

    #[test]
    fn test_negative_amounts_are_ignored() {
        let mut health = Health::new(10.0);
        assert_eq!(health.damage(-5.0), 0.0);
        assert_eq!(health.heal(-5.0), 0.0);
        assert_eq!(health.current(), 10.0);
    }

    #[test]
    fn test_recoil_runs_out() {
        let mut recoil = Recoil::default();
        recoil.start(0.3);
        assert!(recoil.is_active());
        assert!(!recoil.tick(0.2));
        assert!(recoil.tick(0.2));
        assert!(!recoil.is_active());
        assert!(!recoil.tick(0.2));
    }

    #[test]
    fn test_mark_dead_once() {
        let mut actor = enemy();
        assert!(actor.mark_dead());
        assert!(!actor.mark_dead());
        assert!(actor.is_dead());
        assert!(!actor.can_act());
    }

    #[test]
    fn test_local_point_mirrors() {
        let mut actor = enemy();
        actor.facing = Facing::Left;
        assert_eq!(actor.local_point(Vec2::new(1.0, 0.5)), Vec2::new(-1.0, 1.25));
    }

    #[test]
    fn test_counter_capability_by_role() {
        assert!(enemy().counter_state().is_none());

        let config = PlayerConfig::default();
        let player = Actor::new(
            ActorId::from_raw(1),
            Faction::Player,
            Vec2::ZERO,
            config.half_extents,
            config.max_health,
            Role::Player(PlayerController::new(config)),
        );
        assert!(player.counter_state().is_some());
        assert_eq!(player.faction().opponent(), Faction::Enemy);
    }
}
