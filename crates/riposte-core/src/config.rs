//! Tuning configuration for the combat core.
//!
//! Every struct deserializes with defaults, so a partial TOML/JSON document
//! only needs to name the values it changes. [`CombatConfig::validate`]
//! rejects values that would make a state machine misbehave.

use glam::Vec2;
use riposte_common::{CombatError, CombatResult, HitShape};
use serde::{Deserialize, Serialize};

use crate::boss::BossWeights;

/// Minimum time between AI-driven state transitions.
pub const STATE_CHANGE_COOLDOWN: f32 = 0.2;

/// Default lower bound on the upward component of knockback directions.
pub const MIN_UPWARD_BIAS: f32 = 0.35;

/// One telegraphed attack: windup, hit phase and recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackProfile {
    /// Damage dealt to each target.
    pub damage: f32,
    /// Knockback impulse applied to each target.
    pub knockback: f32,
    /// Warning duration for the telegraph; `None` attacks without one.
    pub telegraph: Option<f32>,
    /// Delay from the start of the windup to the hit query.
    pub hit_offset: f32,
    /// Time held after the hit before the attacker is released.
    pub recovery: f32,
    /// Hit geometry.
    pub shape: HitShape,
    /// Hit origin relative to the attacker (x mirrors with facing).
    /// `None` means the attack was never given an origin and will not hit.
    pub origin: Option<Vec2>,
}

impl Default for AttackProfile {
    fn default() -> Self {
        Self {
            damage: 10.0,
            knockback: 8.0,
            telegraph: Some(0.5),
            hit_offset: 0.5,
            recovery: 0.6,
            shape: HitShape::rect(1.6, 1.2),
            origin: Some(Vec2::new(1.0, 0.0)),
        }
    }
}

impl AttackProfile {
    /// Ranged spell that lands on the target's position.
    #[must_use]
    pub fn spell() -> Self {
        Self {
            damage: 8.0,
            knockback: 4.0,
            telegraph: Some(0.8),
            hit_offset: 0.8,
            recovery: 0.8,
            shape: HitShape::circle(1.0),
            origin: Some(Vec2::ZERO),
        }
    }

    /// Total time the attack holds its owner.
    #[must_use]
    pub fn total_duration(&self) -> f32 {
        self.hit_offset + self.recovery
    }

    fn validate(&self, field: &'static str) -> CombatResult<()> {
        if self.damage < 0.0 {
            return Err(CombatError::invalid(field, "damage must be non-negative"));
        }
        if self.hit_offset < 0.0 || self.recovery < 0.0 {
            return Err(CombatError::invalid(field, "timings must be non-negative"));
        }
        if self.telegraph.is_some_and(|t| t <= 0.0) {
            return Err(CombatError::invalid(field, "telegraph must be positive"));
        }
        Ok(())
    }
}

/// Tuning for the generic ground enemy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// Starting and maximum health.
    pub max_health: f32,
    /// Body half-extents.
    pub half_extents: Vec2,
    /// Target distance that starts a chase.
    pub detection_range: f32,
    /// Target distance that ends a chase.
    pub lose_range: f32,
    /// Patrol half-width around the spawn point.
    pub patrol_distance: f32,
    /// Walking speed while patrolling or returning.
    pub patrol_speed: f32,
    /// Speed while chasing.
    pub chase_speed: f32,
    /// Minimum time between patrol turnarounds.
    pub flip_cooldown: f32,
    /// Distance at which the melee attack starts.
    pub melee_range: f32,
    /// Distance at which the spell cast starts.
    pub cast_range: f32,
    /// Minimum time between melee attacks.
    pub attack_cooldown: f32,
    /// Minimum time between spell casts.
    pub cast_cooldown: f32,
    /// Time spent idle before patrolling again.
    pub idle_dwell: f32,
    /// Minimum dwell between AI-driven transitions.
    pub state_change_cooldown: f32,
    /// Time spent recoiling after a hit.
    pub recoil_length: f32,
    /// Whether hits interrupt the current action.
    pub staggers: bool,
    /// Melee attack.
    pub melee: AttackProfile,
    /// Optional ranged spell.
    pub spell: Option<AttackProfile>,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            max_health: 30.0,
            half_extents: Vec2::new(0.5, 0.75),
            detection_range: 8.0,
            lose_range: 12.0,
            patrol_distance: 4.0,
            patrol_speed: 2.0,
            chase_speed: 3.5,
            flip_cooldown: 0.5,
            melee_range: 1.5,
            cast_range: 6.0,
            attack_cooldown: 2.0,
            cast_cooldown: 4.0,
            idle_dwell: 0.8,
            state_change_cooldown: STATE_CHANGE_COOLDOWN,
            recoil_length: 0.3,
            staggers: true,
            melee: AttackProfile::default(),
            spell: None,
        }
    }
}

impl EnemyConfig {
    /// Enemy that also casts spells.
    #[must_use]
    pub fn caster() -> Self {
        Self {
            spell: Some(AttackProfile::spell()),
            ..Self::default()
        }
    }

    /// Validate ranges and timings.
    pub fn validate(&self) -> CombatResult<()> {
        if self.max_health <= 0.0 {
            return Err(CombatError::invalid("enemy.max_health", "must be positive"));
        }
        if self.lose_range < self.detection_range {
            return Err(CombatError::invalid(
                "enemy.lose_range",
                "must be at least detection_range",
            ));
        }
        if self.melee_range > self.cast_range && self.spell.is_some() {
            return Err(CombatError::invalid(
                "enemy.cast_range",
                "must exceed melee_range when a spell is configured",
            ));
        }
        if self.state_change_cooldown < 0.0 {
            return Err(CombatError::invalid(
                "enemy.state_change_cooldown",
                "must be non-negative",
            ));
        }
        self.melee.validate("enemy.melee")?;
        if let Some(spell) = &self.spell {
            spell.validate("enemy.spell")?;
        }
        Ok(())
    }
}

/// Directional gaze attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeConfig {
    /// Telegraph before the gaze resolves.
    pub telegraph: f32,
    /// Sub-window before resolution in which a counter dodges the gaze.
    pub dodge_window: f32,
    /// Damage on a successful gaze.
    pub damage: f32,
    /// Freeze applied on a successful gaze.
    pub freeze: f32,
    /// Maximum distance the gaze reaches.
    pub reach: f32,
    /// Recovery after resolution.
    pub recovery: f32,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            telegraph: 1.0,
            dodge_window: 0.3,
            damage: 6.0,
            freeze: 1.5,
            reach: 14.0,
            recovery: 0.8,
        }
    }
}

/// Channelled beam attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamConfig {
    /// Telegraph before the beam starts.
    pub telegraph: f32,
    /// Number of damage ticks.
    pub ticks: u32,
    /// Time between damage ticks.
    pub tick_interval: f32,
    /// Damage per tick.
    pub damage_per_tick: f32,
    /// Beam length in front of the boss.
    pub length: f32,
    /// Beam thickness.
    pub thickness: f32,
    /// Recovery after the last tick.
    pub recovery: f32,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            telegraph: 0.9,
            ticks: 5,
            tick_interval: 0.25,
            damage_per_tick: 3.0,
            length: 14.0,
            thickness: 1.0,
            recovery: 1.0,
        }
    }
}

/// Movement-closing charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeConfig {
    /// Telegraph before the charge.
    pub telegraph: f32,
    /// Charge speed.
    pub speed: f32,
    /// Longest a charge may last before it stops by itself.
    pub max_duration: f32,
    /// Damage on player contact.
    pub damage: f32,
    /// Knockback on player contact.
    pub knockback: f32,
    /// Recovery after the charge stops.
    pub recovery: f32,
}

impl Default for ChargeConfig {
    fn default() -> Self {
        Self {
            telegraph: 0.7,
            speed: 14.0,
            max_duration: 1.2,
            damage: 14.0,
            knockback: 14.0,
            recovery: 1.0,
        }
    }
}

/// Tuning for a multi-attack boss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    /// Shared enemy tuning (ranges, speeds, health).
    pub enemy: EnemyConfig,
    /// Upper bound of the mid-range bucket.
    pub mid_range: f32,
    /// Selector weights.
    pub weights: BossWeights,
    /// Velocity multiplier applied during telegraphs.
    pub telegraph_slowdown: f32,
    /// Close-range swipe.
    pub slash: AttackProfile,
    /// Close-range lunge.
    pub lunge: AttackProfile,
    /// Lunge speed.
    pub lunge_speed: f32,
    /// Area slam around the boss.
    pub slam: AttackProfile,
    /// Directional gaze.
    pub gaze: GazeConfig,
    /// Channelled beam.
    pub beam: BeamConfig,
    /// Charge.
    pub charge: ChargeConfig,
    /// Health fraction that triggers the armor phase.
    pub armor_threshold: f32,
    /// Damage multiplier while armored.
    pub armor_multiplier: f32,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            enemy: EnemyConfig {
                max_health: 300.0,
                half_extents: Vec2::new(1.0, 1.5),
                detection_range: 18.0,
                lose_range: 30.0,
                patrol_distance: 6.0,
                chase_speed: 3.0,
                melee_range: 2.5,
                attack_cooldown: 1.5,
                staggers: false,
                ..EnemyConfig::default()
            },
            mid_range: 7.0,
            weights: BossWeights::default(),
            telegraph_slowdown: 0.2,
            slash: AttackProfile {
                damage: 15.0,
                knockback: 10.0,
                telegraph: Some(0.6),
                hit_offset: 0.6,
                recovery: 0.7,
                shape: HitShape::rect(3.0, 2.0),
                origin: Some(Vec2::new(1.8, 0.0)),
            },
            lunge: AttackProfile {
                damage: 12.0,
                knockback: 12.0,
                telegraph: Some(0.5),
                hit_offset: 0.5,
                recovery: 0.9,
                shape: HitShape::rect(2.5, 2.0),
                origin: Some(Vec2::new(1.5, 0.0)),
            },
            lunge_speed: 10.0,
            slam: AttackProfile {
                damage: 18.0,
                knockback: 14.0,
                telegraph: Some(0.9),
                hit_offset: 0.9,
                recovery: 1.1,
                shape: HitShape::circle(4.0),
                origin: Some(Vec2::new(0.0, -1.0)),
            },
            gaze: GazeConfig::default(),
            beam: BeamConfig::default(),
            charge: ChargeConfig::default(),
            armor_threshold: 0.5,
            armor_multiplier: 0.5,
        }
    }
}

impl BossConfig {
    /// Validate buckets, weights and attack timings.
    pub fn validate(&self) -> CombatResult<()> {
        self.enemy.validate()?;
        if self.mid_range <= self.enemy.melee_range {
            return Err(CombatError::invalid(
                "boss.mid_range",
                "must exceed enemy.melee_range",
            ));
        }
        if !(0.0..=1.0).contains(&self.armor_threshold) {
            return Err(CombatError::invalid("boss.armor_threshold", "must be in [0, 1]"));
        }
        if self.beam.ticks == 0 {
            return Err(CombatError::invalid("boss.beam.ticks", "must be at least 1"));
        }
        if self.gaze.dodge_window > self.gaze.telegraph {
            return Err(CombatError::invalid(
                "boss.gaze.dodge_window",
                "must fit inside the telegraph",
            ));
        }
        self.weights.validate()?;
        self.slash.validate("boss.slash")?;
        self.lunge.validate("boss.lunge")?;
        self.slam.validate("boss.slam")
    }
}

/// Tuning for the player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Starting and maximum health.
    pub max_health: f32,
    /// Body half-extents.
    pub half_extents: Vec2,
    /// Horizontal run speed.
    pub move_speed: f32,
    /// Vertical speed while climbing.
    pub climb_speed: f32,
    /// Nail damage per hit.
    pub attack_damage: f32,
    /// Knockback dealt by nail hits.
    pub attack_knockback: f32,
    /// Side attack hitbox.
    pub side_hitbox: HitShape,
    /// Side attack origin offset (x mirrors with facing).
    pub side_offset: Vec2,
    /// Up attack hitbox.
    pub up_hitbox: HitShape,
    /// Up attack origin offset.
    pub up_offset: Vec2,
    /// Down attack hitbox.
    pub down_hitbox: HitShape,
    /// Down attack origin offset.
    pub down_offset: Vec2,
    /// Spell windup before release.
    pub cast_windup: f32,
    /// Spell recovery after release.
    pub cast_recovery: f32,
    /// Spell damage.
    pub cast_damage: f32,
    /// Spell hit geometry.
    pub cast_shape: HitShape,
    /// Spell origin offset.
    pub cast_offset: Vec2,
    /// Dash speed.
    pub dash_speed: f32,
    /// Dash duration.
    pub dash_duration: f32,
    /// Invincibility after taking damage.
    pub hurt_invincibility: f32,
    /// Simulation steps of horizontal recoil.
    pub recoil_steps_x: u32,
    /// Simulation steps of vertical recoil.
    pub recoil_steps_y: u32,
    /// Horizontal recoil speed.
    pub recoil_speed_x: f32,
    /// Vertical recoil speed.
    pub recoil_speed_y: f32,
    /// Mana granted per landed nail hit.
    pub mana_per_hit: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 50.0,
            half_extents: Vec2::new(0.4, 0.8),
            move_speed: 8.0,
            climb_speed: 4.0,
            attack_damage: 10.0,
            attack_knockback: 6.0,
            side_hitbox: HitShape::rect(2.0, 1.2),
            side_offset: Vec2::new(1.2, 0.0),
            up_hitbox: HitShape::rect(1.4, 2.0),
            up_offset: Vec2::new(0.0, 1.5),
            down_hitbox: HitShape::rect(1.4, 2.0),
            down_offset: Vec2::new(0.0, -1.5),
            cast_windup: 0.25,
            cast_recovery: 0.3,
            cast_damage: 15.0,
            cast_shape: HitShape::rect(6.0, 1.0),
            cast_offset: Vec2::new(3.4, 0.0),
            dash_speed: 20.0,
            dash_duration: 0.2,
            hurt_invincibility: 1.0,
            recoil_steps_x: 6,
            recoil_steps_y: 4,
            recoil_speed_x: 12.0,
            recoil_speed_y: 10.0,
            mana_per_hit: 11.0,
        }
    }
}

impl PlayerConfig {
    /// Validate timings and speeds.
    pub fn validate(&self) -> CombatResult<()> {
        if self.max_health <= 0.0 {
            return Err(CombatError::invalid("player.max_health", "must be positive"));
        }
        if self.dash_duration <= 0.0 {
            return Err(CombatError::invalid("player.dash_duration", "must be positive"));
        }
        if self.cast_windup < 0.0 || self.cast_recovery < 0.0 {
            return Err(CombatError::invalid("player.cast", "timings must be non-negative"));
        }
        Ok(())
    }
}

/// Tuning for the parry/counter mechanic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParryConfig {
    /// Length of the parry sub-window, anchored to the telegraph's close.
    pub parry_window: f32,
    /// Furthest an attacker may be from the defender and still be parried.
    pub max_distance: f32,
    /// Invincibility granted to a successful defender.
    pub invincibility: f32,
    /// Global time scale during the parry flourish.
    pub slow_motion_scale: f32,
    /// Real-time length of the slow motion.
    pub slow_motion_duration: f32,
    /// Counter-hit damage as a multiple of the defender's attack damage.
    pub counter_damage_multiplier: f32,
    /// Knockback of the counter-hit.
    pub counter_knockback: f32,
    /// How long a parried attacker stays disabled.
    pub stun_duration: f32,
}

impl Default for ParryConfig {
    fn default() -> Self {
        Self {
            parry_window: 0.15,
            max_distance: 6.0,
            invincibility: 0.6,
            slow_motion_scale: 0.25,
            slow_motion_duration: 0.3,
            counter_damage_multiplier: 2.5,
            counter_knockback: 12.0,
            stun_duration: 1.5,
        }
    }
}

impl ParryConfig {
    /// Validate window and time scale.
    pub fn validate(&self) -> CombatResult<()> {
        if self.parry_window <= 0.0 {
            return Err(CombatError::invalid("parry.parry_window", "must be positive"));
        }
        if !(self.slow_motion_scale > 0.0 && self.slow_motion_scale <= 1.0) {
            return Err(CombatError::invalid(
                "parry.slow_motion_scale",
                "must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

/// World-wide constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seconds a dead actor lingers before removal.
    pub despawn_delay: f32,
    /// Lower bound on the upward component of knockback directions.
    pub min_upward_bias: f32,
    /// Seed for the selector RNG.
    pub seed: u64,
    /// Event bus capacity.
    pub event_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            despawn_delay: 2.0,
            min_upward_bias: MIN_UPWARD_BIAS,
            seed: 0x5EED,
            event_capacity: 1024,
        }
    }
}

/// Complete tuning document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// World-wide constants.
    pub world: WorldConfig,
    /// Parry tuning.
    pub parry: ParryConfig,
    /// Player tuning.
    pub player: PlayerConfig,
    /// Default enemy tuning.
    pub enemy: EnemyConfig,
    /// Default boss tuning.
    pub boss: BossConfig,
}

impl CombatConfig {
    /// Validate every section.
    pub fn validate(&self) -> CombatResult<()> {
        if self.world.despawn_delay < 0.0 {
            return Err(CombatError::invalid("world.despawn_delay", "must be non-negative"));
        }
        if !(0.0..1.0).contains(&self.world.min_upward_bias) {
            return Err(CombatError::invalid("world.min_upward_bias", "must be in [0, 1)"));
        }
        if self.world.event_capacity == 0 {
            return Err(CombatError::invalid("world.event_capacity", "must be positive"));
        }
        self.parry.validate()?;
        self.player.validate()?;
        self.enemy.validate()?;
        self.boss.validate()
    }
}
