//! Generic enemy state machine.
//!
//! One machine drives every enemy archetype. [`EnemyConfig`] supplies the
//! ranges and timings, and [`EnemyPattern`] decides how Chase picks an attack.
//!
//! The brain is pure decision logic: it reads an [`EnemySense`] snapshot and
//! returns an [`EnemyTick`]. The world applies the result, schedules attack
//! timelines and calls the forced entry points (`enter_hurt`, `stun`, ...)
//! when combat interrupts the machine.

use glam::Vec2;
use riposte_common::{ActorId, Facing, TaskHandle};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::boss::{BossAttack, BossBrain};
use crate::config::{BossConfig, EnemyConfig};

/// Distance from spawn that counts as "back home".
const HOME_TOLERANCE: f32 = 0.1;

/// Enemy states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyState {
    /// Standing still
    Idle,
    /// Walking around the spawn point
    Patrol,
    /// Steering toward the target
    Chase,
    /// Running a melee (or boss) attack timeline
    Attack,
    /// Running a spell timeline
    CastSpell,
    /// Walking back to spawn
    ReturnToStart,
    /// Recoiling from a hit
    Hurt,
    /// Disabled by a parry
    Stunned,
    /// Terminal
    Dead,
}

impl EnemyState {
    /// Checks if the state is backed by a timed task.
    #[must_use]
    pub const fn is_task_backed(self) -> bool {
        matches!(self, Self::Attack | Self::CastSpell)
    }
}

/// How Chase picks an attack.
#[derive(Debug, Clone)]
pub enum EnemyPattern {
    /// Melee in range, spell at cast range
    Standard,
    /// Distance-bucketed boss selector
    Boss(Box<BossBrain>),
}

/// Time since each attack was last used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cooldowns {
    /// Seconds since the last melee attack
    pub attack: f32,
    /// Seconds since the last spell
    pub cast: f32,
}

/// What the enemy perceives this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemySense {
    /// Own position
    pub position: Vec2,
    /// Own facing
    pub facing: Facing,
    /// Target position, `None` if the target is missing or dead
    pub target: Option<Vec2>,
    /// Confused status
    pub confused: bool,
    /// Hit recoil running
    pub recoiling: bool,
}

/// Attack the world should start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyCommand {
    /// Melee timeline
    Attack,
    /// Spell timeline
    CastSpell,
    /// Boss attack timeline
    Boss(BossAttack),
}

/// Result of one brain update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyTick {
    /// New horizontal velocity; `None` leaves it alone.
    pub velocity_x: Option<f32>,
    /// Facing after the update
    pub facing: Facing,
    /// Attack to start
    pub command: Option<EnemyCommand>,
    /// State transition that happened, as `(from, to)`
    pub transition: Option<(EnemyState, EnemyState)>,
}

/// Decision state of one enemy.
#[derive(Debug, Clone)]
pub struct EnemyBrain {
    config: EnemyConfig,
    pattern: EnemyPattern,
    state: EnemyState,
    state_timer: f32,
    cooldowns: Cooldowns,
    flip_timer: f32,
    spawn: Vec2,
    target: Option<ActorId>,
    task: Option<TaskHandle>,
    stun_timer: f32,
}

impl EnemyBrain {
    /// Standard enemy spawned at `spawn`.
    #[must_use]
    pub fn standard(config: EnemyConfig, spawn: Vec2) -> Self {
        Self::with_pattern(config, EnemyPattern::Standard, spawn)
    }

    /// Boss spawned at `spawn`.
    #[must_use]
    pub fn for_boss(config: BossConfig, spawn: Vec2) -> Self {
        let enemy = config.enemy.clone();
        Self::with_pattern(enemy, EnemyPattern::Boss(Box::new(BossBrain::new(config))), spawn)
    }

    fn with_pattern(config: EnemyConfig, pattern: EnemyPattern, spawn: Vec2) -> Self {
        Self {
            // Fresh spawns may transition on their first tick
            state_timer: config.state_change_cooldown,
            cooldowns: Cooldowns {
                attack: config.attack_cooldown,
                cast: config.cast_cooldown,
            },
            flip_timer: config.flip_cooldown,
            config,
            pattern,
            state: EnemyState::Patrol,
            spawn,
            target: None,
            task: None,
            stun_timer: 0.0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> EnemyState {
        self.state
    }

    /// Seconds since the last transition.
    #[must_use]
    pub const fn state_timer(&self) -> f32 {
        self.state_timer
    }

    /// Enemy tuning.
    #[must_use]
    pub const fn config(&self) -> &EnemyConfig {
        &self.config
    }

    /// Attack pattern.
    #[must_use]
    pub const fn pattern(&self) -> &EnemyPattern {
        &self.pattern
    }

    /// Boss brain, if this enemy is a boss.
    #[must_use]
    pub fn boss(&self) -> Option<&BossBrain> {
        match &self.pattern {
            EnemyPattern::Boss(boss) => Some(boss.as_ref()),
            EnemyPattern::Standard => None,
        }
    }

    /// Mutable boss brain, if this enemy is a boss.
    pub fn boss_mut(&mut self) -> Option<&mut BossBrain> {
        match &mut self.pattern {
            EnemyPattern::Boss(boss) => Some(boss.as_mut()),
            EnemyPattern::Standard => None,
        }
    }

    /// Attack cooldown timers.
    #[must_use]
    pub const fn cooldowns(&self) -> &Cooldowns {
        &self.cooldowns
    }

    /// Mutable attack cooldown timers.
    pub fn cooldowns_mut(&mut self) -> &mut Cooldowns {
        &mut self.cooldowns
    }

    /// Spawn point.
    #[must_use]
    pub const fn spawn(&self) -> Vec2 {
        self.spawn
    }

    /// Current target reference.
    #[must_use]
    pub const fn target(&self) -> Option<ActorId> {
        self.target
    }

    /// Sets the target reference.
    pub fn set_target(&mut self, target: Option<ActorId>) {
        self.target = target;
    }

    /// Task running the current attack, if any.
    #[must_use]
    pub const fn task(&self) -> Option<TaskHandle> {
        self.task
    }

    /// Records the task running the current attack.
    pub fn set_task(&mut self, handle: TaskHandle) {
        self.task = Some(handle);
    }

    /// Takes the current task handle so the caller can cancel it.
    pub fn take_task(&mut self) -> Option<TaskHandle> {
        self.task.take()
    }

    /// Clears the task handle if it matches a finished task.
    pub fn task_finished(&mut self, handle: TaskHandle) {
        if self.task == Some(handle) {
            self.task = None;
        }
    }

    fn dwell_elapsed(&self) -> bool {
        self.state_timer >= self.config.state_change_cooldown
    }

    fn set_state(&mut self, to: EnemyState) -> Option<(EnemyState, EnemyState)> {
        let from = self.state;
        if from == to {
            return None;
        }
        self.state = to;
        self.state_timer = 0.0;
        debug!(?from, ?to, "enemy state changed");
        Some((from, to))
    }

    /// AI-driven transition, gated by the minimum dwell.
    fn try_transition(&mut self, to: EnemyState) -> Option<(EnemyState, EnemyState)> {
        if self.dwell_elapsed() {
            self.set_state(to)
        } else {
            None
        }
    }

    /// Advances the machine by `dt`.
    pub fn update(&mut self, sense: &EnemySense, dt: f32, rng: &mut fastrand::Rng) -> EnemyTick {
        self.state_timer += dt;
        self.cooldowns.attack += dt;
        self.cooldowns.cast += dt;
        self.flip_timer += dt;

        let mut tick = EnemyTick {
            velocity_x: None,
            facing: sense.facing,
            command: None,
            transition: None,
        };

        match self.state {
            EnemyState::Dead | EnemyState::Attack | EnemyState::CastSpell => return tick,
            EnemyState::Hurt => {
                if !sense.recoiling {
                    tick.transition = self.set_state(EnemyState::Idle);
                    tick.velocity_x = Some(0.0);
                }
                return tick;
            },
            EnemyState::Stunned => {
                self.stun_timer -= dt;
                tick.velocity_x = Some(0.0);
                if self.stun_timer <= 0.0 {
                    tick.transition = self.set_state(EnemyState::Idle);
                }
                return tick;
            },
            _ => {},
        }

        if sense.confused {
            // Vertical-only movement, state held until the status expires
            tick.velocity_x = Some(0.0);
            return tick;
        }
        if sense.recoiling {
            return tick;
        }

        let detected = sense
            .target
            .is_some_and(|t| (t.x - sense.position.x).abs() <= self.config.detection_range);

        match self.state {
            EnemyState::Idle => {
                tick.velocity_x = Some(0.0);
                if detected {
                    tick.transition = self.try_transition(EnemyState::Chase);
                } else if self.state_timer >= self.config.idle_dwell {
                    tick.transition = self.try_transition(EnemyState::Patrol);
                }
            },
            EnemyState::Patrol => {
                if detected {
                    tick.transition = self.try_transition(EnemyState::Chase);
                }
                if tick.transition.is_some() {
                    tick.velocity_x = Some(0.0);
                } else {
                    self.patrol(sense, &mut tick);
                }
            },
            EnemyState::ReturnToStart => {
                let dx = self.spawn.x - sense.position.x;
                if detected {
                    tick.transition = self.try_transition(EnemyState::Chase);
                } else if dx.abs() <= HOME_TOLERANCE {
                    tick.transition = self.try_transition(EnemyState::Patrol);
                }
                if tick.transition.is_some() {
                    tick.velocity_x = Some(0.0);
                } else {
                    tick.facing = sense.facing.toward(sense.position, self.spawn);
                    tick.velocity_x = Some(dx.signum() * self.config.patrol_speed);
                }
            },
            EnemyState::Chase => self.chase(sense, rng, &mut tick),
            _ => {},
        }

        tick
    }

    fn patrol(&mut self, sense: &EnemySense, tick: &mut EnemyTick) {
        let offset = sense.position.x - self.spawn.x;
        let mut facing = sense.facing;
        let past_bound = (facing == Facing::Right && offset >= self.config.patrol_distance)
            || (facing == Facing::Left && offset <= -self.config.patrol_distance);
        if past_bound && self.flip_timer >= self.config.flip_cooldown {
            facing = facing.flipped();
            self.flip_timer = 0.0;
        }
        tick.facing = facing;
        tick.velocity_x = Some(facing.sign() * self.config.patrol_speed);
    }

    fn chase(&mut self, sense: &EnemySense, rng: &mut fastrand::Rng, tick: &mut EnemyTick) {
        let Some(target) = sense.target else {
            // Target lost
            tick.transition = self.set_state(EnemyState::Patrol);
            tick.velocity_x = Some(0.0);
            return;
        };

        let dx = target.x - sense.position.x;
        let distance = dx.abs();
        tick.facing = sense.facing.toward(sense.position, target);

        if distance > self.config.lose_range {
            let from_spawn = (sense.position.x - self.spawn.x).abs();
            let to = if from_spawn > self.config.patrol_distance / 2.0 {
                EnemyState::ReturnToStart
            } else {
                EnemyState::Patrol
            };
            tick.transition = self.try_transition(to);
            if tick.transition.is_some() {
                tick.velocity_x = Some(0.0);
                return;
            }
        }

        if let Some(to) = self.ready_attack(distance) {
            if let Some(transition) = self.try_transition(to) {
                let command = match (&mut self.pattern, to) {
                    (EnemyPattern::Boss(boss), _) => EnemyCommand::Boss(boss.select(distance, rng)),
                    (EnemyPattern::Standard, EnemyState::CastSpell) => EnemyCommand::CastSpell,
                    (EnemyPattern::Standard, _) => EnemyCommand::Attack,
                };
                if to == EnemyState::CastSpell {
                    self.cooldowns.cast = 0.0;
                } else {
                    self.cooldowns.attack = 0.0;
                }
                tick.transition = Some(transition);
                tick.command = Some(command);
                // Bosses carry their momentum into the slowed windup
                tick.velocity_x = matches!(self.pattern, EnemyPattern::Standard).then_some(0.0);
                return;
            }
        }

        if distance <= self.config.melee_range {
            tick.velocity_x = Some(0.0);
        } else {
            tick.velocity_x = Some(dx.signum() * self.config.chase_speed);
        }
    }

    /// State of the attack that is ready at `distance`, if any.
    fn ready_attack(&self, distance: f32) -> Option<EnemyState> {
        let attack_ready = self.cooldowns.attack >= self.config.attack_cooldown;
        if matches!(self.pattern, EnemyPattern::Boss(_)) || distance <= self.config.melee_range {
            return attack_ready.then_some(EnemyState::Attack);
        }
        let cast_ready = self.cooldowns.cast >= self.config.cast_cooldown;
        (self.config.spell.is_some() && distance <= self.config.cast_range && cast_ready)
            .then_some(EnemyState::CastSpell)
    }

    /// Forced: a hit landed. Returns the transition if the enemy staggers.
    ///
    /// A stunned enemy stays stunned until its stun timer runs out.
    pub fn enter_hurt(&mut self) -> Option<(EnemyState, EnemyState)> {
        if matches!(self.state, EnemyState::Dead | EnemyState::Stunned) || !self.config.staggers {
            return None;
        }
        self.finish_boss_attack();
        self.set_state(EnemyState::Hurt)
    }

    /// Forced: health reached zero.
    pub fn enter_dead(&mut self) -> Option<(EnemyState, EnemyState)> {
        self.task = None;
        self.finish_boss_attack();
        self.set_state(EnemyState::Dead)
    }

    /// Forced: parried. Disables the enemy for `duration`.
    pub fn stun(&mut self, duration: f32) -> Option<(EnemyState, EnemyState)> {
        if self.state == EnemyState::Dead {
            return None;
        }
        self.stun_timer = duration;
        self.task = None;
        self.finish_boss_attack();
        let transition = self.set_state(EnemyState::Stunned);
        // Re-stun while stunned restarts the timer
        self.state_timer = 0.0;
        transition
    }

    /// Forced: reinitialize after a status hook cancelled the running task.
    pub fn reset_to_idle(&mut self) -> Option<(EnemyState, EnemyState)> {
        if self.state == EnemyState::Dead {
            return None;
        }
        self.task = None;
        self.finish_boss_attack();
        self.set_state(EnemyState::Idle)
    }

    /// The attack timeline completed.
    pub fn finish_attack(&mut self) -> Option<(EnemyState, EnemyState)> {
        self.task = None;
        self.finish_boss_attack();
        if self.state.is_task_backed() {
            self.set_state(EnemyState::Idle)
        } else {
            None
        }
    }

    fn finish_boss_attack(&mut self) {
        if let EnemyPattern::Boss(boss) = &mut self.pattern {
            boss.finish();
        }
    }
}
