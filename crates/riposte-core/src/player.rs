//! Player combat controller.
//!
//! The player holds at most one action lock at a time. Attacks are keyed by
//! presentation: the swing starts on request, the hit query runs when the
//! animation reports its hit frame, and the lock is released on the
//! animation's end. Casts and dashes run as timed tasks.

use glam::Vec2;
use riposte_common::{CombatError, CombatResult, Facing, TaskHandle};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PlayerConfig;
use crate::status::StatusEffects;

/// Direction of a nail swing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    /// Horizontal swing along facing
    Side,
    /// Overhead swing
    Up,
    /// Downward swing (airborne only)
    Down,
}

impl AttackKind {
    /// Picks the swing for a movement axis at request time.
    #[must_use]
    pub fn choose(axis: Vec2, grounded: bool) -> Self {
        if axis.y > 0.5 {
            Self::Up
        } else if axis.y < -0.5 && !grounded {
            Self::Down
        } else {
            Self::Side
        }
    }
}

/// Exclusive action lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerLock {
    /// No action in progress
    #[default]
    Free,
    /// Nail swing
    Attack(AttackKind),
    /// Spell cast
    Cast,
    /// Dash
    Dash,
    /// Holding a climbable surface
    Climb,
}

impl PlayerLock {
    /// Lock name for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Attack(_) => "attack",
            Self::Cast => "cast",
            Self::Dash => "dash",
            Self::Climb => "climb",
        }
    }
}

/// Player input events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlayerInput {
    /// Movement axis, each component in [-1, 1]
    Move(Vec2),
    /// Nail attack
    Attack,
    /// Spell cast
    Cast,
    /// Dash
    Dash,
    /// Grab (`true`) or release (`false`) a climbable surface
    Climb(bool),
    /// Jump; forwarded to physics and presentation
    Jump,
    /// Counter (parry attempt)
    Counter,
    /// Presentation reached the swing's hit frame
    AttackHitFrame,
    /// Presentation finished the swing
    AttackEnd,
}

/// Counter capability of an actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterState {
    /// World time of the last counter input
    pub last_counter: Option<f64>,
}

impl CounterState {
    /// Checks if the last counter falls inside `[from, to]`.
    #[must_use]
    pub fn countered_within(&self, from: f64, to: f64) -> bool {
        self.last_counter.is_some_and(|t| t >= from && t <= to)
    }
}

/// Forced velocity after hits, counted in simulation steps per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionalRecoil {
    steps_x: u32,
    steps_y: u32,
    dir_x: f32,
    dir_y: f32,
}

impl DirectionalRecoil {
    /// Starts horizontal recoil toward `dir` (its sign is used).
    pub fn start_x(&mut self, dir: f32, steps: u32) {
        self.dir_x = if dir < 0.0 { -1.0 } else { 1.0 };
        self.steps_x = steps;
    }

    /// Starts vertical recoil toward `dir` (its sign is used).
    pub fn start_y(&mut self, dir: f32, steps: u32) {
        self.dir_y = if dir < 0.0 { -1.0 } else { 1.0 };
        self.steps_y = steps;
    }

    /// Checks if either axis is still recoiling.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.steps_x > 0 || self.steps_y > 0
    }

    /// Remaining steps as `(x, y)`.
    #[must_use]
    pub const fn steps(&self) -> (u32, u32) {
        (self.steps_x, self.steps_y)
    }

    /// Drops vertical recoil.
    pub fn clear_vertical(&mut self) {
        self.steps_y = 0;
    }

    /// Forces velocity on each recoiling axis and consumes one step.
    ///
    /// Ground contact ends vertical recoil early.
    pub fn step(&mut self, velocity: &mut Vec2, speed: Vec2, grounded: bool) {
        if grounded {
            self.clear_vertical();
        }
        if self.steps_x > 0 {
            velocity.x = self.dir_x * speed.x;
            self.steps_x -= 1;
        }
        if self.steps_y > 0 {
            velocity.y = self.dir_y * speed.y;
            self.steps_y -= 1;
        }
    }
}

/// Player-side combat state.
#[derive(Debug, Clone)]
pub struct PlayerController {
    config: PlayerConfig,
    lock: PlayerLock,
    axis: Vec2,
    hit_frame_done: bool,
    task: Option<TaskHandle>,
    recoil: DirectionalRecoil,
    counter: CounterState,
    mana: f32,
}

impl PlayerController {
    /// Creates a controller.
    #[must_use]
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            config,
            lock: PlayerLock::Free,
            axis: Vec2::ZERO,
            hit_frame_done: false,
            task: None,
            recoil: DirectionalRecoil::default(),
            counter: CounterState::default(),
            mana: 0.0,
        }
    }

    /// Player tuning.
    #[must_use]
    pub const fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Current lock.
    #[must_use]
    pub const fn lock(&self) -> PlayerLock {
        self.lock
    }

    /// Last movement axis.
    #[must_use]
    pub const fn axis(&self) -> Vec2 {
        self.axis
    }

    /// Directional recoil.
    #[must_use]
    pub const fn recoil(&self) -> &DirectionalRecoil {
        &self.recoil
    }

    /// Counter capability.
    #[must_use]
    pub const fn counter_state(&self) -> CounterState {
        self.counter
    }

    /// Mana collected from landed hits.
    #[must_use]
    pub const fn mana(&self) -> f32 {
        self.mana
    }

    /// Task backing the current lock, if any.
    #[must_use]
    pub const fn task(&self) -> Option<TaskHandle> {
        self.task
    }

    /// Records the task backing the current lock.
    pub fn set_task(&mut self, handle: TaskHandle) {
        self.task = Some(handle);
    }

    /// Clears the task handle if it matches a finished task.
    pub fn task_finished(&mut self, handle: TaskHandle) {
        if self.task == Some(handle) {
            self.task = None;
        }
    }

    /// Stores the movement axis, clamped to the unit square.
    pub fn set_axis(&mut self, axis: Vec2) {
        self.axis = axis.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    fn acquire(
        &mut self,
        lock: PlayerLock,
        recoiling: bool,
        status: &StatusEffects,
        needs_focus: bool,
    ) -> CombatResult<()> {
        if self.lock != PlayerLock::Free {
            return Err(CombatError::LockBusy(self.lock.name()));
        }
        if recoiling {
            return Err(CombatError::LockBusy("recoil"));
        }
        if status.is_frozen() {
            return Err(CombatError::LockBusy("frozen"));
        }
        if needs_focus && status.is_confused() {
            return Err(CombatError::LockBusy("confused"));
        }
        debug!(lock = lock.name(), "player lock acquired");
        self.lock = lock;
        Ok(())
    }

    /// Starts a nail swing. The kind is chosen from the current axis.
    pub fn request_attack(
        &mut self,
        grounded: bool,
        recoiling: bool,
        status: &StatusEffects,
    ) -> CombatResult<AttackKind> {
        let kind = AttackKind::choose(self.axis, grounded);
        self.acquire(PlayerLock::Attack(kind), recoiling, status, true)?;
        self.hit_frame_done = false;
        Ok(kind)
    }

    /// Starts a spell cast.
    pub fn request_cast(&mut self, recoiling: bool, status: &StatusEffects) -> CombatResult<()> {
        self.acquire(PlayerLock::Cast, recoiling, status, true)
    }

    /// Starts a dash.
    pub fn request_dash(&mut self, recoiling: bool, status: &StatusEffects) -> CombatResult<()> {
        self.acquire(PlayerLock::Dash, recoiling, status, false)
    }

    /// Grabs or releases a climbable surface.
    pub fn set_climb(
        &mut self,
        climb: bool,
        recoiling: bool,
        status: &StatusEffects,
    ) -> CombatResult<()> {
        if climb {
            self.acquire(PlayerLock::Climb, recoiling, status, false)
        } else {
            if self.lock == PlayerLock::Climb {
                self.lock = PlayerLock::Free;
            }
            Ok(())
        }
    }

    /// Consumes the swing's hit frame. Only the first call per swing returns a kind.
    pub fn take_hit_frame(&mut self) -> Option<AttackKind> {
        match self.lock {
            PlayerLock::Attack(kind) if !self.hit_frame_done => {
                self.hit_frame_done = true;
                Some(kind)
            },
            _ => None,
        }
    }

    /// Ends the swing. Returns `false` if no swing was in progress.
    pub fn end_attack(&mut self) -> bool {
        if matches!(self.lock, PlayerLock::Attack(_)) {
            self.lock = PlayerLock::Free;
            true
        } else {
            false
        }
    }

    /// Releases a task-backed lock (cast or dash).
    pub fn release(&mut self) {
        if matches!(self.lock, PlayerLock::Cast | PlayerLock::Dash) {
            self.lock = PlayerLock::Free;
        }
        self.task = None;
    }

    /// Drops any attack, cast or dash lock. Returns the task to cancel.
    pub fn interrupt(&mut self) -> Option<TaskHandle> {
        if matches!(
            self.lock,
            PlayerLock::Attack(_) | PlayerLock::Cast | PlayerLock::Dash
        ) {
            self.lock = PlayerLock::Free;
        }
        self.task.take()
    }

    /// Took a hit: interrupt and recoil toward `away_x`.
    pub fn hurt(&mut self, away_x: f32) -> Option<TaskHandle> {
        self.recoil.start_x(away_x, self.config.recoil_steps_x);
        self.interrupt()
    }

    /// Stamps a counter input.
    pub fn counter(&mut self, now: f64) {
        self.counter.last_counter = Some(now);
    }

    /// A swing landed. Applies hit recoil and returns the mana gained.
    pub fn on_landed_hit(&mut self, kind: AttackKind, facing: Facing) -> f32 {
        match kind {
            AttackKind::Side => self.recoil.start_x(-facing.sign(), self.config.recoil_steps_x),
            AttackKind::Down => self.recoil.start_y(1.0, self.config.recoil_steps_y),
            AttackKind::Up => {},
        }
        self.mana += self.config.mana_per_hit;
        self.config.mana_per_hit
    }

    /// Applies movement rules to the body for one simulation step.
    pub fn steer(
        &mut self,
        velocity: &mut Vec2,
        facing: &mut Facing,
        grounded: bool,
        status: &StatusEffects,
    ) {
        if self.recoil.is_active() {
            let speed = Vec2::new(self.config.recoil_speed_x, self.config.recoil_speed_y);
            self.recoil.step(velocity, speed, grounded);
            return;
        }
        if status.is_confused() {
            velocity.x = 0.0;
            return;
        }

        match self.lock {
            PlayerLock::Free => {
                velocity.x = self.axis.x * self.config.move_speed;
                if self.axis.x > 0.0 {
                    *facing = Facing::Right;
                } else if self.axis.x < 0.0 {
                    *facing = Facing::Left;
                }
            },
            PlayerLock::Climb => {
                velocity.x = 0.0;
                velocity.y = self.axis.y * self.config.climb_speed;
            },
            PlayerLock::Attack(_) | PlayerLock::Cast => velocity.x = 0.0,
            PlayerLock::Dash => {},
        }
    }
}
