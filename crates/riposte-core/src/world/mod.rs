//! Combat world: actor registry and the per-tick simulation driver.
//!
//! One [`CombatWorld::tick`] runs the whole combat step in a fixed order:
//!
//! 1. advance the slow-motion aware clock
//! 2. tick status effects and run their expiry hooks
//! 3. refresh ground contact from physics
//! 4. apply queued player input
//! 5. steer the player and update enemy brains
//! 6. integrate bodies through the physics collaborator
//! 7. watch running charges for walls and contact
//! 8. advance timed tasks and dispatch their actions
//! 9. expire telegraphs and despawn the dead
//!
//! Everything that happens is published on the [`EventBus`].

mod dispatch;

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;
use riposte_common::{ActorId, CombatError, CombatResult, HitShape, IdAllocator};
use tracing::{debug, info, warn};

use crate::actor::{Actor, Faction, Role};
use crate::clock::SimClock;
use crate::config::{BossConfig, CombatConfig, EnemyConfig};
use crate::enemy::{EnemyBrain, EnemyCommand, EnemySense, EnemyState};
use crate::events::{CombatEvent, EventBus};
use crate::hit::{apply_damage, apply_knockback, query_hit, DamageOutcome, TargetFilter};
use crate::parry::TelegraphRegistry;
use crate::physics::{Motion, PhysicsQuery};
use crate::player::{PlayerController, PlayerInput};
use crate::scheduler::Scheduler;
use crate::status::{FreezeSnapshot, StatusExpiry, StatusKind};
use crate::timeline::{self, CombatAction, Strike};

/// Per-tick collaborators.
pub struct TickContext<'a> {
    /// Level geometry and body integration
    pub physics: &'a dyn PhysicsQuery,
    /// Paused ticks do nothing
    pub paused: bool,
}

impl<'a> TickContext<'a> {
    /// Running context over `physics`.
    #[must_use]
    pub fn new(physics: &'a dyn PhysicsQuery) -> Self {
        Self {
            physics,
            paused: false,
        }
    }

    /// Sets the pause flag.
    #[must_use]
    pub const fn paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }
}

/// The combat simulation.
pub struct CombatWorld {
    config: CombatConfig,
    actors: BTreeMap<ActorId, Actor>,
    ids: IdAllocator,
    player: Option<ActorId>,
    scheduler: Scheduler<CombatAction>,
    telegraphs: TelegraphRegistry,
    clock: SimClock,
    rng: fastrand::Rng,
    events: EventBus,
    input: VecDeque<PlayerInput>,
}

impl CombatWorld {
    /// Creates an empty world. Fails if the configuration is invalid.
    pub fn new(config: CombatConfig) -> CombatResult<Self> {
        config.validate()?;
        info!(seed = config.world.seed, "combat world created");
        Ok(Self {
            events: EventBus::new(config.world.event_capacity),
            rng: fastrand::Rng::with_seed(config.world.seed),
            config,
            actors: BTreeMap::new(),
            ids: IdAllocator::default(),
            player: None,
            scheduler: Scheduler::new(),
            telegraphs: TelegraphRegistry::new(),
            clock: SimClock::new(),
            input: VecDeque::new(),
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// World time in game seconds.
    #[must_use]
    pub const fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Current time scale (below 1 during slow motion).
    #[must_use]
    pub fn time_scale(&self) -> f32 {
        self.clock.time_scale()
    }

    /// Looks up an actor.
    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Looks up an actor mutably.
    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    /// Every actor, in spawn order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// The player actor, while it exists.
    #[must_use]
    pub const fn player_id(&self) -> Option<ActorId> {
        self.player
    }

    /// State of an enemy.
    #[must_use]
    pub fn enemy_state(&self, id: ActorId) -> Option<EnemyState> {
        self.actors.get(&id).and_then(Actor::as_enemy).map(EnemyBrain::state)
    }

    /// Timed tasks.
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler<CombatAction> {
        &self.scheduler
    }

    /// Live telegraphs.
    #[must_use]
    pub const fn telegraphs(&self) -> &TelegraphRegistry {
        &self.telegraphs
    }

    /// Event bus.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Takes every pending event.
    pub fn drain_events(&self) -> Vec<CombatEvent> {
        self.events.drain()
    }

    /// Spawns the player. A previous player stays in the world but is no
    /// longer the enemies' target.
    pub fn spawn_player(&mut self, position: Vec2) -> ActorId {
        let id = self.ids.next_actor();
        let player = self.config.player.clone();
        let actor = Actor::new(
            id,
            Faction::Player,
            position,
            player.half_extents,
            player.max_health,
            Role::Player(PlayerController::new(player)),
        );
        self.actors.insert(id, actor);
        self.player = Some(id);
        info!(%id, x = position.x, y = position.y, "player spawned");
        id
    }

    /// Spawns a standard enemy.
    pub fn spawn_enemy(&mut self, position: Vec2, config: EnemyConfig) -> CombatResult<ActorId> {
        config.validate()?;
        let (half_extents, max_health) = (config.half_extents, config.max_health);
        let brain = EnemyBrain::standard(config, position);
        Ok(self.insert_enemy(position, half_extents, max_health, brain))
    }

    /// Spawns a boss.
    pub fn spawn_boss(&mut self, position: Vec2, config: BossConfig) -> CombatResult<ActorId> {
        config.validate()?;
        let (half_extents, max_health) = (config.enemy.half_extents, config.enemy.max_health);
        let brain = EnemyBrain::for_boss(config, position);
        Ok(self.insert_enemy(position, half_extents, max_health, brain))
    }

    fn insert_enemy(
        &mut self,
        position: Vec2,
        half_extents: Vec2,
        max_health: f32,
        brain: EnemyBrain,
    ) -> ActorId {
        let id = self.ids.next_actor();
        let boss = brain.boss().is_some();
        let actor = Actor::new(
            id,
            Faction::Enemy,
            position,
            half_extents,
            max_health,
            Role::Enemy(brain),
        );
        self.actors.insert(id, actor);
        info!(%id, boss, x = position.x, y = position.y, "enemy spawned");
        id
    }

    /// Queues a player input for the next tick.
    pub fn queue_input(&mut self, input: PlayerInput) {
        self.input.push_back(input);
    }

    /// Applies a status effect. Re-applying keeps the longer timer.
    pub fn apply_status(
        &mut self,
        id: ActorId,
        kind: StatusKind,
        duration: f32,
    ) -> CombatResult<()> {
        let actor = self.actors.get_mut(&id).ok_or(CombatError::ActorNotFound(id))?;
        if actor.is_dead() {
            return Err(CombatError::ActorDead(id));
        }
        if duration <= 0.0 || !duration.is_finite() {
            return Err(CombatError::invalid("status.duration", "must be positive"));
        }
        if kind == StatusKind::Frozen && !actor.status.is_frozen() {
            // Cancel the running sequence before the snapshot so a windup hold is not restored
            self.interrupt(id);
        }
        let actor = self.actors.get_mut(&id).ok_or(CombatError::ActorNotFound(id))?;

        let interrupt = match kind {
            StatusKind::Confused => {
                actor.status.confuse(duration);
                true
            },
            StatusKind::Frozen => {
                let snapshot = FreezeSnapshot {
                    velocity: actor.velocity,
                    forced_position: actor.forced_position,
                };
                if actor.status.freeze(duration, snapshot) {
                    actor.velocity = Vec2::ZERO;
                    actor.forced_position = true;
                }
                false
            },
            StatusKind::Invincible => {
                actor.status.grant_invincibility(duration);
                false
            },
        };
        if interrupt {
            self.interrupt(id);
        }

        debug!(%id, ?kind, duration, "status applied");
        self.emit(CombatEvent::StatusApplied {
            actor: id,
            kind,
            duration,
        });
        Ok(())
    }

    /// Checks if a status is active on an actor.
    #[must_use]
    pub fn is_status_active(&self, id: ActorId, kind: StatusKind) -> bool {
        self.actors.get(&id).is_some_and(|actor| actor.status.is_active(kind))
    }

    /// Deals damage without knockback, as from a hazard or a script.
    ///
    /// Damage to a dead actor is ignored.
    pub fn damage(
        &mut self,
        target: ActorId,
        amount: f32,
        source: Option<ActorId>,
    ) -> CombatResult<DamageOutcome> {
        let actor = self.actors.get(&target).ok_or(CombatError::ActorNotFound(target))?;
        let direction = source
            .and_then(|id| self.actors.get(&id))
            .map_or(Vec2::ZERO, |attacker| actor.position - attacker.position);
        Ok(self.strike_actor(target, amount, direction, 0.0, source))
    }

    /// Restores health. Returns the amount restored.
    pub fn heal(&mut self, id: ActorId, amount: f32) -> CombatResult<f32> {
        let actor = self.actors.get_mut(&id).ok_or(CombatError::ActorNotFound(id))?;
        if actor.is_dead() {
            return Err(CombatError::ActorDead(id));
        }
        Ok(actor.health_mut().heal(amount))
    }

    /// Advances the simulation by `dt` real seconds.
    pub fn tick(&mut self, dt: f32, ctx: &TickContext<'_>) {
        if ctx.paused || dt <= 0.0 {
            return;
        }
        let dt = self.clock.advance(dt);

        self.tick_statuses(dt);
        for actor in self.actors.values_mut() {
            actor.grounded = ctx.physics.is_grounded(actor.feet());
        }
        while let Some(input) = self.input.pop_front() {
            self.handle_input(input);
        }
        self.update_player(dt);
        self.update_enemies(dt);
        self.integrate(ctx.physics, dt);
        self.watch_charges(ctx.physics);
        self.run_tasks(dt);
        self.sweep_telegraphs();
        self.despawn(dt);
    }

    fn emit(&self, event: CombatEvent) {
        self.events.publish(event);
    }

    fn emit_transition(&self, actor: ActorId, transition: Option<(EnemyState, EnemyState)>) {
        if let Some((from, to)) = transition {
            self.emit(CombatEvent::StateChanged { actor, from, to });
        }
    }

    /// Cancels everything an actor has in flight: tasks, telegraphs, locks.
    fn interrupt(&mut self, id: ActorId) {
        let cancelled = self.scheduler.cancel_owner(id);
        self.close_telegraphs(id);
        self.release_hold(id);
        if let Some(actor) = self.actors.get_mut(&id) {
            match actor.role_mut() {
                Role::Player(player) => {
                    player.interrupt();
                },
                Role::Enemy(brain) => {
                    brain.take_task();
                    if let Some(boss) = brain.boss_mut() {
                        boss.end_charge();
                    }
                },
            }
        }
        if cancelled > 0 {
            debug!(%id, cancelled, "tasks interrupted");
        }
    }

    /// Drops a scripted position hold. A freeze keeps its own hold.
    fn release_hold(&mut self, id: ActorId) {
        if let Some(actor) = self.actors.get_mut(&id) {
            if !actor.status.is_frozen() {
                actor.forced_position = false;
            }
        }
    }

    fn close_telegraphs(&mut self, id: ActorId) {
        for telegraph in self.telegraphs.close_attacker(id) {
            self.emit(CombatEvent::TelegraphEnd {
                telegraph: telegraph.id,
                attacker: id,
                outcome: telegraph.state,
            });
        }
    }

    fn tick_statuses(&mut self, dt: f32) {
        let mut expired = Vec::new();
        for actor in self.actors.values_mut() {
            if actor.is_dead() {
                continue;
            }
            let expiry = actor.status.tick(dt);
            if expiry.any() {
                expired.push((actor.id(), expiry));
            }
        }
        for (id, expiry) in expired {
            self.on_status_expired(id, expiry);
        }
    }

    fn on_status_expired(&mut self, id: ActorId, expiry: StatusExpiry) {
        if let Some(snapshot) = expiry.frozen {
            let mut reset = false;
            if let Some(actor) = self.actors.get_mut(&id) {
                actor.velocity = snapshot.velocity;
                actor.forced_position = snapshot.forced_position;
                reset = actor
                    .as_enemy()
                    .is_some_and(|brain| brain.state().is_task_backed());
            }
            self.emit(CombatEvent::StatusExpired {
                actor: id,
                kind: StatusKind::Frozen,
            });
            // The freeze cancelled the task that backed this state
            if reset {
                self.reset_enemy(id);
            }
        }
        if expiry.confused {
            self.emit(CombatEvent::StatusExpired {
                actor: id,
                kind: StatusKind::Confused,
            });
            let enemy = self.actors.get(&id).is_some_and(|actor| actor.as_enemy().is_some());
            if enemy {
                self.interrupt(id);
                self.reset_enemy(id);
            }
        }
        if expiry.invincible {
            self.emit(CombatEvent::StatusExpired {
                actor: id,
                kind: StatusKind::Invincible,
            });
        }
    }

    fn reset_enemy(&mut self, id: ActorId) {
        let transition = self
            .actors
            .get_mut(&id)
            .and_then(Actor::as_enemy_mut)
            .and_then(EnemyBrain::reset_to_idle);
        self.emit_transition(id, transition);
    }

    fn handle_input(&mut self, input: PlayerInput) {
        let Some(id) = self.player else {
            debug!(?input, "input dropped: no player");
            return;
        };
        if !self.actors.get(&id).is_some_and(Actor::is_alive) {
            return;
        }

        match input {
            PlayerInput::Move(axis) => {
                if let Some(player) = self.actors.get_mut(&id).and_then(Actor::as_player_mut) {
                    player.set_axis(axis);
                }
            },
            PlayerInput::Attack => self.start_swing(id),
            PlayerInput::Cast => self.start_player_task(id, PlayerInput::Cast),
            PlayerInput::Dash => self.start_player_task(id, PlayerInput::Dash),
            PlayerInput::Climb(climb) => {
                let Some(actor) = self.actors.get_mut(&id) else {
                    return;
                };
                let recoiling = actor.is_recoiling();
                let status = actor.status.clone();
                if let Some(player) = actor.as_player_mut() {
                    if let Err(err) = player.set_climb(climb, recoiling, &status) {
                        debug!(%err, "climb rejected");
                    }
                }
            },
            PlayerInput::Jump => self.emit(CombatEvent::JumpRequested { actor: id }),
            PlayerInput::Counter => self.counter(id),
            PlayerInput::AttackHitFrame => {
                let kind = self
                    .actors
                    .get_mut(&id)
                    .and_then(Actor::as_player_mut)
                    .and_then(PlayerController::take_hit_frame);
                match kind {
                    Some(kind) => self.nail_strike(id, kind),
                    None => debug!("hit frame without a swing"),
                }
            },
            PlayerInput::AttackEnd => {
                if let Some(player) = self.actors.get_mut(&id).and_then(Actor::as_player_mut) {
                    player.end_attack();
                }
            },
        }
    }

    fn start_swing(&mut self, id: ActorId) {
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        let (grounded, recoiling) = (actor.grounded, actor.is_recoiling());
        let status = actor.status.clone();
        let Some(player) = actor.as_player_mut() else {
            return;
        };
        match player.request_attack(grounded, recoiling, &status) {
            Ok(kind) => self.emit(CombatEvent::AttackStarted {
                actor: id,
                strike: Strike::Nail(kind),
            }),
            Err(err) => debug!(%err, "attack rejected"),
        }
    }

    fn start_player_task(&mut self, id: ActorId, input: PlayerInput) {
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        let recoiling = actor.is_recoiling();
        let status = actor.status.clone();
        let Some(player) = actor.as_player_mut() else {
            return;
        };

        let (label, request, steps) = match input {
            PlayerInput::Cast => (
                "player.cast",
                player.request_cast(recoiling, &status),
                timeline::player_cast(player.config()),
            ),
            _ => (
                "player.dash",
                player.request_dash(recoiling, &status),
                timeline::player_dash(player.config()),
            ),
        };
        if let Err(err) = request {
            debug!(%err, label, "player action rejected");
            return;
        }
        let handle = self.scheduler.schedule(id, label, steps);
        player.set_task(handle);
        if label == "player.cast" {
            self.emit(CombatEvent::AttackStarted {
                actor: id,
                strike: Strike::PlayerSpell,
            });
        }
    }

    fn update_player(&mut self, dt: f32) {
        let Some(actor) = self.player.and_then(|id| self.actors.get_mut(&id)) else {
            return;
        };
        if actor.is_dead() || actor.status.is_frozen() {
            return;
        }
        actor.recoil.tick(dt);

        let grounded = actor.grounded;
        let status = actor.status.clone();
        let mut velocity = actor.velocity;
        let mut facing = actor.facing;
        if let Some(player) = actor.as_player_mut() {
            player.steer(&mut velocity, &mut facing, grounded, &status);
        }
        actor.velocity = velocity;
        actor.facing = facing;
    }

    fn update_enemies(&mut self, dt: f32) {
        let target = self
            .player
            .and_then(|id| self.actors.get(&id))
            .filter(|actor| actor.is_alive())
            .map(|actor| (actor.id(), actor.position));
        let enemies: Vec<ActorId> = self
            .actors
            .values()
            .filter(|actor| actor.as_enemy().is_some())
            .map(Actor::id)
            .collect();

        for id in enemies {
            let Some(actor) = self.actors.get_mut(&id) else {
                continue;
            };
            if actor.is_dead() || actor.status.is_frozen() {
                continue;
            }
            actor.recoil.tick(dt);
            let sense = EnemySense {
                position: actor.position,
                facing: actor.facing,
                target: target.map(|(_, position)| position),
                confused: actor.status.is_confused(),
                recoiling: actor.recoil.is_active(),
            };
            let Some(brain) = actor.as_enemy_mut() else {
                continue;
            };
            brain.set_target(target.map(|(target, _)| target));
            let tick = brain.update(&sense, dt, &mut self.rng);

            if let Some(vx) = tick.velocity_x {
                actor.velocity.x = vx;
            }
            actor.facing = tick.facing;
            self.emit_transition(id, tick.transition);
            if let Some(command) = tick.command {
                self.start_enemy_attack(id, command);
            }
        }
    }

    fn start_enemy_attack(&mut self, id: ActorId, command: EnemyCommand) {
        let Some(brain) = self.actors.get(&id).and_then(Actor::as_enemy) else {
            return;
        };
        let planned = match command {
            EnemyCommand::Attack => Some((
                Strike::Melee,
                "enemy.attack",
                timeline::attack(&brain.config().melee, Strike::Melee, 0.0, true),
            )),
            EnemyCommand::CastSpell => brain.config().spell.as_ref().map(|spell| {
                (
                    Strike::Spell,
                    "enemy.cast",
                    timeline::attack(spell, Strike::Spell, 0.0, false),
                )
            }),
            EnemyCommand::Boss(attack) => brain
                .boss()
                .map(|boss| (Strike::Boss(attack), attack.label(), boss.timeline(attack))),
        };

        let Some((strike, label, steps)) = planned else {
            warn!(%id, ?command, "enemy has no profile for its attack");
            let transition = self
                .actors
                .get_mut(&id)
                .and_then(Actor::as_enemy_mut)
                .and_then(EnemyBrain::finish_attack);
            self.emit_transition(id, transition);
            return;
        };

        let handle = self.scheduler.schedule(id, label, steps);
        if let Some(brain) = self.actors.get_mut(&id).and_then(Actor::as_enemy_mut) {
            brain.set_task(handle);
        }
        self.emit(CombatEvent::AttackStarted { actor: id, strike });
    }

    fn integrate(&mut self, physics: &dyn PhysicsQuery, dt: f32) {
        for actor in self.actors.values_mut() {
            // Frozen bodies hold their position
            if actor.status.is_frozen() {
                continue;
            }
            let motion = physics.integrate(
                Motion {
                    position: actor.position,
                    velocity: actor.velocity,
                },
                actor.half_extents(),
                dt,
            );
            actor.position = motion.position;
            actor.velocity = motion.velocity;
        }
    }

    fn watch_charges(&mut self, physics: &dyn PhysicsQuery) {
        let charging: Vec<ActorId> = self
            .actors
            .values()
            .filter(|actor| actor.is_alive())
            .filter(|actor| {
                actor
                    .as_enemy()
                    .and_then(EnemyBrain::boss)
                    .is_some_and(|boss| boss.is_charging())
            })
            .map(Actor::id)
            .collect();

        for id in charging {
            let Some(actor) = self.actors.get(&id) else {
                continue;
            };
            let blocked = physics.is_blocked(actor.position, actor.half_extents());
            let filter = TargetFilter::faction(actor.faction().opponent()).excluding(id);
            let body = HitShape::Box {
                half_extents: actor.half_extents(),
            };
            let contact =
                !query_hit(&body, actor.position, self.actors.values(), &filter).is_empty();
            if !blocked && !contact {
                continue;
            }

            let Some(brain) = self.actors.get_mut(&id).and_then(Actor::as_enemy_mut) else {
                continue;
            };
            if let Some(task) = brain.take_task() {
                self.scheduler.cancel(task);
            }
            let Some(boss) = brain.boss_mut() else {
                continue;
            };
            boss.end_charge();
            let steps = boss.charge_cutoff(contact);
            let handle = self.scheduler.schedule(id, "boss.charge.cutoff", steps);
            brain.set_task(handle);
            debug!(%id, blocked, contact, "charge cut off");
        }
    }

    fn run_tasks(&mut self, dt: f32) {
        self.scheduler.advance(dt);
        while let Some(fired) = self.scheduler.pop_due() {
            self.dispatch(fired);
        }
    }

    fn sweep_telegraphs(&mut self) {
        for telegraph in self.telegraphs.expire(self.clock.now()) {
            self.emit(CombatEvent::TelegraphEnd {
                telegraph: telegraph.id,
                attacker: telegraph.attacker,
                outcome: telegraph.state,
            });
        }
    }

    fn despawn(&mut self, dt: f32) {
        let delay = self.config.world.despawn_delay;
        let expired: Vec<ActorId> = self
            .actors
            .values_mut()
            .filter(|actor| actor.is_dead())
            .filter_map(|actor| (actor.tick_dead(dt) >= delay).then_some(actor.id()))
            .collect();

        for id in expired {
            self.actors.remove(&id);
            self.scheduler.cancel_owner(id);
            if self.player == Some(id) {
                self.player = None;
            }
            debug!(%id, "actor despawned");
            self.emit(CombatEvent::Despawned { actor: id });
        }
    }

    /// Damages one actor and runs the hurt or death hooks.
    fn strike_actor(
        &mut self,
        target: ActorId,
        amount: f32,
        direction: Vec2,
        knockback: f32,
        source: Option<ActorId>,
    ) -> DamageOutcome {
        let bias = self.config.world.min_upward_bias;
        let Some(actor) = self.actors.get_mut(&target) else {
            return DamageOutcome::Ignored;
        };
        let outcome = apply_damage(actor, amount);
        if !outcome.landed() {
            return outcome;
        }
        if knockback > 0.0 {
            apply_knockback(actor, direction, knockback, bias);
        }

        self.emit(CombatEvent::Hurt {
            actor: target,
            amount: outcome.dealt(),
            source,
        });
        match outcome {
            DamageOutcome::Died { .. } => self.on_death(target),
            DamageOutcome::Damaged { .. } => self.on_hurt(target, direction),
            DamageOutcome::Ignored => {},
        }
        outcome
    }

    fn on_hurt(&mut self, id: ActorId, direction: Vec2) {
        let Some(actor) = self.actors.get(&id) else {
            return;
        };
        let fraction = actor.health().fraction();
        let is_player = actor.as_player().is_some();
        let staggers = actor.as_enemy().is_some_and(|brain| brain.config().staggers);

        if is_player {
            self.interrupt(id);
            let invincibility = self.config.player.hurt_invincibility;
            if let Some(actor) = self.actors.get_mut(&id) {
                actor.status.grant_invincibility(invincibility);
                let away = if direction.x == 0.0 {
                    -actor.facing.sign()
                } else {
                    direction.x
                };
                if let Some(player) = actor.as_player_mut() {
                    player.hurt(away);
                }
            }
            self.emit(CombatEvent::StatusApplied {
                actor: id,
                kind: StatusKind::Invincible,
                duration: invincibility,
            });
            return;
        }

        if staggers {
            self.interrupt(id);
        }
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        let mut armor_up = None;
        let mut transition = None;
        let mut recoil = None;
        if let Some(brain) = actor.as_enemy_mut() {
            transition = brain.enter_hurt();
            if transition.is_some() {
                recoil = Some(brain.config().recoil_length);
            }
            if let Some(boss) = brain.boss_mut() {
                if boss.check_armor(fraction) {
                    armor_up = Some(boss.config().armor_multiplier);
                }
            }
        }
        if let Some(length) = recoil {
            actor.recoil.start(length);
        }
        if let Some(multiplier) = armor_up {
            actor.armor = multiplier;
            info!(%id, multiplier, "boss armor phase");
            self.emit(CombatEvent::BossArmorUp { actor: id, multiplier });
        }
        self.emit_transition(id, transition);
    }

    fn on_death(&mut self, id: ActorId) {
        self.interrupt(id);
        self.emit(CombatEvent::Death { actor: id });
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        let position = actor.position;
        let Some(brain) = actor.as_enemy_mut() else {
            info!(%id, "player died");
            return;
        };
        let transition = brain.enter_dead();
        self.emit_transition(id, transition);
        self.emit(CombatEvent::LootDropped { actor: id, position });
        info!(%id, "enemy died");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boss::BossAttack;
    use crate::boss::BossWeights;
    use crate::parry::TelegraphState;
    use crate::physics::FlatArena;
    use crate::player::PlayerLock;

    const DT: f32 = 0.25;

    fn world() -> CombatWorld {
        CombatWorld::new(CombatConfig::default()).unwrap()
    }

    fn step(world: &mut CombatWorld, dt: f32) -> Vec<CombatEvent> {
        let arena = FlatArena::default();
        world.tick(dt, &TickContext::new(&arena));
        world.drain_events()
    }

    /// Player at x=1, a standard enemy at x=0 chasing with its attack ready.
    fn duel() -> (CombatWorld, ActorId, ActorId) {
        duel_with(CombatConfig::default())
    }

    fn duel_with(config: CombatConfig) -> (CombatWorld, ActorId, ActorId) {
        let mut world = CombatWorld::new(config).unwrap();
        let player = world.spawn_player(Vec2::new(1.0, 0.8));
        let enemy = world.spawn_enemy(Vec2::new(0.0, 0.75), EnemyConfig::default()).unwrap();
        step(&mut world, DT);
        assert_eq!(world.enemy_state(enemy), Some(EnemyState::Chase));
        world
            .actor_mut(enemy)
            .and_then(Actor::as_enemy_mut)
            .unwrap()
            .cooldowns_mut()
            .attack = 2.5;
        (world, player, enemy)
    }

    fn melee_hits(events: &[CombatEvent]) -> Vec<Vec<ActorId>> {
        events
            .iter()
            .filter_map(|event| match event {
                CombatEvent::AttackHitFrame {
                    strike: Strike::Melee,
                    targets,
                    ..
                } => Some(targets.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_detection_enters_chase_on_first_tick() {
        let mut world = world();
        world.spawn_player(Vec2::new(5.0, 0.8));
        let enemy = world.spawn_enemy(Vec2::new(0.0, 0.75), EnemyConfig::default()).unwrap();

        let events = step(&mut world, 1.0 / 64.0);
        assert_eq!(world.enemy_state(enemy), Some(EnemyState::Chase));
        assert!(events.contains(&CombatEvent::StateChanged {
            actor: enemy,
            from: EnemyState::Patrol,
            to: EnemyState::Chase,
        }));
    }

    #[test]
    fn test_attack_has_one_hit_phase_at_offset() {
        let (mut world, player, enemy) = duel();
        step(&mut world, DT);
        assert_eq!(world.enemy_state(enemy), Some(EnemyState::Attack));
        let started = world.now();

        let mut hits = Vec::new();
        for _ in 0..12 {
            let events = step(&mut world, DT);
            for targets in melee_hits(&events) {
                hits.push((world.now(), targets));
            }
            if world.enemy_state(enemy) != Some(EnemyState::Attack) {
                break;
            }
        }

        assert_eq!(hits.len(), 1);
        let (at, targets) = &hits[0];
        assert_eq!(*at - started, f64::from(EnemyConfig::default().melee.hit_offset));
        assert_eq!(targets, &vec![player]);
        assert_eq!(world.enemy_state(enemy), Some(EnemyState::Idle));
        assert!(world.scheduler().tasks_of(enemy).is_empty());
    }

    #[test]
    fn test_lethal_damage_dies_once() {
        let mut world = world();
        let enemy = world
            .spawn_enemy(
                Vec2::new(0.0, 0.75),
                EnemyConfig {
                    max_health: 10.0,
                    ..EnemyConfig::default()
                },
            )
            .unwrap();

        assert_eq!(world.damage(enemy, 15.0, None), Ok(DamageOutcome::Died { dealt: 10.0 }));
        assert_eq!(world.actor(enemy).unwrap().health().current(), 0.0);
        assert_eq!(world.enemy_state(enemy), Some(EnemyState::Dead));
        assert_eq!(world.damage(enemy, 5.0, None), Ok(DamageOutcome::Ignored));

        let events = world.drain_events();
        let deaths = events
            .iter()
            .filter(|event| matches!(event, CombatEvent::Death { .. }))
            .count();
        let to_dead = events
            .iter()
            .filter(|event| matches!(event, CombatEvent::StateChanged { to: EnemyState::Dead, .. }))
            .count();
        assert_eq!((deaths, to_dead), (1, 1));
        assert!(events.contains(&CombatEvent::LootDropped {
            actor: enemy,
            position: Vec2::new(0.0, 0.75),
        }));
    }

    #[test]
    fn test_counter_inside_window_parries() {
        let (mut world, player, enemy) = duel();
        let events = step(&mut world, DT);
        let Some((open, close)) = events.iter().find_map(|event| match event {
            CombatEvent::TelegraphStart {
                window_open,
                window_close,
                ..
            } => Some((*window_open, *window_close)),
            _ => None,
        }) else {
            panic!("no telegraph opened");
        };
        assert_eq!(close - open, 0.5);

        step(&mut world, DT);
        // Next tick lands on the window's close, inside the parry sub-window
        world.queue_input(PlayerInput::Counter);
        let events = step(&mut world, DT);
        assert_eq!(world.now(), close);

        assert!(events
            .iter()
            .any(|event| matches!(
                event,
                CombatEvent::Parried { defender, attacker, .. }
                    if *defender == player && *attacker == enemy
            )));
        assert!(events.iter().any(|event| matches!(
            event,
            CombatEvent::TelegraphEnd {
                outcome: TelegraphState::Parried,
                ..
            }
        )));
        assert_eq!(world.enemy_state(enemy), Some(EnemyState::Stunned));
        assert!(world.is_status_active(player, StatusKind::Invincible));
        assert_eq!(world.time_scale(), world.config().parry.slow_motion_scale);

        let counter =
            world.config().player.attack_damage * world.config().parry.counter_damage_multiplier;
        let health = world.actor(enemy).unwrap().health();
        assert_eq!(health.current(), health.max() - counter);

        for _ in 0..4 {
            assert!(melee_hits(&step(&mut world, DT)).is_empty());
        }
        let max = world.config().player.max_health;
        assert_eq!(world.actor(player).unwrap().health().current(), max);
    }

    #[test]
    fn test_counter_before_telegraph_opens_in_same_tick() {
        let mut config = CombatConfig::default();
        config.parry.parry_window = 1.0;
        let (mut world, player, enemy) = duel_with(config);

        // Input runs before the enemy opens its telegraph this tick
        world.queue_input(PlayerInput::Counter);
        let events = step(&mut world, DT);
        assert!(events
            .iter()
            .any(|event| matches!(
                event,
                CombatEvent::TelegraphStart { attacker, .. } if *attacker == enemy
            )));
        assert!(!events.iter().any(|event| matches!(event, CombatEvent::Parried { .. })));
        assert_eq!(world.enemy_state(enemy), Some(EnemyState::Attack));
        assert_eq!(world.telegraphs().len(), 1);

        // The window already covers the next tick
        world.queue_input(PlayerInput::Counter);
        let events = step(&mut world, DT);
        assert!(events
            .iter()
            .any(|event| matches!(
                event,
                CombatEvent::Parried { defender, .. } if *defender == player
            )));
    }

    #[test]
    fn test_frozen_player_cannot_counter() {
        let (mut world, player, enemy) = duel();
        step(&mut world, DT);
        step(&mut world, DT);
        world.apply_status(player, StatusKind::Frozen, 5.0).unwrap();

        world.queue_input(PlayerInput::Counter);
        let events = step(&mut world, DT);
        assert!(!events.iter().any(|event| matches!(event, CombatEvent::Parried { .. })));
        assert_ne!(world.enemy_state(enemy), Some(EnemyState::Stunned));
        assert_eq!(world.time_scale(), 1.0);
        let stamped = world
            .actor(player)
            .and_then(Actor::counter_state)
            .is_some_and(|state| state.countered_within(0.0, world.now()));
        assert!(!stamped);
    }

    #[test]
    fn test_hit_does_not_cut_stun_short() {
        let (mut world, player, enemy) = duel();
        world.stun(enemy, 1.5);
        world.drain_events();

        world.damage(enemy, 1.0, Some(player)).unwrap();
        assert_eq!(world.enemy_state(enemy), Some(EnemyState::Stunned));
        assert!(!world.actor(enemy).unwrap().is_recoiling());

        let mut events = world.drain_events();
        for _ in 0..3 {
            events.extend(step(&mut world, DT));
        }
        assert_eq!(world.enemy_state(enemy), Some(EnemyState::Stunned));
        assert!(!events.iter().any(|event| matches!(
            event,
            CombatEvent::StateChanged {
                to: EnemyState::Hurt,
                ..
            }
        )));
    }

    #[test]
    fn test_early_counter_has_no_effect() {
        let (mut world, player, enemy) = duel();
        step(&mut world, DT);
        // Opened at 0.5, closes at 1.0; 0.75 is before the sub-window
        world.queue_input(PlayerInput::Counter);
        let events = step(&mut world, DT);
        assert!(!events.iter().any(|event| matches!(event, CombatEvent::Parried { .. })));
        assert_eq!(world.enemy_state(enemy), Some(EnemyState::Attack));

        let events = step(&mut world, DT);
        assert_eq!(melee_hits(&events), vec![vec![player]]);
        let max = world.config().player.max_health;
        assert!(world.actor(player).unwrap().health().current() < max);
    }

    #[test]
    fn test_player_swing_hits_once_and_grants_mana() {
        let mut world = world();
        let player = world.spawn_player(Vec2::new(0.0, 0.8));
        let enemy = world.spawn_enemy(Vec2::new(1.5, 0.75), EnemyConfig::default()).unwrap();

        world.queue_input(PlayerInput::Attack);
        let events = step(&mut world, 1.0 / 64.0);
        assert!(events.contains(&CombatEvent::AttackStarted {
            actor: player,
            strike: Strike::Nail(crate::player::AttackKind::Side),
        }));

        world.queue_input(PlayerInput::AttackHitFrame);
        world.queue_input(PlayerInput::AttackHitFrame);
        let events = step(&mut world, 1.0 / 64.0);
        let frames = events
            .iter()
            .filter(|event| matches!(event, CombatEvent::AttackHitFrame { .. }))
            .count();
        assert_eq!(frames, 1);
        assert_eq!(world.enemy_state(enemy), Some(EnemyState::Hurt));
        assert!(events
            .iter()
            .any(|event| matches!(
                event,
                CombatEvent::ManaGained { actor, .. } if *actor == player
            )));

        world.queue_input(PlayerInput::AttackEnd);
        step(&mut world, 1.0 / 64.0);
        let lock = world.actor(player).and_then(Actor::as_player).unwrap().lock();
        assert_eq!(lock, PlayerLock::Free);
    }

    #[test]
    fn test_confusion_cancels_attack_and_resets_on_expiry() {
        let (mut world, _, enemy) = duel();
        step(&mut world, DT);
        assert_eq!(world.enemy_state(enemy), Some(EnemyState::Attack));

        world.apply_status(enemy, StatusKind::Confused, 0.5).unwrap();
        assert!(world.scheduler().tasks_of(enemy).is_empty());
        assert!(world.telegraphs().is_empty());
        assert_eq!(world.enemy_state(enemy), Some(EnemyState::Attack));

        step(&mut world, DT);
        let events = step(&mut world, DT);
        assert!(events.contains(&CombatEvent::StatusExpired {
            actor: enemy,
            kind: StatusKind::Confused,
        }));
        assert!(events.contains(&CombatEvent::StateChanged {
            actor: enemy,
            from: EnemyState::Attack,
            to: EnemyState::Idle,
        }));
        assert_ne!(world.enemy_state(enemy), Some(EnemyState::Attack));
    }

    #[test]
    fn test_freeze_holds_position_and_restores() {
        let mut world = world();
        let enemy = world.spawn_enemy(Vec2::new(0.0, 0.75), EnemyConfig::default()).unwrap();
        world.actor_mut(enemy).unwrap().velocity = Vec2::new(2.0, 0.0);

        world.apply_status(enemy, StatusKind::Frozen, 0.5).unwrap();
        let actor = world.actor(enemy).unwrap();
        assert_eq!(actor.velocity, Vec2::ZERO);
        assert!(actor.forced_position);

        step(&mut world, DT);
        assert_eq!(world.actor(enemy).unwrap().position, Vec2::new(0.0, 0.75));

        let events = step(&mut world, DT);
        assert!(events.contains(&CombatEvent::StatusExpired {
            actor: enemy,
            kind: StatusKind::Frozen,
        }));
        assert!(!world.actor(enemy).unwrap().forced_position);
    }

    #[test]
    fn test_despawned_target_drops_chase_to_patrol() {
        let mut world = world();
        let player = world.spawn_player(Vec2::new(5.0, 0.8));
        let enemy = world.spawn_enemy(Vec2::new(0.0, 0.75), EnemyConfig::default()).unwrap();
        step(&mut world, 1.0 / 64.0);
        assert_eq!(world.enemy_state(enemy), Some(EnemyState::Chase));

        world.damage(player, 1000.0, None).unwrap();
        let mut events = world.drain_events();
        for _ in 0..8 {
            events.extend(step(&mut world, DT));
        }

        assert!(world.actor(player).is_none());
        assert!(events.contains(&CombatEvent::Despawned { actor: player }));
        assert!(events.contains(&CombatEvent::StateChanged {
            actor: enemy,
            from: EnemyState::Chase,
            to: EnemyState::Patrol,
        }));
        assert_eq!(world.enemy_state(enemy), Some(EnemyState::Patrol));
    }

    #[test]
    fn test_boss_windup_keeps_knockback_angle() {
        let mut world = world();
        let player = world.spawn_player(Vec2::new(3.0, 0.8));
        let boss = world.spawn_boss(Vec2::new(0.0, 1.5), BossConfig::default()).unwrap();

        let mut winding_up = false;
        for _ in 0..200 {
            step(&mut world, 1.0 / 32.0);
            if world.enemy_state(boss) == Some(EnemyState::Attack) {
                winding_up = true;
                break;
            }
        }
        assert!(winding_up);
        assert!(world.actor(boss).unwrap().forced_position);

        world.strike_actor(boss, 1.0, Vec2::new(1.0, 0.0), 5.0, Some(player));
        let velocity = world.actor(boss).unwrap().velocity;
        assert_eq!(velocity, Vec2::new(5.0, 0.0));

        // Released once the windup ends
        for _ in 0..200 {
            step(&mut world, 1.0 / 32.0);
            if world.enemy_state(boss) != Some(EnemyState::Attack) {
                break;
            }
        }
        assert!(!world.actor(boss).unwrap().forced_position);
    }

    #[test]
    fn test_status_on_missing_or_dead_actor() {
        let mut world = world();
        let ghost = ActorId::from_raw(99);
        assert_eq!(
            world.apply_status(ghost, StatusKind::Confused, 1.0),
            Err(CombatError::ActorNotFound(ghost))
        );

        let enemy = world.spawn_enemy(Vec2::new(0.0, 0.75), EnemyConfig::default()).unwrap();
        world.damage(enemy, 100.0, None).unwrap();
        assert_eq!(
            world.apply_status(enemy, StatusKind::Frozen, 1.0),
            Err(CombatError::ActorDead(enemy))
        );
        assert_eq!(world.heal(enemy, 5.0), Err(CombatError::ActorDead(enemy)));
    }

    #[test]
    fn test_boss_armor_triggers_once() {
        let mut world = world();
        let boss = world.spawn_boss(Vec2::new(0.0, 1.5), BossConfig::default()).unwrap();

        world.damage(boss, 150.0, None).unwrap();
        assert_eq!(world.actor(boss).unwrap().armor, BossConfig::default().armor_multiplier);
        assert_eq!(
            world.damage(boss, 20.0, None),
            Ok(DamageOutcome::Damaged {
                dealt: 20.0 * BossConfig::default().armor_multiplier,
                remaining: 150.0 - 20.0 * BossConfig::default().armor_multiplier,
            })
        );

        let armor_ups = world
            .drain_events()
            .iter()
            .filter(|event| matches!(event, CombatEvent::BossArmorUp { .. }))
            .count();
        assert_eq!(armor_ups, 1);
        // Bosses do not stagger
        assert_ne!(world.enemy_state(boss), Some(EnemyState::Hurt));
    }

    #[test]
    fn test_boss_charge_stops_on_contact() {
        let mut config = BossConfig::default();
        config.weights = BossWeights {
            long_beam_below: 0.0,
            ..BossWeights::default()
        };
        let mut world = world();
        let player = world.spawn_player(Vec2::new(15.0, 0.8));
        let boss = world.spawn_boss(Vec2::new(0.0, 1.5), config).unwrap();

        let mut charge_hits = Vec::new();
        for _ in 0..160 {
            let events = step(&mut world, 1.0 / 32.0);
            charge_hits.extend(events.into_iter().filter_map(|event| match event {
                CombatEvent::AttackHitFrame {
                    strike: Strike::Boss(BossAttack::Charge),
                    targets,
                    ..
                } => Some(targets),
                _ => None,
            }));
            if !charge_hits.is_empty() {
                break;
            }
        }

        assert_eq!(charge_hits, vec![vec![player]]);
        let brain = world.actor(boss).and_then(Actor::as_enemy).unwrap();
        assert!(!brain.boss().unwrap().is_charging());
        assert!(world.actor(player).unwrap().health().current() < world.config().player.max_health);
    }

    #[test]
    fn test_dead_actors_despawn_after_delay() {
        let mut world = world();
        let enemy = world.spawn_enemy(Vec2::new(0.0, 0.75), EnemyConfig::default()).unwrap();
        world.damage(enemy, 100.0, None).unwrap();

        let mut despawned = false;
        for _ in 0..8 {
            let events = step(&mut world, DT);
            despawned |= events.contains(&CombatEvent::Despawned { actor: enemy });
        }
        assert!(despawned);
        assert!(world.actor(enemy).is_none());
    }

    #[test]
    fn test_paused_tick_does_nothing() {
        let mut world = world();
        world.spawn_player(Vec2::new(0.0, 0.8));
        let arena = FlatArena::default();
        world.tick(DT, &TickContext::new(&arena).paused(true));
        assert_eq!(world.now(), 0.0);
        assert!(world.drain_events().is_empty());
    }
}
