//! Timed action dispatch, hit phases and parry resolution.

use glam::Vec2;
use riposte_common::{ActorId, HitShape};
use tracing::{debug, warn};

use super::CombatWorld;
use crate::actor::Role;
use crate::boss::BossAttack;
use crate::config::{AttackProfile, GazeConfig};
use crate::enemy::EnemyBrain;
use crate::events::CombatEvent;
use crate::hit::{query_hit, DamageOutcome, HitList, TargetFilter};
use crate::parry::{AttackTelegraph, ParryResolution, TelegraphState};
use crate::player::AttackKind;
use crate::scheduler::Fired;
use crate::status::StatusKind;
use crate::timeline::{CombatAction, Strike};

/// Extra reach of a charging body when it checks for contact.
const CHARGE_MARGIN: f32 = 0.1;

impl CombatWorld {
    pub(super) fn dispatch(&mut self, fired: Fired<CombatAction>) {
        let owner = fired.owner;
        match fired.action {
            CombatAction::Brace { factor } => {
                if let Some(actor) = self.actors.get_mut(&owner) {
                    actor.velocity.x *= factor;
                }
            },
            CombatAction::Telegraph { duration, parryable } => {
                let now = self.clock.now();
                let window = self.config.parry.parry_window;
                let telegraph = self.telegraphs.open(owner, now, duration, window, parryable);
                let event = CombatEvent::TelegraphStart {
                    telegraph: telegraph.id,
                    attacker: owner,
                    window_open: telegraph.window_open,
                    window_close: telegraph.window_close,
                    parryable,
                };
                self.emit(event);
            },
            CombatAction::Hold => {
                if let Some(actor) = self.actors.get_mut(&owner) {
                    actor.forced_position = true;
                }
            },
            CombatAction::EndWindup => {
                self.close_telegraphs(owner);
                self.release_hold(owner);
            },
            CombatAction::Strike(strike) => self.resolve_strike(owner, strike),
            CombatAction::Surge { speed } => {
                if let Some(actor) = self.actors.get_mut(&owner) {
                    actor.velocity.x = actor.facing.sign() * speed;
                }
            },
            CombatAction::Charge { speed } => {
                if let Some(actor) = self.actors.get_mut(&owner) {
                    actor.velocity.x = actor.facing.sign() * speed;
                    if let Some(boss) = actor.as_enemy_mut().and_then(EnemyBrain::boss_mut) {
                        boss.begin_charge();
                    }
                }
            },
            CombatAction::Halt => {
                if let Some(actor) = self.actors.get_mut(&owner) {
                    actor.velocity.x = 0.0;
                    if let Some(boss) = actor.as_enemy_mut().and_then(EnemyBrain::boss_mut) {
                        boss.end_charge();
                    }
                }
            },
            CombatAction::Finish => self.finish_sequence(owner),
        }

        if fired.last {
            if let Some(actor) = self.actors.get_mut(&owner) {
                match actor.role_mut() {
                    Role::Player(player) => player.task_finished(fired.handle),
                    Role::Enemy(brain) => brain.task_finished(fired.handle),
                }
            }
        }
    }

    fn finish_sequence(&mut self, owner: ActorId) {
        self.release_hold(owner);
        let Some(actor) = self.actors.get_mut(&owner) else {
            return;
        };
        let transition = match actor.role_mut() {
            Role::Player(player) => {
                player.release();
                None
            },
            Role::Enemy(brain) => brain.finish_attack(),
        };
        self.emit_transition(owner, transition);
    }

    fn resolve_strike(&mut self, owner: ActorId, strike: Strike) {
        let Some(actor) = self.actors.get(&owner) else {
            return;
        };
        if actor.is_dead() {
            return;
        }

        match strike {
            Strike::Melee => {
                if let Some(profile) = actor.as_enemy().map(|brain| brain.config().melee.clone()) {
                    self.profile_strike(owner, strike, &profile, None);
                }
            },
            Strike::Spell => {
                let Some(brain) = actor.as_enemy() else {
                    return;
                };
                let Some(profile) = brain.config().spell.clone() else {
                    warn!(%owner, "spell strike without a spell profile");
                    return;
                };
                let target = brain
                    .target()
                    .and_then(|id| self.actors.get(&id))
                    .filter(|target| target.is_alive())
                    .map(|target| target.position);
                match target {
                    Some(anchor) => self.profile_strike(owner, strike, &profile, Some(anchor)),
                    None => debug!(%owner, "spell fizzled: no target"),
                }
            },
            Strike::Boss(attack) => self.boss_strike(owner, attack),
            Strike::Nail(kind) => self.nail_strike(owner, kind),
            Strike::PlayerSpell => {
                let Some(player) = actor.as_player() else {
                    return;
                };
                let config = player.config();
                let origin = actor.local_point(config.cast_offset);
                let shapes = [(config.cast_shape, origin)];
                let (damage, knockback) = (config.cast_damage, config.attack_knockback);
                self.hit_phase(owner, strike, &shapes, damage, knockback);
            },
        }
    }

    /// Hit phase for an [`AttackProfile`], placed at the owner's local
    /// origin or relative to `anchor`.
    fn profile_strike(
        &mut self,
        owner: ActorId,
        strike: Strike,
        profile: &AttackProfile,
        anchor: Option<Vec2>,
    ) {
        let Some(offset) = profile.origin else {
            warn!(%owner, ?strike, "attack has no hitbox origin; skipping hit query");
            return;
        };
        let Some(actor) = self.actors.get(&owner) else {
            return;
        };
        let origin = match anchor {
            Some(anchor) => anchor + offset,
            None => actor.local_point(offset),
        };
        let shapes = [(profile.shape, origin)];
        self.hit_phase(owner, strike, &shapes, profile.damage, profile.knockback);
    }

    fn boss_strike(&mut self, owner: ActorId, attack: BossAttack) {
        let Some(actor) = self.actors.get(&owner) else {
            return;
        };
        let Some(boss) = actor.as_enemy().and_then(EnemyBrain::boss) else {
            return;
        };
        let config = boss.config().clone();
        let strike = Strike::Boss(attack);
        let body = actor.half_extents();
        let position = actor.position;

        match attack {
            BossAttack::Slash => self.profile_strike(owner, strike, &config.slash, None),
            BossAttack::Slam => self.profile_strike(owner, strike, &config.slam, None),
            BossAttack::Lunge => {
                let Some(offset) = config.lunge.origin else {
                    warn!(%owner, "lunge has no hitbox origin; skipping hit query");
                    return;
                };
                // The swipe and the travelling body both connect
                let shapes = [
                    (config.lunge.shape, actor.local_point(offset)),
                    (HitShape::Box { half_extents: body }, position),
                ];
                self.hit_phase(owner, strike, &shapes, config.lunge.damage, config.lunge.knockback);
            },
            BossAttack::Gaze => self.resolve_gaze(owner, &config.gaze),
            BossAttack::Beam => {
                let beam = &config.beam;
                let half_extents = Vec2::new(beam.length / 2.0, beam.thickness / 2.0);
                let origin = actor.local_point(Vec2::new(body.x + half_extents.x, 0.0));
                let shapes = [(HitShape::Box { half_extents }, origin)];
                self.hit_phase(owner, strike, &shapes, beam.damage_per_tick, 0.0);
            },
            BossAttack::Charge => {
                let shapes = [(
                    HitShape::Box {
                        half_extents: body + Vec2::splat(CHARGE_MARGIN),
                    },
                    position,
                )];
                let charge = &config.charge;
                self.hit_phase(owner, strike, &shapes, charge.damage, charge.knockback);
            },
        }
    }

    /// Gaze lands on the target unless it looks away or countered during
    /// the dodge sub-window.
    fn resolve_gaze(&mut self, owner: ActorId, gaze: &GazeConfig) {
        let now = self.clock.now();
        let Some(boss) = self.actors.get(&owner) else {
            return;
        };
        let origin = boss.position;
        let target = boss
            .as_enemy()
            .and_then(EnemyBrain::target)
            .and_then(|id| self.actors.get(&id))
            .filter(|target| target.is_alive());

        let hit = target.and_then(|target| {
            let in_reach = target.position.distance(origin) <= gaze.reach;
            let looks_toward = (origin.x - target.position.x) * target.facing.sign() >= 0.0;
            let dodge_from = now - f64::from(gaze.dodge_window);
            let dodged = target
                .counter_state()
                .is_some_and(|state| state.countered_within(dodge_from, now));
            (in_reach && looks_toward && !dodged).then_some(target.id())
        });

        self.emit(CombatEvent::AttackHitFrame {
            actor: owner,
            strike: Strike::Boss(BossAttack::Gaze),
            targets: hit.into_iter().collect(),
        });
        let Some(target) = hit else {
            debug!(%owner, "gaze avoided");
            return;
        };

        let outcome = self.strike_actor(target, gaze.damage, Vec2::ZERO, 0.0, Some(owner));
        if matches!(outcome, DamageOutcome::Damaged { .. }) {
            if let Err(err) = self.apply_status(target, StatusKind::Frozen, gaze.freeze) {
                debug!(%err, "gaze freeze not applied");
            }
        }
    }

    pub(super) fn nail_strike(&mut self, owner: ActorId, kind: AttackKind) {
        let Some(actor) = self.actors.get(&owner) else {
            return;
        };
        let Some(player) = actor.as_player() else {
            return;
        };
        let config = player.config();
        let (shape, offset) = match kind {
            AttackKind::Side => (config.side_hitbox, config.side_offset),
            AttackKind::Up => (config.up_hitbox, config.up_offset),
            AttackKind::Down => (config.down_hitbox, config.down_offset),
        };
        let shapes = [(shape, actor.local_point(offset))];
        let (damage, knockback) = (config.attack_damage, config.attack_knockback);

        let hits = self.hit_phase(owner, Strike::Nail(kind), &shapes, damage, knockback);
        if !hits.iter().any(|(_, outcome)| outcome.landed()) {
            return;
        }

        let Some(actor) = self.actors.get_mut(&owner) else {
            return;
        };
        let facing = actor.facing;
        let Some(player) = actor.as_player_mut() else {
            return;
        };
        let amount = player.on_landed_hit(kind, facing);
        self.emit(CombatEvent::ManaGained { actor: owner, amount });
    }

    /// Queries every shape, merges the targets and strikes each once.
    fn hit_phase(
        &mut self,
        owner: ActorId,
        strike: Strike,
        shapes: &[(HitShape, Vec2)],
        damage: f32,
        knockback: f32,
    ) -> Vec<(ActorId, DamageOutcome)> {
        let Some(actor) = self.actors.get(&owner) else {
            return Vec::new();
        };
        let source = actor.position;
        let filter = TargetFilter::faction(actor.faction().opponent()).excluding(owner);

        let mut hits = HitList::new();
        for (shape, origin) in shapes {
            hits.extend(query_hit(shape, *origin, self.actors.values(), &filter));
        }
        let targets = hits.into_vec();
        debug!(%owner, ?strike, targets = targets.len(), "hit phase");
        self.emit(CombatEvent::AttackHitFrame {
            actor: owner,
            strike,
            targets: targets.clone(),
        });

        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            let direction = self
                .actors
                .get(&target)
                .map_or(Vec2::ZERO, |actor| actor.position - source);
            let outcome = self.strike_actor(target, damage, direction, knockback, Some(owner));
            outcomes.push((target, outcome));
        }
        outcomes
    }

    /// Counter input: stamp it and try to parry an armed telegraph.
    pub(super) fn counter(&mut self, defender: ActorId) {
        let now = self.clock.now();
        let max_distance = self.config.parry.max_distance;
        let Some(actor) = self.actors.get_mut(&defender) else {
            return;
        };
        if actor.status.is_frozen() {
            debug!(%defender, "counter ignored: frozen");
            return;
        }
        let Some(player) = actor.as_player_mut() else {
            return;
        };
        player.counter(now);
        let position = actor.position;

        let actors = &self.actors;
        let resolution = self.telegraphs.resolve_counter(now, |telegraph| {
            actors.get(&telegraph.attacker).is_some_and(|attacker| {
                attacker.is_alive() && attacker.position.distance(position) <= max_distance
            })
        });
        match resolution {
            ParryResolution::Parried(telegraph) => self.on_parried(defender, &telegraph),
            ParryResolution::NoEffect => debug!(%defender, now, "counter had no effect"),
        }
    }

    fn on_parried(&mut self, defender: ActorId, telegraph: &AttackTelegraph) {
        let parry = self.config.parry.clone();
        let attacker = telegraph.attacker;
        debug!(%defender, %attacker, "parried");
        self.emit(CombatEvent::TelegraphEnd {
            telegraph: telegraph.id,
            attacker,
            outcome: TelegraphState::Parried,
        });
        self.emit(CombatEvent::Parried {
            defender,
            attacker,
            telegraph: telegraph.id,
        });

        let Some(actor) = self.actors.get_mut(&defender) else {
            return;
        };
        actor.status.grant_invincibility(parry.invincibility);
        let base = actor
            .as_player()
            .map_or(self.config.player.attack_damage, |player| player.config().attack_damage);
        let position = actor.position;
        self.emit(CombatEvent::StatusApplied {
            actor: defender,
            kind: StatusKind::Invincible,
            duration: parry.invincibility,
        });

        self.clock.begin_slow_motion(parry.slow_motion_scale, parry.slow_motion_duration);
        self.emit(CombatEvent::SlowMotion {
            scale: parry.slow_motion_scale,
            duration: parry.slow_motion_duration,
        });

        // The parried attack must not land
        self.interrupt(attacker);
        let direction = self
            .actors
            .get(&attacker)
            .map_or(Vec2::ZERO, |actor| actor.position - position);
        let outcome = self.strike_actor(
            attacker,
            base * parry.counter_damage_multiplier,
            direction,
            parry.counter_knockback,
            Some(defender),
        );
        if !matches!(outcome, DamageOutcome::Died { .. }) {
            self.stun(attacker, parry.stun_duration);
        }
    }

    pub(super) fn stun(&mut self, id: ActorId, duration: f32) {
        self.interrupt(id);
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        if actor.is_dead() {
            return;
        }
        actor.recoil.clear();
        actor.velocity.x = 0.0;
        let transition = actor.as_enemy_mut().and_then(|brain| brain.stun(duration));
        self.emit(CombatEvent::Stunned { actor: id, duration });
        self.emit_transition(id, transition);
    }
}

#[cfg(test)]
mod tests {
    use super::super::TickContext;
    use super::*;
    use crate::actor::Actor;
    use crate::config::{BossConfig, CombatConfig, EnemyConfig};
    use crate::enemy::EnemyState;
    use crate::physics::FlatArena;

    fn step(world: &mut CombatWorld, dt: f32) -> Vec<CombatEvent> {
        let arena = FlatArena::default();
        world.tick(dt, &TickContext::new(&arena));
        world.drain_events()
    }

    #[test]
    fn test_melee_without_origin_skips_query() {
        let mut world = CombatWorld::new(CombatConfig::default()).unwrap();
        world.spawn_player(Vec2::new(1.0, 0.8));
        let mut config = EnemyConfig::default();
        config.melee.origin = None;
        let enemy = world.spawn_enemy(Vec2::new(0.0, 0.75), config).unwrap();

        world.resolve_strike(enemy, Strike::Melee);
        let events = world.drain_events();
        assert!(!events
            .iter()
            .any(|event| matches!(event, CombatEvent::AttackHitFrame { .. })));
    }

    #[test]
    fn test_hit_phase_dedupes_across_shapes() {
        let mut world = CombatWorld::new(CombatConfig::default()).unwrap();
        let player = world.spawn_player(Vec2::new(0.0, 0.8));
        let enemy = world.spawn_enemy(Vec2::new(1.0, 0.75), EnemyConfig::default()).unwrap();

        let shape = HitShape::circle(2.0);
        let shapes = [(shape, Vec2::new(1.0, 0.8)), (shape, Vec2::new(0.5, 0.8))];
        let hits = world.hit_phase(player, Strike::PlayerSpell, &shapes, 5.0, 0.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, enemy);
        assert_eq!(world.actor(enemy).unwrap().health().current(), 25.0);
    }

    #[test]
    fn test_gaze_misses_a_target_looking_away() {
        let mut world = CombatWorld::new(CombatConfig::default()).unwrap();
        let player = world.spawn_player(Vec2::new(5.0, 0.8));
        let boss = world.spawn_boss(Vec2::new(0.0, 1.5), BossConfig::default()).unwrap();
        world
            .actor_mut(boss)
            .and_then(Actor::as_enemy_mut)
            .unwrap()
            .set_target(Some(player));

        // Player faces right, away from the boss
        world.resolve_gaze(boss, &GazeConfig::default());
        assert!(!world.is_status_active(player, StatusKind::Frozen));

        world.actor_mut(player).unwrap().facing = riposte_common::Facing::Left;
        world.resolve_gaze(boss, &GazeConfig::default());
        assert!(world.is_status_active(player, StatusKind::Frozen));
        let health = world.actor(player).unwrap().health();
        assert_eq!(health.current(), health.max() - GazeConfig::default().damage);
    }

    #[test]
    fn test_gaze_dodged_by_recent_counter() {
        let mut world = CombatWorld::new(CombatConfig::default()).unwrap();
        let player = world.spawn_player(Vec2::new(-5.0, 0.8));
        let boss = world.spawn_boss(Vec2::new(0.0, 1.5), BossConfig::default()).unwrap();
        world
            .actor_mut(boss)
            .and_then(Actor::as_enemy_mut)
            .unwrap()
            .set_target(Some(player));

        // Facing right, toward the boss, countering right now
        world.queue_input(crate::player::PlayerInput::Counter);
        step(&mut world, 1.0 / 64.0);
        world.resolve_gaze(boss, &GazeConfig::default());
        assert!(!world.is_status_active(player, StatusKind::Frozen));
        let health = world.actor(player).unwrap().health();
        assert_eq!(health.current(), health.max());
    }

    #[test]
    fn test_stun_enters_stunned() {
        let mut world = CombatWorld::new(CombatConfig::default()).unwrap();
        let enemy = world.spawn_enemy(Vec2::new(0.0, 0.75), EnemyConfig::default()).unwrap();
        world.stun(enemy, 1.0);
        assert_eq!(world.enemy_state(enemy), Some(EnemyState::Stunned));
        let events = world.drain_events();
        assert!(events.contains(&CombatEvent::Stunned {
            actor: enemy,
            duration: 1.0,
        }));
    }
}
