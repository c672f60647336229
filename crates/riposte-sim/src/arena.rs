//! Headless arena run.
//!
//! Builds a [`CombatWorld`] on a flat arena, spawns the configured
//! scenario and drives it frame by frame with the [`Pilot`].

use anyhow::Context;
use glam::Vec2;
use riposte_common::ActorId;
use riposte_core::{AttackProfile, CombatWorld, EnemyConfig, Faction, FlatArena, TickContext};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{Scenario, SimConfig};
use crate::pilot::Pilot;
use crate::report::EventReport;
use crate::timing::FixedStep;

/// Outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Fixed steps simulated
    pub ticks: u64,
    /// World time at the end of the run
    pub sim_time: f64,
    /// Whether the player survived
    pub player_alive: bool,
    /// Living enemies at the end of the run
    pub enemies_left: usize,
    /// Event tallies
    pub events: EventReport,
}

/// Spawns the scenario's opponents to the right of the player.
fn spawn_scenario(world: &mut CombatWorld, config: &SimConfig) -> anyhow::Result<()> {
    let combat = &config.combat;
    let x = config.arena_half_width * 0.5;

    match config.scenario {
        Scenario::Duel => {
            let enemy = combat.enemy.clone();
            world.spawn_enemy(Vec2::new(x, enemy.half_extents.y), enemy)?;
        },
        Scenario::Pack => {
            let melee = combat.enemy.clone();
            let caster = EnemyConfig {
                spell: Some(AttackProfile::spell()),
                ..combat.enemy.clone()
            };
            world.spawn_enemy(Vec2::new(x - 2.0, melee.half_extents.y), melee)?;
            world.spawn_enemy(Vec2::new(x + 2.0, caster.half_extents.y), caster)?;
        },
        Scenario::Boss => {
            let boss = combat.boss.clone();
            world.spawn_boss(Vec2::new(x, boss.enemy.half_extents.y), boss)?;
        },
    }
    Ok(())
}

/// Runs one scenario to completion.
///
/// Stops early once the player dies or no enemy is left alive.
pub fn run(config: &SimConfig) -> anyhow::Result<RunSummary> {
    let mut world = CombatWorld::new(config.combat.clone()).context("Invalid combat config")?;
    let arena = FlatArena::new(-config.arena_half_width, config.arena_half_width)
        .with_gravity(config.gravity);
    let ctx = TickContext::new(&arena);

    let start = Vec2::new(-config.arena_half_width * 0.5, config.combat.player.half_extents.y);
    let player = world.spawn_player(start);
    spawn_scenario(&mut world, config).context("Failed to spawn scenario")?;

    let mut pilot = Pilot::new(player, config.pilot.clone());
    let mut report = EventReport::new(config.json_events);
    let mut timing = FixedStep::new(config.fixed_dt);
    let parry_window = config.combat.parry.parry_window;

    info!(scenario = ?config.scenario, duration = config.duration, "Starting run");

    let mut ticks = 0u64;
    let mut elapsed = 0.0f32;
    'frames: while elapsed < config.duration {
        elapsed += config.frame_dt;
        for _ in 0..timing.accumulate(config.frame_dt) {
            for input in pilot.drive(&world, timing.fixed_dt()) {
                world.queue_input(input);
            }
            world.tick(timing.fixed_dt(), &ctx);
            ticks += 1;

            let now = world.now();
            for event in world.drain_events() {
                pilot.observe(&event, now, parry_window);
                report.record(&event, now);
            }

            if !alive(&world, player) || enemies_left(&world) == 0 {
                debug!(ticks, "Run decided");
                break 'frames;
            }
        }
    }

    Ok(RunSummary {
        ticks,
        sim_time: world.now(),
        player_alive: alive(&world, player),
        enemies_left: enemies_left(&world),
        events: report,
    })
}

fn alive(world: &CombatWorld, id: ActorId) -> bool {
    world.actor(id).is_some_and(|actor| actor.is_alive())
}

fn enemies_left(world: &CombatWorld) -> usize {
    world
        .actors()
        .filter(|actor| actor.faction() == Faction::Enemy && actor.is_alive())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short(scenario: Scenario) -> SimConfig {
        SimConfig {
            scenario,
            duration: 5.0,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_duel_produces_combat() {
        let summary = run(&short(Scenario::Duel)).unwrap();
        assert!(summary.ticks > 0);
        assert!(summary.events.count("attack_started") > 0);
        assert!(summary.events.count("state_changed") > 0);
    }

    #[test]
    fn test_runs_are_deterministic() {
        let a = run(&short(Scenario::Pack)).unwrap();
        let b = run(&short(Scenario::Pack)).unwrap();
        assert_eq!(a.ticks, b.ticks);
        assert_eq!(a.sim_time, b.sim_time);
        assert_eq!(a.enemies_left, b.enemies_left);
        assert_eq!(a.events.total(), b.events.total());
    }

    #[test]
    fn test_boss_opens_telegraphs() {
        let summary = run(&short(Scenario::Boss)).unwrap();
        assert!(summary.events.count("telegraph_start") > 0);
    }

    #[test]
    fn test_weak_enemy_falls_early() {
        let mut config = short(Scenario::Duel);
        config.duration = 20.0;
        config.combat.enemy.max_health = 1.0;

        let summary = run(&config).unwrap();
        assert_eq!(summary.enemies_left, 0);
        assert!(summary.player_alive);
        assert_eq!(summary.events.count("death"), 1);
        assert!(summary.sim_time < 20.0);
    }

    #[test]
    fn test_invalid_combat_config_is_an_error() {
        let mut config = short(Scenario::Duel);
        config.combat.parry.parry_window = -1.0;
        assert!(run(&config).is_err());
    }

    #[test]
    fn test_zero_duration_runs_nothing() {
        let mut config = short(Scenario::Duel);
        config.duration = 0.0;
        let summary = run(&config).unwrap();
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.enemies_left, 1);
    }
}
