//! Boss pattern selection and attack timelines.
//!
//! A boss is a generic enemy whose Chase state consults a [`BossBrain`]
//! instead of the standard melee/spell choice. Selection is bucketed by
//! distance to the target:
//!
//! | Bucket | Distance | Choices |
//! |---|---|---|
//! | Melee | `d <= melee_range` | Slash / Lunge, with combo continuation |
//! | Mid | `melee_range < d <= mid_range` | Lunge / Slam / Gaze |
//! | Long | `d > mid_range` | Beam / Charge |

use riposte_common::{CombatError, CombatResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BossConfig;
use crate::scheduler::Step;
use crate::timeline::{self, CombatAction, Strike};

/// Time the lunge travels before its hit phase.
pub const LUNGE_TRAVEL: f32 = 0.2;

/// Boss attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossAttack {
    /// Close swipe
    Slash,
    /// Short dash into a swipe
    Lunge,
    /// Area slam around the boss
    Slam,
    /// Directional gaze
    Gaze,
    /// Channelled beam
    Beam,
    /// Long charge across the arena
    Charge,
}

/// Category of a boss attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackCategory {
    /// Close-range swing
    Melee,
    /// Area of effect
    Area,
    /// Ranged, resolves at once
    Ranged,
    /// Ranged, damages over time
    Channel,
    /// Gap-closing movement
    Movement,
}

impl BossAttack {
    /// Category of the attack.
    #[must_use]
    pub const fn category(self) -> AttackCategory {
        match self {
            Self::Slash | Self::Lunge => AttackCategory::Melee,
            Self::Slam => AttackCategory::Area,
            Self::Gaze => AttackCategory::Ranged,
            Self::Beam => AttackCategory::Channel,
            Self::Charge => AttackCategory::Movement,
        }
    }

    /// Whether a counter can parry the attack's telegraph.
    #[must_use]
    pub const fn parryable(self) -> bool {
        matches!(self.category(), AttackCategory::Melee)
    }

    /// Label used for the timed task.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Slash => "boss.slash",
            Self::Lunge => "boss.lunge",
            Self::Slam => "boss.slam",
            Self::Gaze => "boss.gaze",
            Self::Beam => "boss.beam",
            Self::Charge => "boss.charge",
        }
    }
}

/// Distance bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeBucket {
    /// `d <= melee_range`
    Melee,
    /// `melee_range < d <= mid_range`
    Mid,
    /// `d > mid_range`
    Long,
}

impl RangeBucket {
    /// Classifies a distance. Boundaries belong to the nearer bucket.
    #[must_use]
    pub fn classify(distance: f32, melee_range: f32, mid_range: f32) -> Self {
        if distance <= melee_range {
            Self::Melee
        } else if distance <= mid_range {
            Self::Mid
        } else {
            Self::Long
        }
    }
}

/// Selector weights. Every value is a probability in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossWeights {
    /// Melee bucket: chance of Slash when no combo is running.
    pub slash: f32,
    /// Chance of repeating the last melee attack on its first repeat.
    pub repeat_base: f32,
    /// Extra repeat chance per attack already in the streak.
    pub repeat_step: f32,
    /// Upper bound on the repeat chance.
    pub repeat_cap: f32,
    /// Mid bucket: rolls below this pick Lunge.
    pub mid_lunge_below: f32,
    /// Mid bucket: rolls below this (and above Lunge's) pick Slam; the rest Gaze.
    pub mid_slam_below: f32,
    /// Long bucket: rolls below this pick Beam; the rest Charge.
    pub long_beam_below: f32,
}

impl Default for BossWeights {
    fn default() -> Self {
        Self {
            slash: 0.5,
            repeat_base: 0.3,
            repeat_step: 0.15,
            repeat_cap: 0.75,
            mid_lunge_below: 0.25,
            mid_slam_below: 0.55,
            long_beam_below: 0.5,
        }
    }
}

impl BossWeights {
    /// Validates that every weight is a probability and thresholds ascend.
    pub fn validate(&self) -> CombatResult<()> {
        let unit = [
            ("boss.weights.slash", self.slash),
            ("boss.weights.repeat_base", self.repeat_base),
            ("boss.weights.repeat_step", self.repeat_step),
            ("boss.weights.repeat_cap", self.repeat_cap),
            ("boss.weights.mid_lunge_below", self.mid_lunge_below),
            ("boss.weights.mid_slam_below", self.mid_slam_below),
            ("boss.weights.long_beam_below", self.long_beam_below),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(CombatError::invalid(field, "must be in [0, 1]"));
            }
        }
        if self.mid_slam_below < self.mid_lunge_below {
            return Err(CombatError::invalid(
                "boss.weights.mid_slam_below",
                "must not be below mid_lunge_below",
            ));
        }
        Ok(())
    }

    /// Chance of repeating a melee attack already used `streak` times in a row.
    #[must_use]
    pub fn repeat_chance(&self, streak: u32) -> f32 {
        let repeats = streak.saturating_sub(1) as f32;
        (self.repeat_base + self.repeat_step * repeats).min(self.repeat_cap)
    }
}

/// Boss-specific state layered on the enemy machine.
#[derive(Debug, Clone)]
pub struct BossBrain {
    config: BossConfig,
    last: Option<BossAttack>,
    streak: u32,
    armor_triggered: bool,
    current: Option<BossAttack>,
    charging: bool,
}

impl BossBrain {
    /// Creates a boss brain.
    #[must_use]
    pub fn new(config: BossConfig) -> Self {
        Self {
            config,
            last: None,
            streak: 0,
            armor_triggered: false,
            current: None,
            charging: false,
        }
    }

    /// Boss tuning.
    #[must_use]
    pub const fn config(&self) -> &BossConfig {
        &self.config
    }

    /// Last selected attack.
    #[must_use]
    pub const fn last(&self) -> Option<BossAttack> {
        self.last
    }

    /// Consecutive selections of the last attack.
    #[must_use]
    pub const fn streak(&self) -> u32 {
        self.streak
    }

    /// Attack currently running, if any.
    #[must_use]
    pub const fn current(&self) -> Option<BossAttack> {
        self.current
    }

    /// Checks if the armor phase has been triggered.
    #[must_use]
    pub const fn armor_triggered(&self) -> bool {
        self.armor_triggered
    }

    /// Checks if a charge is in its moving phase.
    #[must_use]
    pub const fn is_charging(&self) -> bool {
        self.charging
    }

    /// Picks the next attack for a target at `distance`.
    pub fn select(&mut self, distance: f32, rng: &mut fastrand::Rng) -> BossAttack {
        let weights = &self.config.weights;
        let bucket =
            RangeBucket::classify(distance, self.config.enemy.melee_range, self.config.mid_range);
        let roll = rng.f32();

        let attack = match bucket {
            RangeBucket::Melee => match self.last {
                Some(last) if last.category() == AttackCategory::Melee => {
                    if roll < weights.repeat_chance(self.streak) {
                        last
                    } else if last == BossAttack::Slash {
                        BossAttack::Lunge
                    } else {
                        BossAttack::Slash
                    }
                },
                _ => {
                    if roll < weights.slash {
                        BossAttack::Slash
                    } else {
                        BossAttack::Lunge
                    }
                },
            },
            RangeBucket::Mid => {
                if roll < weights.mid_lunge_below {
                    BossAttack::Lunge
                } else if roll < weights.mid_slam_below {
                    BossAttack::Slam
                } else {
                    BossAttack::Gaze
                }
            },
            RangeBucket::Long => {
                if roll < weights.long_beam_below {
                    BossAttack::Beam
                } else {
                    BossAttack::Charge
                }
            },
        };

        if self.last == Some(attack) {
            self.streak += 1;
        } else {
            self.streak = 1;
        }
        self.last = Some(attack);
        self.current = Some(attack);
        debug!(?attack, ?bucket, distance, streak = self.streak, "boss attack selected");
        attack
    }

    /// Checks the armor threshold. Returns `true` only the first time it is crossed.
    pub fn check_armor(&mut self, health_fraction: f32) -> bool {
        if self.armor_triggered || health_fraction > self.config.armor_threshold {
            return false;
        }
        self.armor_triggered = true;
        true
    }

    /// Step list for an attack.
    #[must_use]
    pub fn timeline(&self, attack: BossAttack) -> Vec<Step<CombatAction>> {
        let config = &self.config;
        let brace = CombatAction::Brace {
            factor: config.telegraph_slowdown,
        };
        let strike = CombatAction::Strike(Strike::Boss(attack));

        // Every boss windup holds position until EndWindup
        let mut steps = vec![Step::now(CombatAction::Hold)];
        steps.extend(match attack {
            BossAttack::Slash => timeline::attack(
                &config.slash,
                Strike::Boss(attack),
                config.telegraph_slowdown,
                attack.parryable(),
            ),
            BossAttack::Slam => timeline::attack(
                &config.slam,
                Strike::Boss(attack),
                config.telegraph_slowdown,
                attack.parryable(),
            ),
            BossAttack::Lunge => {
                let lunge = &config.lunge;
                let mut steps = vec![Step::now(brace)];
                if let Some(duration) = lunge.telegraph {
                    steps.push(Step::now(CombatAction::Telegraph {
                        duration,
                        parryable: attack.parryable(),
                    }));
                }
                steps.extend([
                    Step::after(lunge.hit_offset, CombatAction::EndWindup),
                    Step::now(CombatAction::Surge {
                        speed: config.lunge_speed,
                    }),
                    Step::after(LUNGE_TRAVEL, strike),
                    Step::now(CombatAction::Halt),
                    Step::after(lunge.recovery, CombatAction::Finish),
                ]);
                steps
            },
            BossAttack::Gaze => vec![
                Step::now(brace),
                Step::now(CombatAction::Telegraph {
                    duration: config.gaze.telegraph,
                    parryable: false,
                }),
                Step::after(config.gaze.telegraph, CombatAction::EndWindup),
                Step::now(strike),
                Step::after(config.gaze.recovery, CombatAction::Finish),
            ],
            BossAttack::Beam => {
                let beam = &config.beam;
                let mut steps = vec![
                    Step::now(brace),
                    Step::now(CombatAction::Telegraph {
                        duration: beam.telegraph,
                        parryable: false,
                    }),
                    Step::after(beam.telegraph, CombatAction::EndWindup),
                    Step::now(CombatAction::Halt),
                    Step::now(strike),
                ];
                for _ in 1..beam.ticks {
                    steps.push(Step::after(beam.tick_interval, strike));
                }
                steps.push(Step::after(beam.recovery, CombatAction::Finish));
                steps
            },
            BossAttack::Charge => {
                let charge = &config.charge;
                vec![
                    Step::now(brace),
                    Step::now(CombatAction::Telegraph {
                        duration: charge.telegraph,
                        parryable: false,
                    }),
                    Step::after(charge.telegraph, CombatAction::EndWindup),
                    Step::now(CombatAction::Strike(Strike::Boss(BossAttack::Gaze))),
                    Step::now(CombatAction::Charge {
                        speed: charge.speed,
                    }),
                    Step::after(charge.max_duration, CombatAction::Halt),
                    Step::after(charge.recovery, CombatAction::Finish),
                ]
            },
        });
        steps
    }

    /// Steps that replace a charge cut short by a wall or by contact.
    #[must_use]
    pub fn charge_cutoff(&self, contact: bool) -> Vec<Step<CombatAction>> {
        let mut steps = Vec::with_capacity(3);
        if contact {
            steps.push(Step::now(CombatAction::Strike(Strike::Boss(BossAttack::Charge))));
        }
        steps.push(Step::now(CombatAction::Halt));
        steps.push(Step::after(self.config.charge.recovery, CombatAction::Finish));
        steps
    }

    pub(crate) fn begin_charge(&mut self) {
        self.charging = true;
    }

    pub(crate) fn end_charge(&mut self) {
        self.charging = false;
    }

    pub(crate) fn finish(&mut self) {
        self.current = None;
        self.charging = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brain_with(weights: BossWeights) -> BossBrain {
        BossBrain::new(BossConfig {
            weights,
            ..BossConfig::default()
        })
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(RangeBucket::classify(2.5, 2.5, 7.0), RangeBucket::Melee);
        assert_eq!(RangeBucket::classify(2.51, 2.5, 7.0), RangeBucket::Mid);
        assert_eq!(RangeBucket::classify(7.0, 2.5, 7.0), RangeBucket::Mid);
        assert_eq!(RangeBucket::classify(7.01, 2.5, 7.0), RangeBucket::Long);
    }

    #[test]
    fn test_mid_bucket_weights() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut brain = brain_with(BossWeights {
            mid_lunge_below: 0.0,
            mid_slam_below: 1.0,
            ..BossWeights::default()
        });
        for _ in 0..20 {
            assert_eq!(brain.select(5.0, &mut rng), BossAttack::Slam);
        }
    }

    #[test]
    fn test_long_bucket_weights() {
        let mut rng = fastrand::Rng::with_seed(2);
        let mut brain = brain_with(BossWeights {
            long_beam_below: 0.0,
            ..BossWeights::default()
        });
        assert_eq!(brain.select(20.0, &mut rng), BossAttack::Charge);
    }

    #[test]
    fn test_melee_combo_continuation() {
        let mut rng = fastrand::Rng::with_seed(3);
        let mut brain = brain_with(BossWeights {
            slash: 1.0,
            repeat_base: 1.0,
            repeat_cap: 1.0,
            ..BossWeights::default()
        });
        for expected in 1..=4 {
            assert_eq!(brain.select(1.0, &mut rng), BossAttack::Slash);
            assert_eq!(brain.streak(), expected);
        }
    }

    #[test]
    fn test_melee_breaks_combo() {
        let mut rng = fastrand::Rng::with_seed(4);
        let mut brain = brain_with(BossWeights {
            slash: 1.0,
            repeat_base: 0.0,
            repeat_step: 0.0,
            ..BossWeights::default()
        });
        assert_eq!(brain.select(1.0, &mut rng), BossAttack::Slash);
        assert_eq!(brain.select(1.0, &mut rng), BossAttack::Lunge);
        assert_eq!(brain.select(1.0, &mut rng), BossAttack::Slash);
        assert_eq!(brain.streak(), 1);
    }

    #[test]
    fn test_repeat_chance_is_capped() {
        let weights = BossWeights::default();
        assert!((weights.repeat_chance(1) - 0.3).abs() < 1e-6);
        assert!((weights.repeat_chance(2) - 0.45).abs() < 1e-6);
        assert_eq!(weights.repeat_chance(50), 0.75);
    }

    #[test]
    fn test_selection_is_deterministic_for_a_seed() {
        let run = |seed| {
            let mut rng = fastrand::Rng::with_seed(seed);
            let mut brain = BossBrain::new(BossConfig::default());
            [1.0, 4.0, 12.0, 2.0, 6.0, 30.0]
                .iter()
                .map(|d| brain.select(*d, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_armor_triggers_once() {
        let mut brain = BossBrain::new(BossConfig::default());
        assert!(!brain.check_armor(0.8));
        assert!(brain.check_armor(0.5));
        assert!(!brain.check_armor(0.3));
        // Healed above and crossing again does nothing
        assert!(!brain.check_armor(0.9));
        assert!(!brain.check_armor(0.1));
        assert!(brain.armor_triggered());
    }

    #[test]
    fn test_beam_ticks_are_separate_hit_phases() {
        let brain = BossBrain::new(BossConfig::default());
        let steps = brain.timeline(BossAttack::Beam);
        assert_eq!(timeline::strike_count(&steps), brain.config().beam.ticks as usize);
    }

    #[test]
    fn test_charge_includes_gaze_check() {
        let brain = BossBrain::new(BossConfig::default());
        let steps = brain.timeline(BossAttack::Charge);
        assert!(steps
            .iter()
            .any(|s| s.action == CombatAction::Strike(Strike::Boss(BossAttack::Gaze))));
        assert!(steps
            .iter()
            .any(|s| matches!(s.action, CombatAction::Charge { .. })));
        assert_eq!(timeline::strike_count(&brain.charge_cutoff(false)), 0);
        assert_eq!(timeline::strike_count(&brain.charge_cutoff(true)), 1);
    }

    #[test]
    fn test_windups_hold_until_end() {
        let brain = BossBrain::new(BossConfig::default());
        for attack in [
            BossAttack::Slash,
            BossAttack::Slam,
            BossAttack::Lunge,
            BossAttack::Gaze,
            BossAttack::Beam,
            BossAttack::Charge,
        ] {
            let steps = brain.timeline(attack);
            assert_eq!(steps[0].action, CombatAction::Hold, "{attack:?}");
            assert_eq!(steps[0].duration, 0.0);
            let hold = steps.iter().position(|s| s.action == CombatAction::Hold);
            let end = steps.iter().position(|s| s.action == CombatAction::EndWindup);
            assert!(hold < end, "{attack:?}");
        }
    }

    #[test]
    fn test_only_melee_is_parryable() {
        assert!(BossAttack::Slash.parryable());
        assert!(BossAttack::Lunge.parryable());
        assert!(!BossAttack::Slam.parryable());
        assert!(!BossAttack::Gaze.parryable());
        assert!(!BossAttack::Beam.parryable());
        assert!(!BossAttack::Charge.parryable());
    }

    #[test]
    fn test_weights_validate() {
        assert!(BossWeights::default().validate().is_ok());
        let bad = BossWeights {
            mid_lunge_below: 0.8,
            mid_slam_below: 0.2,
            ..BossWeights::default()
        };
        assert!(bad.validate().is_err());
        let out_of_range = BossWeights {
            slash: 1.5,
            ..BossWeights::default()
        };
        assert!(out_of_range.validate().is_err());
    }
}
