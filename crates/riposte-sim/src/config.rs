//! Sim configuration.
//!
//! Run, arena and pilot settings plus the full combat tuning document.
//! Configuration can be loaded from and saved to a TOML file.

use anyhow::Context;
use riposte_core::CombatConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Configuration file name.
pub const CONFIG_FILE: &str = "riposte.toml";

/// Which opponents the arena spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// One melee enemy
    #[default]
    Duel,
    /// A melee enemy and a caster
    Pack,
    /// The boss
    Boss,
}

/// Scripted player behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    /// Horizontal distance at which the pilot stops and swings
    pub reach: f32,
    /// Delay from swing start to the reported hit frame
    pub hit_frame_delay: f32,
    /// Delay from swing start to the reported swing end
    pub swing_length: f32,
    /// Counter parryable telegraphs
    pub parry: bool,
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            reach: 1.8,
            hit_frame_delay: 0.1,
            swing_length: 0.3,
            parry: true,
        }
    }
}

/// Sim configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Run Settings ===
    /// Opponents to spawn
    pub scenario: Scenario,
    /// Real seconds to simulate
    pub duration: f32,
    /// Simulation step
    pub fixed_dt: f32,
    /// Simulated frame length fed to the step accumulator
    pub frame_dt: f32,

    // === Arena Settings ===
    /// Distance from the center to each wall
    pub arena_half_width: f32,
    /// Downward acceleration
    pub gravity: f32,

    // === Output Settings ===
    /// Log every combat event as JSON
    pub json_events: bool,

    // === Pilot ===
    /// Scripted player
    pub pilot: PilotConfig,

    // === Combat ===
    /// Combat tuning
    pub combat: CombatConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            // Run
            scenario: Scenario::Duel,
            duration: 30.0,
            fixed_dt: 1.0 / 60.0,
            frame_dt: 1.0 / 60.0,

            // Arena
            arena_half_width: 12.0,
            gravity: 30.0,

            // Output
            json_events: false,

            pilot: PilotConfig::default(),
            combat: CombatConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load configuration from a specific path.
    ///
    /// A missing file yields the defaults. A file that cannot be read or
    /// parsed is an error, so a typo never runs the wrong scenario.
    pub fn load_from<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;

        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Clamp run settings to sensible ranges.
    ///
    /// Combat tuning is checked separately by [`CombatConfig::validate`].
    pub fn validate(&mut self) {
        self.duration = self.duration.clamp(0.0, 3600.0);
        self.fixed_dt = self.fixed_dt.clamp(1.0 / 480.0, 0.1);
        self.frame_dt = self.frame_dt.clamp(1.0 / 480.0, 0.25);
        self.arena_half_width = self.arena_half_width.clamp(4.0, 200.0);
        self.gravity = self.gravity.max(0.0);

        self.pilot.reach = self.pilot.reach.max(0.1);
        self.pilot.hit_frame_delay = self.pilot.hit_frame_delay.max(0.0);
        self.pilot.swing_length = self.pilot.swing_length.max(self.pilot.hit_frame_delay);
    }
}
