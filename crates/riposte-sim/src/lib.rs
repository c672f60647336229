//! # Riposte Sim
//!
//! Headless driver for the Riposte combat core.
//!
//! Loads a run configuration, spawns a scenario on a flat arena and lets a
//! scripted pilot fight it at a fixed timestep:
//! - Config: run, arena, pilot and combat tuning from `riposte.toml`
//! - Pilot: scripted player input and presentation callbacks
//! - Report: per-event tallies, optionally logged as JSON

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod arena;
pub mod config;
pub mod pilot;
pub mod report;
pub mod timing;

pub use arena::{run, RunSummary};
pub use config::{PilotConfig, Scenario, SimConfig, CONFIG_FILE};
