//! Riposte sim entry point.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use riposte_sim::{SimConfig, CONFIG_FILE};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Runs a headless Riposte arena scenario
#[derive(Debug, Parser)]
#[command(name = "riposte-sim")]
#[command(about = "Headless arena driver for the Riposte combat core", long_about = None)]
#[command(version)]
struct Args {
    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Write the default config to CONFIG and exit
    #[arg(long)]
    write_config: bool,

    /// Config file to load
    #[arg(value_name = "CONFIG", default_value = CONFIG_FILE)]
    config: PathBuf,
}

/// Main entry point.
fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::from_default_env().add_directive("riposte=info".parse()?);
    let layer = if args.json_logs {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };
    tracing_subscriber::registry().with(layer).with(filter).init();

    info!("Riposte sim starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = &args.config;
    if args.write_config {
        SimConfig::default().save_to(path)?;
        return Ok(());
    }

    let mut config = SimConfig::load_from(path)?;
    config.validate();

    let summary = riposte_sim::run(&config)?;
    info!(
        ticks = summary.ticks,
        sim_time = summary.sim_time,
        player_alive = summary.player_alive,
        enemies_left = summary.enemies_left,
        "Run complete"
    );
    summary.events.summary();

    info!("Riposte sim shutdown complete");
    Ok(())
}
