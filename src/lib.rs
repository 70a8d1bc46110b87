//! Storage growth simulator
//!
//! Produces synthetic, time-continuous database growth telemetry for a fleet
//! of simulated database servers. Each run advances every server by one
//! 12-hour period, writing per-database snapshots and autogrowth events and
//! persisting per-server state so the next run continues where this one
//! stopped.
//!
//! # Crates
//!
//! - `growth_core` - shared types, configuration, pattern library, errors
//! - `growth_engine` - period scheduler, growth engine, autogrowth detector
//! - `state_store` - per-server state persistence
//!
//! This crate ties them together: [`run_simulation`] orchestrates a run and
//! [`Emitter`] writes its output files.
//!
//! # CLI Usage
//!
//! ```bash
//! # Advance every configured server by one period
//! growth-sim simulate --output-dir output
//!
//! # Reproducible: four periods with a fixed seed
//! growth-sim simulate --output-dir output --seed 42 --periods 4
//!
//! # Inspect state without modifying it
//! growth-sim status --output-dir output
//!
//! # Start one server's history over
//! growth-sim reset --server Server2 --yes
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use growth_core::SimulatorConfig;

pub mod emit;
pub mod report;
pub mod reset;
pub mod run;
pub mod status;

pub use emit::Emitter;
pub use reset::{reset_server, ResetOutcome};
pub use run::{
    advance_server, run_simulation, select_servers, RunOptions, RunSummary, ServerAdvance,
    ServerFailure,
};
pub use status::{collect_status, ServerStatus, StateStatus};

#[derive(Parser, Clone, Debug)]
pub struct OutputOpts {
    /// Simulator configuration (YAML); the built-in configuration when omitted
    #[arg(long, value_name = "PATH", env = "GROWTH_SIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root directory holding one subdirectory per server
    #[arg(long, default_value = "output", env = "GROWTH_SIM_OUTPUT_DIR")]
    pub output_dir: PathBuf,
}

impl OutputOpts {
    pub fn load_config(&self) -> anyhow::Result<SimulatorConfig> {
        load_config(self.config.as_deref())
    }
}

/// Load and validate a configuration file, or the built-in configuration.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<SimulatorConfig> {
    match path {
        Some(path) => SimulatorConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {path:?}")),
        None => SimulatorConfig::builtin().context("Built-in configuration is invalid"),
    }
}
