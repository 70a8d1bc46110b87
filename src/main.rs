//! Command-line interface for growth-sim
//!
//! # Usage Examples
//!
//! ```bash
//! # One period for every server, fresh random seed
//! growth-sim simulate --output-dir output
//!
//! # Reproducible multi-period run for two servers
//! growth-sim simulate --seed 42 --periods 6 --server Server1 --server Server2
//!
//! # Custom configuration
//! growth-sim print-config > fleet.yaml
//! growth-sim validate-config --config fleet.yaml
//! growth-sim simulate --config fleet.yaml
//!
//! # Diagnostics
//! growth-sim status --output-dir output
//! growth-sim next-period --server Server3
//!
//! # Discard one server's state and output
//! growth-sim reset --server Server2 --yes
//! ```

use clap::{Parser, Subcommand};
use growth_core::BUILTIN_CONFIG_YAML;
use growth_engine::next_period;
use growth_sim::report::{format_run_summary, format_status};
use growth_sim::{
    collect_status, load_config, reset_server, run_simulation, OutputOpts, RunOptions,
};
use state_store::{FilesystemStateStore, StateStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "growth-sim")]
#[command(about = "Synthetic database storage growth telemetry generator")]
#[command(long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Advance every selected server by one or more 12-hour periods
    Simulate {
        #[command(flatten)]
        opts: OutputOpts,

        /// Base random seed (random when omitted; logged either way)
        #[arg(long)]
        seed: Option<u64>,

        /// Number of periods to advance
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        periods: u32,

        /// Only advance these servers (repeatable)
        #[arg(long = "server", value_name = "NAME")]
        servers: Vec<String>,
    },

    /// Show the persisted state of every configured server
    Status {
        #[command(flatten)]
        opts: OutputOpts,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the period the next run would simulate for a server
    NextPeriod {
        /// Root directory holding one subdirectory per server
        #[arg(long, default_value = "output", env = "GROWTH_SIM_OUTPUT_DIR")]
        output_dir: std::path::PathBuf,

        /// Server name, e.g. Server1
        #[arg(long)]
        server: String,
    },

    /// Delete one server's state, snapshots and events so the next run
    /// starts it from its baseline
    Reset {
        #[command(flatten)]
        opts: OutputOpts,

        /// Server name, e.g. Server1
        #[arg(long)]
        server: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Print the built-in configuration as YAML
    PrintConfig,

    /// Load and validate a configuration file
    ValidateConfig {
        #[arg(long, value_name = "PATH")]
        config: std::path::PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if cli.verbose => EnvFilter::new("debug"),
        Err(_) => EnvFilter::new("info"),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Simulate {
            opts,
            seed,
            periods,
            servers,
        } => {
            let config = opts.load_config()?;
            let seed = seed.unwrap_or_else(rand::random);
            tracing::info!(
                "Simulating {periods} period(s) into {:?} (seed={seed})",
                opts.output_dir
            );

            let summary = run_simulation(
                &config,
                &RunOptions {
                    output_dir: opts.output_dir.clone(),
                    seed,
                    periods,
                    servers,
                },
            )?;
            print!("{}", format_run_summary(&summary));

            if !summary.is_success() {
                anyhow::bail!(
                    "{} of {} servers failed",
                    summary.failed_servers().len(),
                    summary.server_count
                );
            }
        }
        Commands::Status { opts, json } => {
            let config = opts.load_config()?;
            let statuses = collect_status(&config, &opts.output_dir)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&statuses)?);
            } else {
                print!("{}", format_status(&statuses));
            }
        }
        Commands::NextPeriod { output_dir, server } => {
            let store = FilesystemStateStore::new(&output_dir);
            let prior_end = store
                .load(&server)?
                .and_then(|state| state.last_period_end());
            let period = next_period(prior_end)?;
            println!(
                "{server}: {} -> {} ({})",
                period.start, period.end, period.kind
            );
        }
        Commands::Reset { opts, server, yes } => {
            if !yes {
                anyhow::bail!(
                    "reset deletes all simulated history of {server} under {:?}; pass --yes to confirm",
                    opts.output_dir
                );
            }
            let config = opts.load_config()?;
            let outcome = reset_server(&config, &opts.output_dir, &server)?;
            println!(
                "{server}: removed {} snapshots and {} event files{}",
                outcome.snapshot_files,
                outcome.event_files,
                if outcome.had_state { " and the state file" } else { "" }
            );
        }
        Commands::PrintConfig => {
            print!("{BUILTIN_CONFIG_YAML}");
        }
        Commands::ValidateConfig { config } => {
            let loaded = load_config(Some(&config))?;
            let servers = loaded.resolve_servers()?;
            println!(
                "{} is valid: {} servers, {} patterns, {} anomalies",
                config.display(),
                servers.len(),
                loaded.patterns.len(),
                loaded.anomalies.len()
            );
        }
    }

    Ok(())
}
