//! Run orchestration: every configured server advanced by one period per
//! pass.

use std::collections::BTreeSet;
use std::path::PathBuf;

use growth_core::{
    derive_seed, PatternLibrary, SeededRandom, ServerProfile, SimError, SimulationPeriod,
    SimulatorConfig,
};
use growth_engine::{advance_database, next_period, DatabaseAdvance, SimulationContext};
use state_store::{load_or_initialize, FilesystemStateStore, StateStore};

use crate::emit::Emitter;

/// Options of one simulator run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_dir: PathBuf,
    /// Base seed; every database and period derives its own seed from it
    pub seed: u64,
    /// Number of passes, each advancing every server by one period
    pub periods: u32,
    /// Servers to process; empty means all configured servers
    pub servers: Vec<String>,
}

/// A server that advanced one period.
#[derive(Debug, Clone)]
pub struct ServerAdvance {
    pub server_name: String,
    pub period: SimulationPeriod,
    pub databases: usize,
    pub autogrowth_events: usize,
    pub cleanups: usize,
    /// No state existed before this period
    pub initialized: bool,
    pub total_size_mb: f64,
    pub files: Vec<PathBuf>,
}

/// A server whose period was aborted. Its state and files are untouched.
#[derive(Debug, thiserror::Error)]
#[error("{}: {error}", location(.server_name, .database_name))]
pub struct ServerFailure {
    pub server_name: String,
    pub database_name: Option<String>,
    pub pass: u32,
    #[source]
    pub error: SimError,
}

fn location(server_name: &str, database_name: &Option<String>) -> String {
    match database_name {
        Some(database_name) => format!("{server_name}/{database_name}"),
        None => server_name.to_string(),
    }
}

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub seed: u64,
    /// Servers selected for the run
    pub server_count: usize,
    pub advances: Vec<ServerAdvance>,
    pub failures: Vec<ServerFailure>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_servers(&self) -> BTreeSet<&str> {
        self.failures
            .iter()
            .map(|f| f.server_name.as_str())
            .collect()
    }
}

/// Select the servers a run processes, in configuration order.
pub fn select_servers(
    config: &SimulatorConfig,
    names: &[String],
) -> growth_core::Result<Vec<ServerProfile>> {
    let profiles = config.resolve_servers()?;
    if names.is_empty() {
        return Ok(profiles);
    }
    for name in names {
        if !profiles.iter().any(|p| &p.server_name == name) {
            return Err(SimError::config(format!("server '{name}' is not configured")));
        }
    }
    Ok(profiles
        .into_iter()
        .filter(|p| names.contains(&p.server_name))
        .collect())
}

/// Run `options.periods` passes over the selected servers.
///
/// A failing server is recorded and skipped for the remaining passes; the
/// other servers keep going. Configuration problems that affect every server
/// fail the whole run.
pub fn run_simulation(
    config: &SimulatorConfig,
    options: &RunOptions,
) -> growth_core::Result<RunSummary> {
    let library = config.pattern_library()?;
    let profiles = select_servers(config, &options.servers)?;
    let store = FilesystemStateStore::new(&options.output_dir);

    let mut summary = RunSummary {
        seed: options.seed,
        server_count: profiles.len(),
        ..RunSummary::default()
    };

    for pass in 1..=options.periods {
        tracing::info!(
            "Pass {pass}/{}: advancing {} servers",
            options.periods,
            profiles.len()
        );
        for profile in &profiles {
            if summary.failed_servers().contains(profile.server_name.as_str()) {
                continue;
            }
            match advance_server(&store, profile, config, &library, options.seed) {
                Ok(advance) => {
                    tracing::info!(
                        "Advanced {} to {} ({} databases, {} autogrowth events)",
                        advance.server_name,
                        advance.period.end,
                        advance.databases,
                        advance.autogrowth_events
                    );
                    summary.advances.push(advance);
                }
                Err(mut failure) => {
                    failure.pass = pass;
                    tracing::warn!("Skipping {}: {failure}", profile.server_name);
                    summary.failures.push(failure);
                }
            }
        }
    }
    Ok(summary)
}

/// Advance one server by one period.
///
/// Everything is computed in memory first. Files are then written and the
/// state saved; if any write fails the files already written are rolled back
/// and the previous state stays in place.
pub fn advance_server(
    store: &FilesystemStateStore,
    profile: &ServerProfile,
    config: &SimulatorConfig,
    library: &PatternLibrary,
    seed: u64,
) -> Result<ServerAdvance, ServerFailure> {
    let fail = |database_name: Option<&str>, error: SimError| ServerFailure {
        server_name: profile.server_name.clone(),
        database_name: database_name.map(str::to_string),
        pass: 0,
        error,
    };

    let loaded = load_or_initialize(store, profile, config, seed).map_err(|e| fail(None, e))?;
    let period = next_period(loaded.state.last_period_end()).map_err(|e| fail(None, e))?;
    let period_label = period.start.format("%Y%m%dT%H%M%S").to_string();

    let mut new_state = loaded.state.clone();
    let mut advances: Vec<DatabaseAdvance> = Vec::with_capacity(profile.database_names.len());
    for database_name in &profile.database_names {
        let database = Some(database_name.as_str());
        let state = loaded.state.get(database_name).ok_or_else(|| {
            fail(
                database,
                SimError::corruption(
                    &profile.server_name,
                    database,
                    "database missing from loaded state",
                ),
            )
        })?;
        let template = config
            .template_for(state.server_type)
            .map_err(|e| fail(database, e))?;
        let ctx = SimulationContext {
            library,
            template,
            anomaly: config.anomaly_for(&profile.server_name, database_name),
        };
        let mut rng = SeededRandom::new(derive_seed(
            seed,
            &[
                profile.server_name.as_str(),
                database_name.as_str(),
                period_label.as_str(),
            ],
        ));
        let advance =
            advance_database(state, &ctx, &period, &mut rng).map_err(|e| fail(database, e))?;
        new_state.insert(advance.state.clone());
        advances.push(advance);
    }

    let mut emitter = Emitter::new(store.layout(&profile.server_name));
    if let Err((database_name, error)) = emit_all(&mut emitter, &advances) {
        emitter.rollback();
        return Err(fail(Some(database_name.as_str()), error));
    }
    if let Err(error) = store.save(&profile.server_name, &new_state) {
        emitter.rollback();
        return Err(fail(None, error));
    }

    Ok(ServerAdvance {
        server_name: profile.server_name.clone(),
        databases: advances.len(),
        autogrowth_events: advances.iter().map(|a| a.events.len()).sum(),
        cleanups: advances.iter().filter(|a| a.cleanup_fired).count(),
        initialized: loaded.fresh,
        total_size_mb: new_state
            .databases
            .values()
            .map(|d| d.total_size_mb())
            .sum(),
        files: emitter.commit(),
        period,
    })
}

fn emit_all(
    emitter: &mut Emitter,
    advances: &[DatabaseAdvance],
) -> Result<(), (String, SimError)> {
    for advance in advances {
        let database_name = || advance.snapshot.database_name.clone();
        emitter
            .write_snapshot(&advance.snapshot)
            .map_err(|e| (database_name(), e))?;
        if let Some(batch) = advance.event_batch() {
            emitter
                .write_events(&batch)
                .map_err(|e| (database_name(), e))?;
        }
    }
    Ok(())
}
