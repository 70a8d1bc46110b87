//! Default initialization of servers and databases with no persisted state.

use std::collections::BTreeMap;

use growth_core::{
    derive_seed, table_size_mb, DatabaseState, RandomSource, Result, SeededRandom, ServerProfile,
    ServerState, SimError, SimulatorConfig, TableState,
};

use crate::store::StateStore;

/// New tables never take more than this share of the data file.
const TABLE_FILL_LIMIT: f64 = 0.9;

/// Relative growth weight of a new table is drawn from this range.
const TABLE_SHARE_RANGE: (f64, f64) = (0.5, 2.0);

/// Server state ready for the next period.
#[derive(Debug, Clone)]
pub struct LoadedState {
    pub state: ServerState,
    /// No state file existed; every database was initialized
    pub fresh: bool,
    /// Databases configured after the state was first written
    pub added_databases: Vec<String>,
}

/// Build the baseline state of one database from its server type's
/// template and table pattern, honouring any pattern assignment.
pub fn initialize_database<R: RandomSource>(
    profile: &ServerProfile,
    database_name: &str,
    config: &SimulatorConfig,
    rng: &mut R,
) -> Result<DatabaseState> {
    let template = config.template_for(profile.server_type)?;
    let table_pattern = config.table_pattern_for(profile.server_type)?;
    let growth_pattern = config.pattern_for_new_database(profile, database_name)?;

    let data_file_size_mb = match config
        .assignment_for(&profile.server_name, database_name)
        .and_then(|a| a.start_size_mb)
    {
        Some(start_mb) => start_mb,
        None => rng
            .uniform(template.initial_data_mb.min, template.initial_data_mb.max)
            .round(),
    };

    let table_count = rng.int_range(table_pattern.table_count.min, table_pattern.table_count.max);
    let mut drafts: Vec<(u64, u64, bool, f64)> = (0..table_count)
        .map(|_| {
            let rows = rng.int_range(
                table_pattern.initial_rows.min,
                table_pattern.initial_rows.max,
            );
            let row_bytes = rng.int_range(
                table_pattern.avg_row_bytes.min,
                table_pattern.avg_row_bytes.max,
            );
            let has_cleanup = rng.chance(table_pattern.cleanup_probability);
            let share = rng.uniform(TABLE_SHARE_RANGE.0, TABLE_SHARE_RANGE.1);
            (rows, row_bytes.max(1), has_cleanup, share)
        })
        .collect();

    let table_total_mb: f64 = drafts
        .iter()
        .map(|(rows, bytes, _, _)| table_size_mb(*rows, *bytes))
        .sum();
    let budget_mb = data_file_size_mb * TABLE_FILL_LIMIT;
    if table_total_mb > budget_mb {
        let scale = budget_mb / table_total_mb;
        for draft in &mut drafts {
            draft.0 = (draft.0 as f64 * scale).floor() as u64;
        }
    }

    let tables: BTreeMap<String, TableState> = drafts
        .into_iter()
        .enumerate()
        .map(|(index, (rows, row_bytes, has_cleanup, share))| {
            let name = format!("Table_{:02}", index + 1);
            let table = TableState::new(name.clone(), rows, row_bytes, has_cleanup, share);
            (name, table)
        })
        .collect();

    Ok(DatabaseState {
        server_name: profile.server_name.clone(),
        database_name: database_name.to_string(),
        server_type: profile.server_type,
        growth_pattern,
        baseline_data_mb: data_file_size_mb,
        data_file_size_mb,
        log_file_size_mb: (data_file_size_mb * template.log_ratio).round(),
        file_count: template.file_policy.file_count_for(data_file_size_mb).max(1),
        last_period_end: None,
        cumulative_reads: 0,
        cumulative_writes: 0,
        data_growth_carry_mb: 0.0,
        log_growth_carry_mb: 0.0,
        tables,
    })
}

/// Baseline state for every database of a server.
///
/// Each database draws from its own seed derived from `seed`, the server and
/// the database name, so adding a database does not change the others.
pub fn initialize_server(
    profile: &ServerProfile,
    config: &SimulatorConfig,
    seed: u64,
) -> Result<ServerState> {
    let mut state = ServerState::default();
    for database_name in &profile.database_names {
        state.insert(baseline_database(profile, database_name, config, seed)?);
    }
    Ok(state)
}

fn baseline_database(
    profile: &ServerProfile,
    database_name: &str,
    config: &SimulatorConfig,
    seed: u64,
) -> Result<DatabaseState> {
    let mut rng = SeededRandom::new(derive_seed(
        seed,
        &[profile.server_name.as_str(), database_name, "baseline"],
    ));
    initialize_database(profile, database_name, config, &mut rng)
}

/// Load a server's state, initializing it when no state exists and adding
/// baseline entries for newly configured databases.
///
/// Persisted databases the configuration no longer lists, or listed under a
/// different server type, are a [`SimError::Config`].
pub fn load_or_initialize<S: StateStore + ?Sized>(
    store: &S,
    profile: &ServerProfile,
    config: &SimulatorConfig,
    seed: u64,
) -> Result<LoadedState> {
    let Some(mut state) = store.load(&profile.server_name)? else {
        let state = initialize_server(profile, config, seed)?;
        tracing::info!(
            "Initialized {} with {} databases from the {} baseline",
            profile.server_name,
            state.len(),
            profile.server_type
        );
        return Ok(LoadedState {
            state,
            fresh: true,
            added_databases: Vec::new(),
        });
    };

    for database in state.databases.values() {
        if !profile.database_names.contains(&database.database_name) {
            return Err(SimError::config(format!(
                "state of {} holds database '{}' which is not configured for it",
                profile.server_name, database.database_name
            )));
        }
        if database.server_type != profile.server_type {
            return Err(SimError::config(format!(
                "{}/{} was persisted as {} but the server is configured as {}",
                profile.server_name,
                database.database_name,
                database.server_type,
                profile.server_type
            )));
        }
    }

    let last_period_end = state.last_period_end();
    let mut added_databases = Vec::new();
    for database_name in &profile.database_names {
        if state.get(database_name).is_some() {
            continue;
        }
        let mut database = baseline_database(profile, database_name, config, seed)?;
        // joins the server's timeline at its current position
        database.last_period_end = last_period_end;
        state.insert(database);
        added_databases.push(database_name.clone());
    }
    if !added_databases.is_empty() {
        tracing::info!(
            "Added {} new databases to {}: {}",
            added_databases.len(),
            profile.server_name,
            added_databases.join(", ")
        );
    }

    Ok(LoadedState {
        state,
        fresh: false,
        added_databases,
    })
}
