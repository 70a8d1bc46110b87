//! Unit tests for the state-store crate.

use chrono::{NaiveDate, NaiveDateTime};
use growth_core::{
    CountRange, GrowthPatternKind, ServerProfile, ServerState, ServerType, SimError,
    SimulatorConfig,
};
use tempfile::TempDir;

use crate::{
    initialize_server, load_or_initialize, FilesystemStateStore, StateStore, STATE_FILE_NAME,
};

fn config() -> SimulatorConfig {
    SimulatorConfig::builtin().unwrap()
}

fn profile(config: &SimulatorConfig, server_name: &str) -> ServerProfile {
    config
        .resolve_servers()
        .unwrap()
        .into_iter()
        .find(|p| p.server_name == server_name)
        .unwrap()
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 5, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// Baseline state of Server1 as if one period had been simulated.
fn simulated_state(config: &SimulatorConfig) -> ServerState {
    let mut state = initialize_server(&profile(config, "Server1"), config, 42).unwrap();
    for database in state.databases.values_mut() {
        database.last_period_end = Some(at(1, 18));
    }
    state
}

fn write_raw(store: &FilesystemStateStore, server_name: &str, content: &str) {
    let path = store.state_path(server_name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

// ============================================================================
// Load / save
// ============================================================================

#[test]
fn test_missing_state_file_loads_none() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStateStore::new(dir.path());
    assert!(store.load("Server1").unwrap().is_none());
}

#[test]
fn test_save_then_load_roundtrip() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStateStore::new(dir.path());
    let config = config();
    let state = simulated_state(&config);

    store.save("Server1", &state).unwrap();
    let loaded = store.load("Server1").unwrap().unwrap();
    assert_eq!(loaded, state);

    // keyed by database name at the top level
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(store.state_path("Server1")).unwrap())
            .unwrap();
    assert!(json["PrimaryStore_DB"]["data_file_size_mb"].is_number());
    assert_eq!(json["PrimaryStore_DB"]["last_period_end"], "2025-05-01T18:00:00");
}

#[test]
fn test_save_leaves_no_temp_files() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStateStore::new(dir.path());
    let config = config();
    let state = simulated_state(&config);

    store.save("Server1", &state).unwrap();
    store.save("Server1", &state).unwrap();

    let names: Vec<String> = std::fs::read_dir(store.layout("Server1").growth_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec![STATE_FILE_NAME.to_string()]);
}

#[test]
fn test_save_rejects_invalid_state_and_keeps_previous() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStateStore::new(dir.path());
    let config = config();
    let state = simulated_state(&config);
    store.save("Server1", &state).unwrap();

    let mut broken = state.clone();
    broken
        .databases
        .get_mut("PrimaryStore_DB")
        .unwrap()
        .data_file_size_mb = -1.0;
    let err = store.save("Server1", &broken).unwrap_err();
    assert_eq!(err.kind(), "StateCorruptionError");

    assert_eq!(store.load("Server1").unwrap().unwrap(), state);
}

// ============================================================================
// Corruption detection
// ============================================================================

#[test]
fn test_malformed_json_is_corruption() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStateStore::new(dir.path());
    write_raw(&store, "Server1", "{ not json");

    let err = store.load("Server1").unwrap_err();
    assert!(matches!(err, SimError::StateCorruption { .. }));
    assert!(err.to_string().contains("Server1"));
}

#[test]
fn test_missing_field_is_corruption() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStateStore::new(dir.path());
    let config = config();

    let mut json = serde_json::to_value(simulated_state(&config)).unwrap();
    json["OrderProcessing_DB"]
        .as_object_mut()
        .unwrap()
        .remove("file_count");
    write_raw(&store, "Server1", &json.to_string());

    let err = store.load("Server1").unwrap_err();
    assert_eq!(err.kind(), "StateCorruptionError");
    assert!(err.to_string().contains("file_count"));
}

#[test]
fn test_databases_out_of_lockstep() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStateStore::new(dir.path());
    let config = config();

    let mut state = simulated_state(&config);
    state
        .databases
        .get_mut("CustomerCore_DB")
        .unwrap()
        .last_period_end = Some(at(2, 6));
    write_raw(&store, "Server1", &serde_json::to_string(&state).unwrap());

    let err = store.load("Server1").unwrap_err();
    assert!(err.to_string().contains("disagree on last_period_end"));
}

#[test]
fn test_cleanup_after_period_end() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStateStore::new(dir.path());
    let config = config();

    let mut state = simulated_state(&config);
    let table = state
        .databases
        .get_mut("PrimaryStore_DB")
        .unwrap()
        .tables
        .get_mut("Table_01")
        .unwrap();
    table.last_cleanup_period = Some(at(3, 6));
    write_raw(&store, "Server1", &serde_json::to_string(&state).unwrap());

    let err = store.load("Server1").unwrap_err();
    assert!(
        matches!(err, SimError::StateCorruption { ref location, .. } if location == "Server1/PrimaryStore_DB")
    );
}

#[test]
fn test_drifted_table_size_is_corruption() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStateStore::new(dir.path());
    let config = config();

    let mut state = simulated_state(&config);
    let table = state
        .databases
        .get_mut("CustomerCore_DB")
        .unwrap()
        .tables
        .get_mut("Table_02")
        .unwrap();
    table.size_mb += 0.5;
    write_raw(&store, "Server1", &serde_json::to_string(&state).unwrap());

    let err = store.load("Server1").unwrap_err();
    assert_eq!(err.kind(), "StateCorruptionError");
    assert!(err.to_string().contains("Table_02"));
    assert!(err.to_string().contains("does not match"));

    // the file is reported, not rewritten
    let on_disk: ServerState =
        serde_json::from_str(&std::fs::read_to_string(store.state_path("Server1")).unwrap())
            .unwrap();
    assert_eq!(on_disk, state);
}

#[test]
fn test_tables_larger_than_data_file_is_corruption() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStateStore::new(dir.path());
    let config = config();

    let mut state = simulated_state(&config);
    let database = state.databases.get_mut("OrderProcessing_DB").unwrap();
    database.data_file_size_mb = database.table_floor_mb() * 0.99;
    write_raw(&store, "Server1", &serde_json::to_string(&state).unwrap());

    let err = store.load("Server1").unwrap_err();
    assert!(
        matches!(err, SimError::StateCorruption { ref location, .. } if location == "Server1/OrderProcessing_DB")
    );
    assert!(err.to_string().contains("tables hold"));
}

#[test]
fn test_mismatched_key_is_corruption() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStateStore::new(dir.path());
    let config = config();

    let mut state = simulated_state(&config);
    let mut moved = state.databases.remove("PrimaryStore_DB").unwrap();
    moved.database_name = "Renamed_DB".to_string();
    state.databases.insert("PrimaryStore_DB".to_string(), moved);
    write_raw(&store, "Server1", &serde_json::to_string(&state).unwrap());

    assert_eq!(
        store.load("Server1").unwrap_err().kind(),
        "StateCorruptionError"
    );
}

// ============================================================================
// Initialization
// ============================================================================

#[test]
fn test_fresh_server_matches_baseline_counts() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStateStore::new(dir.path());
    let mut config = config();
    for pattern in &mut config.table_patterns {
        if pattern.server_type == ServerType::OltpProduction {
            pattern.table_count = CountRange::new(12, 12);
        }
    }
    let profile = profile(&config, "Server1");

    let loaded = load_or_initialize(&store, &profile, &config, 7).unwrap();
    assert!(loaded.fresh);
    assert_eq!(loaded.state.len(), profile.database_names.len());
    assert_eq!(loaded.state.table_count(), 12 * profile.database_names.len());

    let template = config.template_for(ServerType::OltpProduction).unwrap();
    for database in loaded.state.databases.values() {
        assert_eq!(database.tables.len(), 12);
        assert_eq!(database.last_period_end, None);
        assert!(database.data_file_size_mb >= template.initial_data_mb.min);
        assert!(database.data_file_size_mb <= template.initial_data_mb.max);
        assert!(database.table_floor_mb() <= database.data_file_size_mb * 0.9 + 1e-6);
        assert!(database.file_count >= template.file_policy.base_files);
        assert!(database.tables.contains_key("Table_01"));
        assert!(database.tables.contains_key("Table_12"));
    }

    // nothing is written until the caller saves
    assert!(store.load("Server1").unwrap().is_none());
}

#[test]
fn test_pattern_assignments_and_defaults() {
    let config = config();
    let state = initialize_server(&profile(&config, "Server2"), &config, 1).unwrap();

    let primary = state.get("PrimaryStore_DB").unwrap();
    assert_eq!(primary.growth_pattern, GrowthPatternKind::GrowingFast);
    assert_eq!(primary.data_file_size_mb, 11_000.0);
    assert_eq!(
        state.get("CustomerCore_DB").unwrap().growth_pattern,
        GrowthPatternKind::BrokenCleanup
    );
    assert_eq!(
        state.get("OrderProcessing_DB").unwrap().growth_pattern,
        GrowthPatternKind::Stable
    );

    let reference = initialize_server(&profile(&config, "Server4"), &config, 1).unwrap();
    assert!(reference
        .databases
        .values()
        .all(|d| d.growth_pattern == GrowthPatternKind::Static));
}

#[test]
fn test_initialization_is_deterministic_per_seed() {
    let config = config();
    let profile = profile(&config, "Server3");
    let a = initialize_server(&profile, &config, 99).unwrap();
    let b = initialize_server(&profile, &config, 99).unwrap();
    let c = initialize_server(&profile, &config, 100).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_new_database_joins_existing_timeline() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStateStore::new(dir.path());
    let config = config();

    let mut state = simulated_state(&config);
    state.databases.remove("TransactionLog_DB");
    store.save("Server1", &state).unwrap();

    let loaded = load_or_initialize(&store, &profile(&config, "Server1"), &config, 42).unwrap();
    assert!(!loaded.fresh);
    assert_eq!(loaded.added_databases, vec!["TransactionLog_DB".to_string()]);
    let added = loaded.state.get("TransactionLog_DB").unwrap();
    assert_eq!(added.last_period_end, Some(at(1, 18)));
    assert_eq!(added.growth_pattern, GrowthPatternKind::NoRetention);
}

#[test]
fn test_unconfigured_database_is_config_error() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStateStore::new(dir.path());
    let config = config();

    let mut state = simulated_state(&config);
    let mut extra = state.get("PrimaryStore_DB").unwrap().clone();
    extra.database_name = "Retired_DB".to_string();
    state.insert(extra);
    store.save("Server1", &state).unwrap();

    let err = load_or_initialize(&store, &profile(&config, "Server1"), &config, 42).unwrap_err();
    assert!(matches!(err, SimError::Config(_)));
    assert!(err.to_string().contains("Retired_DB"));
}
