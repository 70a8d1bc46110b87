//! Fixtures shared by the engine tests.

use std::collections::BTreeMap;

use growth_core::{
    BaselineTemplate, DatabaseState, GrowthPatternKind, PatternLibrary, ServerType,
    SimulatorConfig, TableState,
};

pub(crate) fn config() -> SimulatorConfig {
    SimulatorConfig::builtin().unwrap()
}

pub(crate) fn library() -> PatternLibrary {
    config().pattern_library().unwrap()
}

/// The OLTP template: 256 MB data / 64 MB log increments, two files per 50 GB.
pub(crate) fn template() -> BaselineTemplate {
    config()
        .template_for(ServerType::OltpProduction)
        .unwrap()
        .clone()
}

/// A fresh OLTP database with three cleaned-up tables of 256-byte rows.
pub(crate) fn database_state(pattern: GrowthPatternKind, data_mb: f64) -> DatabaseState {
    let tables: BTreeMap<String, TableState> = [
        ("Table_01", 2_000_000, 0.5),
        ("Table_02", 1_000_000, 0.3),
        ("Table_03", 500_000, 0.2),
    ]
    .into_iter()
    .map(|(name, rows, share)| {
        (
            name.to_string(),
            TableState::new(name, rows, 256, true, share),
        )
    })
    .collect();

    DatabaseState {
        server_name: "Server1".to_string(),
        database_name: "Orders_DB".to_string(),
        server_type: ServerType::OltpProduction,
        growth_pattern: pattern,
        baseline_data_mb: data_mb,
        data_file_size_mb: data_mb,
        log_file_size_mb: data_mb * 0.33,
        file_count: 2,
        last_period_end: None,
        cumulative_reads: 0,
        cumulative_writes: 0,
        data_growth_carry_mb: 0.0,
        log_growth_carry_mb: 0.0,
        tables,
    }
}
