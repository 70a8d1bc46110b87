//! One database, one period: growth, autogrowth detection and the snapshot.

use growth_core::{
    mb_to_gb, round3, AnomalyOverride, AutogrowthBatch, AutogrowthEvent, BaselineTemplate,
    DatabaseState, FileType, PatternLibrary, RandomSource, Result, SimulationPeriod, SizeStats,
    Snapshot, TableSnapshot,
};

use crate::autogrowth::detect_events;
use crate::engine::{simulate_database_period, TableDelta};

/// Read-only inputs for advancing one database.
#[derive(Debug, Clone, Copy)]
pub struct SimulationContext<'a> {
    pub library: &'a PatternLibrary,
    /// Template of the database's server type
    pub template: &'a BaselineTemplate,
    pub anomaly: Option<&'a AnomalyOverride>,
}

/// Everything one database produces for one period. Nothing has been
/// written yet.
#[derive(Debug, Clone)]
pub struct DatabaseAdvance {
    pub state: DatabaseState,
    pub snapshot: Snapshot,
    /// Data and log events merged in timestamp order
    pub events: Vec<AutogrowthEvent>,
    pub table_deltas: Vec<TableDelta>,
    pub cleanup_fired: bool,
}

impl DatabaseAdvance {
    /// The event file payload, or `None` when the period had no events.
    pub fn event_batch(&self) -> Option<AutogrowthBatch> {
        if self.events.is_empty() {
            return None;
        }
        Some(AutogrowthBatch {
            server_name: self.snapshot.server_name.clone(),
            database_name: self.snapshot.database_name.clone(),
            period_start: self.snapshot.period_start,
            period_end: self.snapshot.period_end,
            events: self.events.clone(),
        })
    }

    pub fn event_count(&self, file_type: FileType) -> usize {
        self.events
            .iter()
            .filter(|e| e.file_type == file_type)
            .count()
    }
}

/// Advance one database by `period`.
pub fn advance_database<R: RandomSource>(
    state: &DatabaseState,
    ctx: &SimulationContext<'_>,
    period: &SimulationPeriod,
    rng: &mut R,
) -> Result<DatabaseAdvance> {
    let outcome = simulate_database_period(state, ctx.library, ctx.template, period, rng)?;
    let mut new_state = outcome.state;

    let mut events = Vec::new();
    for file_type in FileType::ALL {
        let rule = ctx.template.rule_for(file_type)?;
        let detection = detect_events(
            state.file_size_mb(file_type),
            new_state.file_size_mb(file_type),
            state.growth_carry_mb(file_type),
            rule,
            ctx.anomaly,
            period,
            rng,
        );
        new_state.set_growth_carry_mb(file_type, detection.carry_mb);
        events.extend(detection.events);
    }
    events.sort_by_key(|e| e.timestamp);

    tracing::debug!(
        server = %new_state.server_name,
        database = %new_state.database_name,
        data_mb = new_state.data_file_size_mb,
        log_mb = new_state.log_file_size_mb,
        events = events.len(),
        "database advanced"
    );

    Ok(DatabaseAdvance {
        snapshot: build_snapshot(&new_state, &outcome.io, period),
        state: new_state,
        events,
        table_deltas: outcome.table_deltas,
        cleanup_fired: outcome.cleanup_fired,
    })
}

fn build_snapshot(
    state: &DatabaseState,
    io: &growth_core::IoStats,
    period: &SimulationPeriod,
) -> Snapshot {
    Snapshot {
        timestamp: period.end,
        server_name: state.server_name.clone(),
        server_type: state.server_type,
        database_name: state.database_name.clone(),
        period_start: period.start,
        period_end: period.end,
        period_type: period.kind,
        size: SizeStats {
            total_gb: mb_to_gb(state.total_size_mb()),
            data_file_gb: mb_to_gb(state.data_file_size_mb),
            log_file_gb: mb_to_gb(state.log_file_size_mb),
            file_count: state.file_count,
        },
        io: io.clone(),
        tables: state
            .tables
            .values()
            .map(|t| TableSnapshot {
                table_name: t.table_name.clone(),
                row_count: t.row_count,
                size_mb: round3(t.size_mb),
            })
            .collect(),
    }
}
