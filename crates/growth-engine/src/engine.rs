//! Growth engine: one database over one period.

use growth_core::{
    BaselineTemplate, DatabaseState, GrowthPatternSpec, IoStats, PatternLibrary, RandomSource,
    Result, SimError, SimulationPeriod, TableState,
};

use crate::io::{simulate_io, PeriodIo};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Row-count change of one table in one period.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDelta {
    pub table_name: String,
    pub row_count: u64,
    pub size_mb: f64,
    pub rows_added: u64,
    pub rows_deleted: u64,
    pub cleanup_applied: bool,
}

/// Result of simulating one database over one period.
#[derive(Debug, Clone)]
pub struct PeriodOutcome {
    pub state: DatabaseState,
    pub io: IoStats,
    pub table_deltas: Vec<TableDelta>,
    pub data_growth_mb: f64,
    pub log_growth_mb: f64,
    pub cleanup_fired: bool,
    /// Data file space reclaimed by cleanup this period
    pub cleanup_reclaimed_mb: f64,
}

/// Advance `state` by one period under its growth pattern.
///
/// The input is not modified; the returned outcome carries the new state.
/// Autogrowth carries are copied unchanged, the detector updates them.
pub fn simulate_database_period<R: RandomSource>(
    state: &DatabaseState,
    library: &PatternLibrary,
    template: &BaselineTemplate,
    period: &SimulationPeriod,
    rng: &mut R,
) -> Result<PeriodOutcome> {
    let pattern = library.get(state.growth_pattern)?;
    check_inputs(state, template, period)?;

    let growth_pct = draw_growth_pct(pattern, period, rng);
    let data_growth_mb = state.baseline_data_mb * growth_pct / 100.0;

    let io = simulate_io(&template.io, pattern, period, rng);
    let log_growth_mb =
        (io.write_mb() * template.io.log_growth_factor * rng.uniform(0.8, 1.2)).max(0.0);

    let cleanup_fired = rng.chance(pattern.cleanup_probability);
    let (tables, table_deltas) = grow_tables(state, data_growth_mb, cleanup_fired, period, rng);

    let grown_data_mb = state.data_file_size_mb + data_growth_mb;
    let mut data_file_size_mb = grown_data_mb;
    if cleanup_fired {
        let effectiveness = rng
            .uniform(
                pattern.cleanup_effectiveness_range.min,
                pattern.cleanup_effectiveness_range.max,
            )
            .clamp(0.0, 1.0);
        // tables never grow faster than the data file, so the floor is
        // at most the grown size
        let floor_mb: f64 = tables.values().map(|t| t.size_mb).sum();
        data_file_size_mb = (grown_data_mb * (1.0 - effectiveness)).max(floor_mb);
    }
    let cleanup_reclaimed_mb = (grown_data_mb - data_file_size_mb).max(0.0);

    let file_count = state
        .file_count
        .max(template.file_policy.file_count_for(data_file_size_mb));

    let new_state = DatabaseState {
        data_file_size_mb,
        log_file_size_mb: state.log_file_size_mb + log_growth_mb,
        file_count,
        last_period_end: Some(period.end),
        cumulative_reads: state.cumulative_reads.saturating_add(io.reads),
        cumulative_writes: state.cumulative_writes.saturating_add(io.writes),
        tables,
        ..state.clone()
    };

    tracing::debug!(
        database = %state.database_name,
        pattern = %state.growth_pattern,
        growth_pct,
        cleanup_fired,
        "simulated period {} -> {}",
        period.start,
        period.end
    );

    Ok(PeriodOutcome {
        io: io_stats(&io, &new_state),
        state: new_state,
        table_deltas,
        data_growth_mb,
        log_growth_mb,
        cleanup_fired,
        cleanup_reclaimed_mb,
    })
}

fn check_inputs(
    state: &DatabaseState,
    template: &BaselineTemplate,
    period: &SimulationPeriod,
) -> Result<()> {
    if template.server_type != state.server_type {
        return Err(SimError::config(format!(
            "{}/{} is a {} database but was given the {} baseline template",
            state.server_name, state.database_name, state.server_type, template.server_type
        )));
    }
    if let Some(end) = state.last_period_end {
        if end != period.start {
            return Err(SimError::corruption(
                &state.server_name,
                Some(&state.database_name),
                format!(
                    "last_period_end {end} does not meet the next period start {}",
                    period.start
                ),
            ));
        }
    }
    Ok(())
}

/// Growth percentage for the period, never negative.
fn draw_growth_pct<R: RandomSource>(
    pattern: &GrowthPatternSpec,
    period: &SimulationPeriod,
    rng: &mut R,
) -> f64 {
    let range = pattern.mean_growth_pct_range;
    let pct = rng.uniform(range.min, range.max) * pattern.period_multiplier(period.kind);
    pct.max(0.0)
}

/// Grow every table by its share of the database growth, then apply the
/// cleanup job to tables subject to it when cleanup fired this period.
///
/// Shares are jittered per period and then normalised, and row counts round
/// down, so the tables together never grow by more than `data_growth_mb`.
fn grow_tables<R: RandomSource>(
    state: &DatabaseState,
    data_growth_mb: f64,
    cleanup_fired: bool,
    period: &SimulationPeriod,
    rng: &mut R,
) -> (std::collections::BTreeMap<String, TableState>, Vec<TableDelta>) {
    let weights: Vec<f64> = state
        .tables
        .values()
        .map(|t| t.share.max(0.0) * rng.uniform(0.7, 1.4))
        .collect();
    let total_weight: f64 = weights.iter().sum();
    let table_count = state.tables.len().max(1) as f64;

    let mut tables = state.tables.clone();
    let mut deltas = Vec::with_capacity(tables.len());

    for (table, weight) in tables.values_mut().zip(weights) {
        let share = if total_weight > 0.0 {
            weight / total_weight
        } else {
            1.0 / table_count
        };
        let allotment_mb = data_growth_mb * share;
        let row_bytes = table.avg_row_bytes.max(1) as f64;
        let rows_added = (allotment_mb * BYTES_PER_MB / row_bytes).floor().max(0.0) as u64;

        let cleanup_applied = cleanup_fired && table.has_cleanup;
        let rows_deleted = if cleanup_applied {
            rows_to_delete(table.row_count, rows_added, rng)
        } else {
            0
        };

        let row_count = table
            .row_count
            .saturating_add(rows_added)
            .saturating_sub(rows_deleted);
        table.set_rows(row_count);
        if cleanup_applied {
            table.last_cleanup_period = Some(period.end);
        }

        deltas.push(TableDelta {
            table_name: table.table_name.clone(),
            row_count: table.row_count,
            size_mb: table.size_mb,
            rows_added,
            rows_deleted,
            cleanup_applied,
        });
    }

    (tables, deltas)
}

/// Rows a cleanup job removes: usually less than was added, sometimes an
/// exact balance, occasionally an aggressive purge. Never more than half of
/// the rows present before the period.
fn rows_to_delete<R: RandomSource>(current_rows: u64, rows_added: u64, rng: &mut R) -> u64 {
    let added = rows_added as f64;
    let roll = rng.next_f64();
    let target = if roll < 0.15 {
        added * rng.uniform(1.2, 2.0)
    } else if roll < 0.25 {
        added
    } else {
        added * rng.uniform(0.3, 0.9)
    };
    (target.round() as u64).min(current_rows / 2)
}

fn io_stats(io: &PeriodIo, state: &DatabaseState) -> IoStats {
    IoStats {
        reads: io.reads,
        writes: io.writes,
        read_gb: io.read_gb(),
        write_gb: io.write_gb(),
        cumulative_reads: state.cumulative_reads,
        cumulative_writes: state.cumulative_writes,
    }
}
