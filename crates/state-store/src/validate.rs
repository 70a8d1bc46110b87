//! Invariant checks on persisted server state.
//!
//! Checked on every load and before every save. A failing check is reported
//! as [`SimError::StateCorruption`] naming the server, the database and the
//! check; nothing is repaired here.

use growth_core::{table_size_mb, DatabaseState, Result, ServerState, SimError};

/// Relative slack for comparing megabyte amounts computed in floating point.
const RELATIVE_TOLERANCE: f64 = 1e-9;

fn approx_le(value: f64, limit: f64) -> bool {
    value <= limit + limit.abs().max(1.0) * RELATIVE_TOLERANCE
}

pub fn validate_server_state(server_name: &str, state: &ServerState) -> Result<()> {
    for (key, database) in &state.databases {
        if key != &database.database_name {
            return Err(SimError::corruption(
                server_name,
                Some(key),
                format!(
                    "entry is keyed '{key}' but names database '{}'",
                    database.database_name
                ),
            ));
        }
        if database.server_name != server_name {
            return Err(SimError::corruption(
                server_name,
                Some(key),
                format!("database belongs to server '{}'", database.server_name),
            ));
        }
        validate_database(database)?;
    }

    // all databases of a server advance together
    let mut ends = state.databases.values().map(|d| d.last_period_end);
    if let Some(first) = ends.next() {
        if ends.any(|end| end != first) {
            return Err(SimError::corruption(
                server_name,
                None,
                "databases disagree on last_period_end",
            ));
        }
    }
    Ok(())
}

fn validate_database(database: &DatabaseState) -> Result<()> {
    let fail = |check: String| {
        SimError::corruption(
            &database.server_name,
            Some(&database.database_name),
            check,
        )
    };

    for (field, value) in [
        ("baseline_data_mb", database.baseline_data_mb),
        ("data_file_size_mb", database.data_file_size_mb),
        ("log_file_size_mb", database.log_file_size_mb),
        ("data_growth_carry_mb", database.data_growth_carry_mb),
        ("log_growth_carry_mb", database.log_growth_carry_mb),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(fail(format!("{field} must be a non-negative number, got {value}")));
        }
    }
    if database.file_count == 0 {
        return Err(fail("file_count must be at least 1".to_string()));
    }

    for (key, table) in &database.tables {
        if key != &table.table_name {
            return Err(fail(format!(
                "table entry '{key}' names table '{}'",
                table.table_name
            )));
        }
        if !table.size_mb.is_finite() || table.size_mb < 0.0 {
            return Err(fail(format!("table {key} has invalid size_mb {}", table.size_mb)));
        }
        if table.avg_row_bytes == 0 {
            return Err(fail(format!("table {key} has avg_row_bytes 0")));
        }
        let expected_mb = table_size_mb(table.row_count, table.avg_row_bytes);
        if !approx_le(table.size_mb, expected_mb) || !approx_le(expected_mb, table.size_mb) {
            return Err(fail(format!(
                "table {key} size_mb {} does not match {} rows of {} bytes ({expected_mb} MB)",
                table.size_mb, table.row_count, table.avg_row_bytes
            )));
        }
        if let Some(cleanup) = table.last_cleanup_period {
            match database.last_period_end {
                Some(end) if cleanup <= end => {}
                Some(end) => {
                    return Err(fail(format!(
                        "table {key} last_cleanup_period {cleanup} is after last_period_end {end}"
                    )))
                }
                None => {
                    return Err(fail(format!(
                        "table {key} has last_cleanup_period {cleanup} but the database was never simulated"
                    )))
                }
            }
        }
    }

    let floor_mb = database.table_floor_mb();
    if !approx_le(floor_mb, database.data_file_size_mb) {
        return Err(fail(format!(
            "tables hold {floor_mb} MB but the data file is {} MB",
            database.data_file_size_mb
        )));
    }
    Ok(())
}
