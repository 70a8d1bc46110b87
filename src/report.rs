//! Console tables for run summaries and status.

use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use growth_core::mb_to_gb;

use crate::run::RunSummary;
use crate::status::{ServerStatus, StateStatus};

/// Format a run summary as a table, one row per advanced or failed server
/// period.
pub fn format_run_summary(summary: &RunSummary) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Server",
        "Period",
        "Databases",
        "Events",
        "Cleanups",
        "Size (GB)",
        "Status",
    ]);

    for advance in &summary.advances {
        let status = if advance.initialized {
            Cell::new("INITIALIZED").fg(Color::Cyan)
        } else {
            Cell::new("OK").fg(Color::Green)
        };
        table.add_row(vec![
            Cell::new(&advance.server_name),
            Cell::new(format!(
                "{} {}",
                advance.period.start.format("%Y-%m-%d %H:%M"),
                advance.period.kind
            )),
            Cell::new(advance.databases),
            Cell::new(advance.autogrowth_events),
            Cell::new(advance.cleanups),
            Cell::new(format!("{:.3}", mb_to_gb(advance.total_size_mb))),
            status,
        ]);
    }

    for failure in &summary.failures {
        table.add_row(vec![
            Cell::new(&failure.server_name),
            Cell::new(format!("pass {}", failure.pass)),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new(format!("FAILED ({})", failure.error.kind())).fg(Color::Red),
        ]);
    }

    let mut output = table.to_string();
    output.push_str(&format!("\nSeed: {}\n", summary.seed));
    for failure in &summary.failures {
        output.push_str(&format!("  {failure}\n"));
    }
    output
}

/// Format server status as a table.
pub fn format_status(statuses: &[ServerStatus]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Server",
        "Type",
        "Databases",
        "Tables",
        "Last period end",
        "Size (GB)",
        "Snapshots",
        "Event files",
        "State",
    ]);

    let mut problems = Vec::new();
    for status in statuses {
        let (databases, tables, last_end, size, state) = match &status.state {
            StateStatus::Missing => (
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                Cell::new("NEW").fg(Color::Yellow),
            ),
            StateStatus::Ready {
                databases,
                tables,
                last_period_end,
                total_size_gb,
                ..
            } => (
                databases.to_string(),
                tables.to_string(),
                last_period_end
                    .map(|end| end.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
                format!("{total_size_gb:.3}"),
                Cell::new("OK").fg(Color::Green),
            ),
            StateStatus::Broken { kind, message } => {
                problems.push(format!("{}: {message}", status.server_name));
                (
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    Cell::new(kind).fg(Color::Red),
                )
            }
        };

        table.add_row(vec![
            Cell::new(&status.server_name),
            Cell::new(status.server_type),
            Cell::new(databases),
            Cell::new(tables),
            Cell::new(last_end),
            Cell::new(size),
            Cell::new(status.snapshot_files),
            Cell::new(status.event_files),
            state,
        ]);
    }

    let mut output = table.to_string();
    output.push('\n');
    for problem in problems {
        output.push_str(&format!("  {problem}\n"));
    }
    output
}
