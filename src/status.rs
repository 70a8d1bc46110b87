//! Read-only status of the simulated servers.

use std::path::Path;

use chrono::NaiveDateTime;
use growth_core::{ServerType, SimulatorConfig};
use growth_engine::next_period;
use serde::Serialize;
use state_store::{FilesystemStateStore, StateStore};

use crate::emit::count_json_files;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StateStatus {
    /// Never simulated
    Missing,
    Ready {
        databases: usize,
        tables: usize,
        last_period_end: Option<NaiveDateTime>,
        next_period_start: NaiveDateTime,
        total_size_gb: f64,
    },
    /// State cannot be advanced; the message names the failing check
    Broken { kind: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerStatus {
    pub server_name: String,
    pub server_type: ServerType,
    pub state: StateStatus,
    pub snapshot_files: usize,
    pub event_files: usize,
}

/// Inspect every configured server under `output_dir`. Nothing is written.
pub fn collect_status(
    config: &SimulatorConfig,
    output_dir: &Path,
) -> anyhow::Result<Vec<ServerStatus>> {
    let store = FilesystemStateStore::new(output_dir);
    let mut statuses = Vec::new();

    for profile in config.resolve_servers()? {
        let layout = store.layout(&profile.server_name);
        let state = match store.load(&profile.server_name) {
            Ok(None) => StateStatus::Missing,
            Ok(Some(state)) => {
                let last_period_end = state.last_period_end();
                match next_period(last_period_end) {
                    Ok(next) => StateStatus::Ready {
                        databases: state.len(),
                        tables: state.table_count(),
                        last_period_end,
                        next_period_start: next.start,
                        total_size_gb: growth_core::mb_to_gb(
                            state.databases.values().map(|d| d.total_size_mb()).sum(),
                        ),
                    },
                    Err(e) => StateStatus::Broken {
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    },
                }
            }
            Err(e) => StateStatus::Broken {
                kind: e.kind().to_string(),
                message: e.to_string(),
            },
        };

        statuses.push(ServerStatus {
            server_name: profile.server_name.clone(),
            server_type: profile.server_type,
            state,
            snapshot_files: count_json_files(&layout.snapshots_dir())?,
            event_files: count_json_files(&layout.events_dir())?,
        });
    }
    Ok(statuses)
}
