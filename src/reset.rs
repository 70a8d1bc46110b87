//! Out-of-band reset of one server's simulated history.
//!
//! Nothing in a normal run repairs state. When a server's state is corrupted
//! or its history should start over, the operator resets it explicitly: the
//! state file, snapshots and autogrowth events are removed and the next run
//! initializes the server from its baseline at the simulation epoch.

use std::path::Path;

use anyhow::Context;
use growth_core::SimulatorConfig;
use state_store::ServerLayout;

use crate::emit::count_json_files;
use crate::run::select_servers;

/// What a reset removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetOutcome {
    pub server_name: String,
    /// A state file existed before the reset
    pub had_state: bool,
    pub snapshot_files: usize,
    pub event_files: usize,
}

/// Remove every file the simulator wrote for `server_name` under
/// `output_dir`. Resetting a server that was never simulated is a no-op.
pub fn reset_server(
    config: &SimulatorConfig,
    output_dir: &Path,
    server_name: &str,
) -> anyhow::Result<ResetOutcome> {
    select_servers(config, &[server_name.to_string()])?;

    let layout = ServerLayout::new(output_dir, server_name);
    let outcome = ResetOutcome {
        server_name: server_name.to_string(),
        had_state: layout.state_file().exists(),
        snapshot_files: count_json_files(&layout.snapshots_dir())?,
        event_files: count_json_files(&layout.events_dir())?,
    };

    match std::fs::remove_dir_all(layout.growth_dir()) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Failed to remove {}", layout.growth_dir().display())
            })
        }
    }

    tracing::info!(
        "Reset {server_name}: removed state ({}), {} snapshots, {} event files",
        outcome.had_state,
        outcome.snapshot_files,
        outcome.event_files
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::{run_simulation, RunOptions};
    use tempfile::TempDir;

    fn simulate(config: &SimulatorConfig, output_dir: &Path, periods: u32) {
        let summary = run_simulation(
            config,
            &RunOptions {
                output_dir: output_dir.to_path_buf(),
                seed: 21,
                periods,
                servers: vec!["Server1".to_string(), "Server4".to_string()],
            },
        )
        .unwrap();
        assert!(summary.is_success());
    }

    #[test]
    fn test_reset_removes_one_server_only() {
        let config = SimulatorConfig::builtin().unwrap();
        let dir = TempDir::new().unwrap();
        simulate(&config, dir.path(), 2);
        let other = ServerLayout::new(dir.path(), "Server4");
        let other_state = std::fs::read(other.state_file()).unwrap();

        let outcome = reset_server(&config, dir.path(), "Server1").unwrap();
        assert!(outcome.had_state);
        assert_eq!(outcome.snapshot_files, 8);

        let layout = ServerLayout::new(dir.path(), "Server1");
        assert!(!layout.growth_dir().exists());
        assert_eq!(std::fs::read(other.state_file()).unwrap(), other_state);
    }

    #[test]
    fn test_reset_server_restarts_at_epoch() {
        let config = SimulatorConfig::builtin().unwrap();
        let dir = TempDir::new().unwrap();
        simulate(&config, dir.path(), 3);
        reset_server(&config, dir.path(), "Server1").unwrap();

        let fresh = TempDir::new().unwrap();
        simulate(&config, dir.path(), 1);
        simulate(&config, fresh.path(), 1);
        let layout = ServerLayout::new(dir.path(), "Server1");
        let expected = ServerLayout::new(fresh.path(), "Server1");
        assert_eq!(
            std::fs::read(layout.state_file()).unwrap(),
            std::fs::read(expected.state_file()).unwrap()
        );
    }

    #[test]
    fn test_reset_unknown_or_unsimulated_server() {
        let config = SimulatorConfig::builtin().unwrap();
        let dir = TempDir::new().unwrap();
        assert!(reset_server(&config, dir.path(), "Server99").is_err());

        let outcome = reset_server(&config, dir.path(), "Server2").unwrap();
        assert!(!outcome.had_state);
        assert_eq!(outcome.snapshot_files, 0);
    }
}
