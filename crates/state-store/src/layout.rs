//! On-disk layout of one server's output directory.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

pub const GROWTH_DATA_DIR: &str = "growth_data";
pub const STATE_FILE_NAME: &str = "server_state.json";
pub const SNAPSHOTS_DIR: &str = "snapshots";
pub const EVENTS_DIR: &str = "autogrowth_events";

const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Paths under `<root>/<server>/growth_data/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLayout {
    growth_dir: PathBuf,
}

impl ServerLayout {
    pub fn new(root: impl AsRef<Path>, server_name: &str) -> Self {
        Self {
            growth_dir: root.as_ref().join(server_name).join(GROWTH_DATA_DIR),
        }
    }

    pub fn growth_dir(&self) -> &Path {
        &self.growth_dir
    }

    pub fn state_file(&self) -> PathBuf {
        self.growth_dir.join(STATE_FILE_NAME)
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.growth_dir.join(SNAPSHOTS_DIR)
    }

    pub fn events_dir(&self) -> PathBuf {
        self.growth_dir.join(EVENTS_DIR)
    }

    /// Snapshot file, named after the period end.
    pub fn snapshot_file(&self, database_name: &str, period_end: NaiveDateTime) -> PathBuf {
        self.snapshots_dir().join(format!(
            "{database_name}_snapshot_{}.json",
            period_end.format(FILE_TIMESTAMP_FORMAT)
        ))
    }

    /// Autogrowth event file, named after the period start.
    pub fn events_file(&self, database_name: &str, period_start: NaiveDateTime) -> PathBuf {
        self.events_dir().join(format!(
            "{database_name}_autogrowth_{}.json",
            period_start.format(FILE_TIMESTAMP_FORMAT)
        ))
    }
}
