//! Snapshot and autogrowth event files.

use std::path::{Path, PathBuf};

use growth_core::{AutogrowthBatch, Result, SimError, Snapshot};
use state_store::{write_json_atomic, ServerLayout};

/// A file written during the current period and what it replaced.
#[derive(Debug)]
struct WrittenFile {
    path: PathBuf,
    previous: Option<Vec<u8>>,
}

/// Writes one server's output files for one period.
///
/// Every file is remembered until [`commit`](Emitter::commit). On
/// [`rollback`](Emitter::rollback) new files are removed and overwritten
/// files get their previous content back.
#[derive(Debug)]
pub struct Emitter {
    layout: ServerLayout,
    written: Vec<WrittenFile>,
}

impl Emitter {
    pub fn new(layout: ServerLayout) -> Self {
        Self {
            layout,
            written: Vec::new(),
        }
    }

    pub fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<PathBuf> {
        let path = self
            .layout
            .snapshot_file(&snapshot.database_name, snapshot.period_end);
        self.write(path, snapshot, "snapshot")
    }

    pub fn write_events(&mut self, batch: &AutogrowthBatch) -> Result<PathBuf> {
        let path = self
            .layout
            .events_file(&batch.database_name, batch.period_start);
        self.write(path, batch, "autogrowth events")
    }

    fn write<T: serde::Serialize>(
        &mut self,
        path: PathBuf,
        value: &T,
        what: &str,
    ) -> Result<PathBuf> {
        let previous = match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(SimError::io(&path, e)),
        };
        write_json_atomic(&path, value, what)?;
        self.written.push(WrittenFile {
            path: path.clone(),
            previous,
        });
        Ok(path)
    }

    pub fn written_count(&self) -> usize {
        self.written.len()
    }

    /// Keep everything written and return the paths.
    pub fn commit(self) -> Vec<PathBuf> {
        self.written.into_iter().map(|f| f.path).collect()
    }

    /// Undo every write, newest first.
    pub fn rollback(self) {
        for file in self.written.into_iter().rev() {
            let outcome = match &file.previous {
                Some(bytes) => std::fs::write(&file.path, bytes),
                None => std::fs::remove_file(&file.path),
            };
            if let Err(e) = outcome {
                tracing::warn!("Failed to roll back {}: {e}", file.path.display());
            }
        }
    }
}

/// Number of `.json` files in `dir`; zero when it does not exist.
pub fn count_json_files(dir: &Path) -> std::io::Result<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    let mut count = 0;
    for entry in entries {
        let path = entry?.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use growth_core::{IoStats, PeriodKind, ServerType, SizeStats};
    use tempfile::TempDir;

    fn snapshot(database_name: &str) -> Snapshot {
        let start = NaiveDate::from_ymd_opt(2025, 5, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let end = start + chrono::TimeDelta::hours(12);
        Snapshot {
            timestamp: end,
            server_name: "Server1".to_string(),
            server_type: ServerType::OltpProduction,
            database_name: database_name.to_string(),
            period_start: start,
            period_end: end,
            period_type: PeriodKind::Day,
            size: SizeStats {
                total_gb: 12.0,
                data_file_gb: 9.0,
                log_file_gb: 3.0,
                file_count: 2,
            },
            io: IoStats {
                reads: 10,
                writes: 5,
                read_gb: 0.0,
                write_gb: 0.0,
                cumulative_reads: 10,
                cumulative_writes: 5,
            },
            tables: Vec::new(),
        }
    }

    #[test]
    fn test_rollback_removes_new_files() {
        let dir = TempDir::new().unwrap();
        let layout = ServerLayout::new(dir.path(), "Server1");
        let mut emitter = Emitter::new(layout.clone());

        let a = emitter.write_snapshot(&snapshot("A_DB")).unwrap();
        let b = emitter.write_snapshot(&snapshot("B_DB")).unwrap();
        assert!(a.exists() && b.exists());
        assert_eq!(count_json_files(&layout.snapshots_dir()).unwrap(), 2);

        emitter.rollback();
        assert!(!a.exists() && !b.exists());
        assert_eq!(count_json_files(&layout.snapshots_dir()).unwrap(), 0);
    }

    #[test]
    fn test_rollback_restores_overwritten_file() {
        let dir = TempDir::new().unwrap();
        let layout = ServerLayout::new(dir.path(), "Server1");
        let path = layout.snapshot_file("A_DB", snapshot("A_DB").period_end);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale").unwrap();

        let mut emitter = Emitter::new(layout);
        emitter.write_snapshot(&snapshot("A_DB")).unwrap();
        assert_ne!(std::fs::read_to_string(&path).unwrap(), "stale");

        emitter.rollback();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "stale");
    }

    #[test]
    fn test_commit_returns_paths() {
        let dir = TempDir::new().unwrap();
        let mut emitter = Emitter::new(ServerLayout::new(dir.path(), "Server1"));
        emitter.write_snapshot(&snapshot("A_DB")).unwrap();
        assert_eq!(emitter.written_count(), 1);

        let paths = emitter.commit();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("A_DB_snapshot_20250501_180000.json"));
    }

    #[test]
    fn test_count_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert_eq!(count_json_files(&dir.path().join("absent")).unwrap(), 0);
    }
}
