//! Simulation periods and the output records written for each of them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::server::ServerType;

/// Which half of the simulated day a period covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    /// 06:00 to 18:00
    Day,
    /// 18:00 to 06:00 the next day
    Night,
}

impl PeriodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodKind::Day => "day",
            PeriodKind::Night => "night",
        }
    }
}

impl std::fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One 12-hour window of simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationPeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub kind: PeriodKind,
}

impl SimulationPeriod {
    pub fn is_day(&self) -> bool {
        self.kind == PeriodKind::Day
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

/// Database file kind an autogrowth rule or event applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Data,
    Log,
}

impl FileType {
    pub const ALL: [FileType; 2] = [FileType::Data, FileType::Log];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Data => "data",
            FileType::Log => "log",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size section of a snapshot, in GB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeStats {
    pub total_gb: f64,
    pub data_file_gb: f64,
    pub log_file_gb: f64,
    pub file_count: u32,
}

/// IO section of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoStats {
    pub reads: u64,
    pub writes: u64,
    pub read_gb: f64,
    pub write_gb: f64,
    pub cumulative_reads: u64,
    pub cumulative_writes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub table_name: String,
    pub row_count: u64,
    pub size_mb: f64,
}

/// Per-database record emitted once per period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: NaiveDateTime,
    pub server_name: String,
    pub server_type: ServerType,
    pub database_name: String,
    pub period_start: NaiveDateTime,
    pub period_end: NaiveDateTime,
    pub period_type: PeriodKind,
    pub size: SizeStats,
    pub io: IoStats,
    pub tables: Vec<TableSnapshot>,
}

/// A single file extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutogrowthEvent {
    pub timestamp: NaiveDateTime,
    pub file_type: FileType,
    pub previous_mb: f64,
    pub increment_mb: f64,
    pub new_mb: f64,
    pub duration_ms: u64,
    pub blocking: bool,
    pub io_wait_ms: u64,
    pub blocked_processes: u32,
}

/// All autogrowth events of one database for one period, as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutogrowthBatch {
    pub server_name: String,
    pub database_name: String,
    pub period_start: NaiveDateTime,
    pub period_end: NaiveDateTime,
    pub events: Vec<AutogrowthEvent>,
}

/// Megabytes to gigabytes, rounded to three decimals for output records.
pub fn mb_to_gb(mb: f64) -> f64 {
    round3(mb / 1024.0)
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
