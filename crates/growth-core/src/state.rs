//! Persisted per-server simulation state.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::pattern::GrowthPatternKind;
use crate::records::FileType;
use crate::server::ServerType;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Last-known state of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    pub table_name: String,
    pub row_count: u64,
    pub size_mb: f64,
    /// Average row width; `size_mb` always follows `row_count * avg_row_bytes`
    pub avg_row_bytes: u64,
    /// Whether a cleanup job touches this table
    pub has_cleanup: bool,
    /// Relative weight of this table in the database's growth
    pub share: f64,
    pub last_cleanup_period: Option<NaiveDateTime>,
}

impl TableState {
    pub fn new(
        table_name: impl Into<String>,
        row_count: u64,
        avg_row_bytes: u64,
        has_cleanup: bool,
        share: f64,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            row_count,
            size_mb: table_size_mb(row_count, avg_row_bytes),
            avg_row_bytes,
            has_cleanup,
            share,
            last_cleanup_period: None,
        }
    }

    /// Set the row count and recompute the size from it.
    pub fn set_rows(&mut self, row_count: u64) {
        self.row_count = row_count;
        self.size_mb = table_size_mb(row_count, self.avg_row_bytes);
    }
}

/// Table size in MB for a row count at the given row width.
pub fn table_size_mb(row_count: u64, avg_row_bytes: u64) -> f64 {
    row_count as f64 * avg_row_bytes as f64 / BYTES_PER_MB
}

/// Last-known state of one database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseState {
    pub server_name: String,
    pub database_name: String,
    pub server_type: ServerType,
    pub growth_pattern: GrowthPatternKind,
    /// Data file size the database started with; pattern growth
    /// percentages apply to this, so growth is linear rather than compounding
    pub baseline_data_mb: f64,
    pub data_file_size_mb: f64,
    pub log_file_size_mb: f64,
    pub file_count: u32,
    pub last_period_end: Option<NaiveDateTime>,
    pub cumulative_reads: u64,
    pub cumulative_writes: u64,
    /// Data growth not yet covered by an autogrowth event
    pub data_growth_carry_mb: f64,
    /// Log growth not yet covered by an autogrowth event
    pub log_growth_carry_mb: f64,
    pub tables: BTreeMap<String, TableState>,
}

impl DatabaseState {
    pub fn total_size_mb(&self) -> f64 {
        self.data_file_size_mb + self.log_file_size_mb
    }

    /// Space the tables need; cleanup never shrinks the data file below it.
    pub fn table_floor_mb(&self) -> f64 {
        self.tables.values().map(|t| t.size_mb).sum()
    }

    pub fn file_size_mb(&self, file_type: FileType) -> f64 {
        match file_type {
            FileType::Data => self.data_file_size_mb,
            FileType::Log => self.log_file_size_mb,
        }
    }

    pub fn growth_carry_mb(&self, file_type: FileType) -> f64 {
        match file_type {
            FileType::Data => self.data_growth_carry_mb,
            FileType::Log => self.log_growth_carry_mb,
        }
    }

    pub fn set_growth_carry_mb(&mut self, file_type: FileType, carry_mb: f64) {
        match file_type {
            FileType::Data => self.data_growth_carry_mb = carry_mb,
            FileType::Log => self.log_growth_carry_mb = carry_mb,
        }
    }
}

/// All databases of one server, keyed by database name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerState {
    pub databases: BTreeMap<String, DatabaseState>,
}

impl ServerState {
    pub fn get(&self, database_name: &str) -> Option<&DatabaseState> {
        self.databases.get(database_name)
    }

    pub fn insert(&mut self, state: DatabaseState) {
        self.databases.insert(state.database_name.clone(), state);
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// End of the last simulated period; databases advance in lockstep, so
    /// this is the latest end recorded by any of them.
    pub fn last_period_end(&self) -> Option<NaiveDateTime> {
        self.databases
            .values()
            .filter_map(|db| db.last_period_end)
            .max()
    }

    pub fn table_count(&self) -> usize {
        self.databases.values().map(|db| db.tables.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn database(name: &str, end: Option<NaiveDateTime>) -> DatabaseState {
        let mut tables = BTreeMap::new();
        tables.insert(
            "Table_01".to_string(),
            TableState::new("Table_01", 1024 * 1024, 256, true, 1.0),
        );
        DatabaseState {
            server_name: "Server1".to_string(),
            database_name: name.to_string(),
            server_type: ServerType::OltpProduction,
            growth_pattern: GrowthPatternKind::Stable,
            baseline_data_mb: 10_000.0,
            data_file_size_mb: 10_000.0,
            log_file_size_mb: 2_500.0,
            file_count: 2,
            last_period_end: end,
            cumulative_reads: 0,
            cumulative_writes: 0,
            data_growth_carry_mb: 12.0,
            log_growth_carry_mb: 3.0,
            tables,
        }
    }

    #[test]
    fn test_table_size_follows_rows() {
        let mut table = TableState::new("Table_01", 4096, 256, false, 1.0);
        assert_eq!(table.size_mb, 1.0);
        table.set_rows(8192);
        assert_eq!(table.size_mb, 2.0);
    }

    #[test]
    fn test_database_accessors() {
        let mut db = database("Orders_DB", None);
        assert_eq!(db.total_size_mb(), 12_500.0);
        assert_eq!(db.table_floor_mb(), 256.0);
        assert_eq!(db.growth_carry_mb(FileType::Log), 3.0);
        db.set_growth_carry_mb(FileType::Data, 0.5);
        assert_eq!(db.data_growth_carry_mb, 0.5);
    }

    #[test]
    fn test_server_state_serializes_as_map() {
        let end = NaiveDate::from_ymd_opt(2025, 5, 1)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        let mut state = ServerState::default();
        state.insert(database("Orders_DB", Some(end)));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json["Orders_DB"]["last_period_end"],
            "2025-05-01T18:00:00"
        );
        assert_eq!(state.last_period_end(), Some(end));

        let parsed: ServerState = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, state);
    }
}
