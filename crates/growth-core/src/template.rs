//! Per-server-type baseline templates and per-database overrides.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::range::{CountRange, FloatRange};
use crate::records::{FileType, PeriodKind};
use crate::server::ServerType;

/// IO workload shape of a server type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadShape {
    /// Page reads per second before day/night scaling
    pub reads_per_sec: FloatRange,
    /// Page writes per second before day/night scaling
    pub writes_per_sec: FloatRange,
    pub day_read_factor: f64,
    pub day_write_factor: f64,
    pub night_read_factor: f64,
    pub night_write_factor: f64,
    /// Megabytes of log growth per megabyte written
    pub log_growth_factor: f64,
}

impl WorkloadShape {
    /// `(read_factor, write_factor)` for the given half of the day.
    pub fn factors(&self, kind: PeriodKind) -> (f64, f64) {
        match kind {
            PeriodKind::Day => (self.day_read_factor, self.day_write_factor),
            PeriodKind::Night => (self.night_read_factor, self.night_write_factor),
        }
    }

    fn validate(&self, what: &str) -> Result<()> {
        self.reads_per_sec
            .validate_non_negative(&format!("{what} reads_per_sec"))?;
        self.writes_per_sec
            .validate_non_negative(&format!("{what} writes_per_sec"))?;
        for (field, value) in [
            ("day_read_factor", self.day_read_factor),
            ("day_write_factor", self.day_write_factor),
            ("night_read_factor", self.night_read_factor),
            ("night_write_factor", self.night_write_factor),
            ("log_growth_factor", self.log_growth_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::config(format!(
                    "{what} {field} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// How far a file grows on each autogrowth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GrowthIncrement {
    /// Fixed size in megabytes
    Fixed { increment_mb: f64 },
    /// Percent of the currently allocated file size
    Percent { percent: f64 },
}

/// File-growth setting of one file type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutogrowthRule {
    pub file_type: FileType,
    #[serde(flatten)]
    pub growth: GrowthIncrement,
}

impl AutogrowthRule {
    pub fn fixed(file_type: FileType, increment_mb: f64) -> Self {
        Self {
            file_type,
            growth: GrowthIncrement::Fixed { increment_mb },
        }
    }

    pub fn percent(file_type: FileType, percent: f64) -> Self {
        Self {
            file_type,
            growth: GrowthIncrement::Percent { percent },
        }
    }

    /// Increment applied when the file currently has `allocated_mb`.
    ///
    /// Percent increments are whole megabytes and at least 1 MB.
    pub fn increment_for(&self, allocated_mb: f64) -> f64 {
        match self.growth {
            GrowthIncrement::Fixed { increment_mb } => increment_mb,
            GrowthIncrement::Percent { percent } => {
                (allocated_mb.max(0.0) * percent / 100.0).round().max(1.0)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let (field, value) = match self.growth {
            GrowthIncrement::Fixed { increment_mb } => ("increment_mb", increment_mb),
            GrowthIncrement::Percent { percent } => ("percent", percent),
        };
        if !value.is_finite() || value <= 0.0 {
            return Err(SimError::config(format!(
                "{} autogrowth {field} must be positive, got {value}",
                self.file_type
            )));
        }
        Ok(())
    }
}

/// Policy adding data files as the data size grows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FileAdditionPolicy {
    pub base_files: u32,
    pub files_per_step: u32,
    pub step_mb: f64,
}

impl FileAdditionPolicy {
    pub fn file_count_for(&self, data_mb: f64) -> u32 {
        let steps = (data_mb.max(0.0) / self.step_mb).floor() as u32;
        self.base_files
            .saturating_add(self.files_per_step.saturating_mul(steps))
    }
}

/// Defaults applied to databases hosted on one server type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineTemplate {
    pub server_type: ServerType,
    /// Initial data file size of a new database
    pub initial_data_mb: FloatRange,
    /// Initial log file size as a fraction of the data file
    pub log_ratio: f64,
    /// Pattern name used when no per-database assignment exists
    pub default_pattern: String,
    pub io: WorkloadShape,
    pub autogrowth: Vec<AutogrowthRule>,
    pub file_policy: FileAdditionPolicy,
}

impl BaselineTemplate {
    pub fn rule_for(&self, file_type: FileType) -> Result<&AutogrowthRule> {
        self.autogrowth
            .iter()
            .find(|rule| rule.file_type == file_type)
            .ok_or_else(|| {
                SimError::config(format!(
                    "baseline template for {} has no {file_type} autogrowth rule",
                    self.server_type
                ))
            })
    }

    pub fn validate(&self) -> Result<()> {
        let what = format!("baseline template {}", self.server_type);
        self.initial_data_mb
            .validate_non_negative(&format!("{what} initial_data_mb"))?;
        if !self.log_ratio.is_finite() || self.log_ratio < 0.0 {
            return Err(SimError::config(format!(
                "{what} log_ratio must be non-negative"
            )));
        }
        self.io.validate(&what)?;
        for file_type in FileType::ALL {
            self.rule_for(file_type)?.validate()?;
        }
        if self.file_policy.base_files == 0 {
            return Err(SimError::config(format!(
                "{what} file_policy.base_files must be at least 1"
            )));
        }
        if !self.file_policy.step_mb.is_finite() || self.file_policy.step_mb <= 0.0 {
            return Err(SimError::config(format!(
                "{what} file_policy.step_mb must be positive"
            )));
        }
        Ok(())
    }
}

/// Table layout of new databases on one server type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePattern {
    pub server_type: ServerType,
    pub table_count: CountRange,
    pub initial_rows: CountRange,
    pub avg_row_bytes: CountRange,
    /// Probability that a table is subject to a cleanup job
    pub cleanup_probability: f64,
}

impl TablePattern {
    pub fn validate(&self) -> Result<()> {
        let what = format!("table pattern {}", self.server_type);
        self.table_count.validate(&format!("{what} table_count"))?;
        self.initial_rows.validate(&format!("{what} initial_rows"))?;
        self.avg_row_bytes
            .validate(&format!("{what} avg_row_bytes"))?;
        if self.avg_row_bytes.min == 0 {
            return Err(SimError::config(format!(
                "{what} avg_row_bytes must be at least 1"
            )));
        }
        if !(0.0..=1.0).contains(&self.cleanup_probability) {
            return Err(SimError::config(format!(
                "{what} cleanup_probability must be within [0, 1]"
            )));
        }
        Ok(())
    }
}

/// Pattern pinned to one `server/database`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAssignment {
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_size_mb: Option<f64>,
}

fn both_file_types() -> Vec<FileType> {
    FileType::ALL.to_vec()
}

/// Atypical autogrowth behaviour for one `server/database`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyOverride {
    pub anomaly_scenario: String,
    /// How many times more events than the base rule would produce
    pub frequency_multiplier: f64,
    /// Probability of choosing the smallest eligible increment
    pub small_increment_bias: f64,
    pub preferred_increments_mb: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// File types the override replaces the base rule for
    #[serde(default = "both_file_types")]
    pub file_types: Vec<FileType>,
}

impl AnomalyOverride {
    pub fn applies_to(&self, file_type: FileType) -> bool {
        self.file_types.contains(&file_type)
    }

    pub fn validate(&self, key: &str) -> Result<()> {
        if self.preferred_increments_mb.is_empty() {
            return Err(SimError::config(format!(
                "anomaly '{key}' needs at least one preferred increment"
            )));
        }
        if self
            .preferred_increments_mb
            .iter()
            .any(|mb| !mb.is_finite() || *mb <= 0.0)
        {
            return Err(SimError::config(format!(
                "anomaly '{key}' preferred increments must be positive"
            )));
        }
        if !self.frequency_multiplier.is_finite() || self.frequency_multiplier < 1.0 {
            return Err(SimError::config(format!(
                "anomaly '{key}' frequency_multiplier must be at least 1"
            )));
        }
        if !(0.0..=1.0).contains(&self.small_increment_bias) {
            return Err(SimError::config(format!(
                "anomaly '{key}' small_increment_bias must be within [0, 1]"
            )));
        }
        Ok(())
    }

    pub fn smallest_increment_mb(&self) -> f64 {
        self.preferred_increments_mb
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }

    /// Check the override can multiply the event count of a `base_mb` rule.
    ///
    /// Only preferred increments of at most `base_mb / frequency_multiplier`
    /// are used, so at least one must fit under that cap.
    pub fn validate_base_increment(
        &self,
        key: &str,
        file_type: FileType,
        base_mb: f64,
    ) -> Result<()> {
        let cap_mb = base_mb / self.frequency_multiplier;
        let smallest_mb = self.smallest_increment_mb();
        if smallest_mb > cap_mb {
            return Err(SimError::config(format!(
                "anomaly '{key}' cannot multiply {file_type} autogrowth by {}: smallest preferred \
                 increment {smallest_mb} MB exceeds {base_mb} MB / {} = {cap_mb} MB",
                self.frequency_multiplier, self.frequency_multiplier
            )));
        }
        Ok(())
    }
}
