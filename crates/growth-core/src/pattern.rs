//! Growth pattern catalog.
//!
//! Patterns are a closed set of kinds. Configuration refers to them by name;
//! names are resolved once through [`GrowthPatternKind::from_str`] and every
//! later lookup goes through the [`PatternLibrary`] table, which fails with
//! [`SimError::Pattern`] rather than falling back to a default.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::range::FloatRange;
use crate::records::PeriodKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPatternKind {
    /// Cleanup keeps pace with inserts; little net growth.
    Stable,
    /// No retention job at all; steady growth, never shrinks.
    NoRetention,
    /// Heavy insert load outrunning maintenance.
    GrowingFast,
    /// Cleanup exists but rarely succeeds.
    BrokenCleanup,
    /// Nightly loads with a broken archive job.
    ArchiveFailure,
    /// Nightly loads balanced by periodic archiving.
    EtlCycle,
    /// Reference data that barely changes.
    Static,
}

impl GrowthPatternKind {
    pub const ALL: [GrowthPatternKind; 7] = [
        GrowthPatternKind::Stable,
        GrowthPatternKind::NoRetention,
        GrowthPatternKind::GrowingFast,
        GrowthPatternKind::BrokenCleanup,
        GrowthPatternKind::ArchiveFailure,
        GrowthPatternKind::EtlCycle,
        GrowthPatternKind::Static,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthPatternKind::Stable => "stable",
            GrowthPatternKind::NoRetention => "no_retention",
            GrowthPatternKind::GrowingFast => "growing_fast",
            GrowthPatternKind::BrokenCleanup => "broken_cleanup",
            GrowthPatternKind::ArchiveFailure => "archive_failure",
            GrowthPatternKind::EtlCycle => "etl_cycle",
            GrowthPatternKind::Static => "static",
        }
    }
}

impl std::fmt::Display for GrowthPatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrowthPatternKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        GrowthPatternKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SimError::pattern(s))
    }
}

fn default_multiplier() -> f64 {
    1.0
}

/// Numeric parameters of one growth pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthPatternSpec {
    /// Pattern name, one of the [`GrowthPatternKind`] names
    pub name: String,

    /// Per-period data growth in percent of the current data file size
    pub mean_growth_pct_range: FloatRange,

    /// Probability that a cleanup job runs in a period
    pub cleanup_probability: f64,

    /// Fraction of the data file a successful cleanup reclaims
    pub cleanup_effectiveness_range: FloatRange,

    /// Scales the server type's IOPS baseline
    pub io_multiplier: f64,

    /// Growth multiplier applied during day periods
    #[serde(default = "default_multiplier")]
    pub day_multiplier: f64,

    /// Growth multiplier applied during night periods
    #[serde(default = "default_multiplier")]
    pub night_multiplier: f64,
}

impl GrowthPatternSpec {
    pub fn kind(&self) -> Result<GrowthPatternKind> {
        self.name.parse()
    }

    pub fn period_multiplier(&self, kind: PeriodKind) -> f64 {
        match kind {
            PeriodKind::Day => self.day_multiplier,
            PeriodKind::Night => self.night_multiplier,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let what = |field: &str| format!("pattern '{}' {field}", self.name);

        self.mean_growth_pct_range
            .validate(&what("mean_growth_pct_range"))?;
        self.cleanup_effectiveness_range
            .validate_non_negative(&what("cleanup_effectiveness_range"))?;
        if self.cleanup_effectiveness_range.max > 1.0 {
            return Err(SimError::config(format!(
                "{} must not exceed 1.0",
                what("cleanup_effectiveness_range")
            )));
        }
        if !(0.0..=1.0).contains(&self.cleanup_probability) {
            return Err(SimError::config(format!(
                "{} must be within [0, 1], got {}",
                what("cleanup_probability"),
                self.cleanup_probability
            )));
        }
        for (field, value) in [
            ("io_multiplier", self.io_multiplier),
            ("day_multiplier", self.day_multiplier),
            ("night_multiplier", self.night_multiplier),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::config(format!(
                    "{} must be a non-negative number, got {value}",
                    what(field)
                )));
            }
        }
        Ok(())
    }
}

/// Lookup table from pattern kind to its parameters.
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    patterns: BTreeMap<GrowthPatternKind, GrowthPatternSpec>,
}

impl PatternLibrary {
    /// Build the library, rejecting unknown names, duplicates and invalid
    /// parameters.
    pub fn from_specs(specs: &[GrowthPatternSpec]) -> Result<Self> {
        let mut patterns = BTreeMap::new();
        for spec in specs {
            let kind = spec.kind()?;
            spec.validate()?;
            if patterns.insert(kind, spec.clone()).is_some() {
                return Err(SimError::config(format!(
                    "pattern '{}' is defined more than once",
                    spec.name
                )));
            }
        }
        Ok(Self { patterns })
    }

    pub fn get(&self, kind: GrowthPatternKind) -> Result<&GrowthPatternSpec> {
        self.patterns
            .get(&kind)
            .ok_or_else(|| SimError::pattern(kind.as_str()))
    }

    /// Resolve a pattern by name.
    pub fn lookup(&self, name: &str) -> Result<&GrowthPatternSpec> {
        self.get(name.parse()?)
    }

    pub fn contains(&self, kind: GrowthPatternKind) -> bool {
        self.patterns.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
