//! Core types for the storage growth simulator.
//!
//! This crate holds everything the engine and the state store share:
//!
//! - [`SimError`], the error taxonomy every operation reports through
//! - [`ServerProfile`] / [`ServerType`], who is being simulated
//! - [`DatabaseState`] / [`TableState`] / [`ServerState`], the persisted state
//! - [`PatternLibrary`], the closed catalog of growth patterns
//! - [`BaselineTemplate`], [`TablePattern`], [`AnomalyOverride`], the
//!   per-server-type and per-database configuration records
//! - [`Snapshot`] / [`AutogrowthEvent`], the output records
//! - [`RandomSource`], the single injectable source of randomness
//! - [`SimulatorConfig`], the YAML configuration tying these together
//!
//! # Example
//!
//! ```rust
//! use growth_core::{GrowthPatternKind, SimulatorConfig};
//!
//! let config = SimulatorConfig::builtin().unwrap();
//! let library = config.pattern_library().unwrap();
//! let stable = library.get(GrowthPatternKind::Stable).unwrap();
//! assert!(stable.cleanup_probability > 0.0);
//! ```

pub mod config;
pub mod error;
pub mod pattern;
pub mod random;
pub mod range;
pub mod records;
pub mod server;
pub mod state;
pub mod template;

pub use config::{parse_server_range, SimulatorConfig, BUILTIN_CONFIG_YAML};
pub use error::{Result, SimError};
pub use pattern::{GrowthPatternKind, GrowthPatternSpec, PatternLibrary};
pub use random::{derive_seed, RandomSource, ScriptedRandom, SeededRandom};
pub use range::{CountRange, FloatRange};
pub use records::{
    mb_to_gb, round3, AutogrowthBatch, AutogrowthEvent, FileType, IoStats, PeriodKind,
    SimulationPeriod, SizeStats, Snapshot, TableSnapshot,
};
pub use server::{database_key, ServerProfile, ServerType};
pub use state::{table_size_mb, DatabaseState, ServerState, TableState};
pub use template::{
    AnomalyOverride, AutogrowthRule, BaselineTemplate, FileAdditionPolicy, GrowthIncrement,
    PatternAssignment, TablePattern, WorkloadShape,
};
