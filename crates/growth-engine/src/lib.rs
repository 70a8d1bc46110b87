//! Simulation engine for the storage growth simulator.
//!
//! - [`next_period`] computes the 12-hour window following the persisted state
//! - [`simulate_database_period`] grows one database's files and tables
//! - [`detect_events`] turns file growth into discrete autogrowth events
//! - [`advance_database`] runs all three and builds the period's snapshot
//!
//! Nothing in this crate touches the filesystem; every randomized draw comes
//! from the caller's [`RandomSource`](growth_core::RandomSource).

pub mod advance;
pub mod autogrowth;
pub mod engine;
pub mod io;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use advance::{advance_database, DatabaseAdvance, SimulationContext};
pub use autogrowth::{detect_events, Detection, EventCost};
pub use engine::{simulate_database_period, PeriodOutcome, TableDelta};
pub use io::{simulate_io, PeriodIo, PAGE_SIZE_BYTES};
pub use scheduler::{next_period, simulation_epoch, DAY_START_HOUR, PERIOD_HOURS};
