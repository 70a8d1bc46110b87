//! State persistence for the storage growth simulator.
//!
//! Each server's state lives in one JSON file keyed by database name. The
//! store:
//! - returns `None` for a server that was never simulated, and
//!   [`load_or_initialize`] turns that into a baseline state
//! - validates every loaded state and reports violations as
//!   `StateCorruption`, never repairing them
//! - saves with write-temp-then-rename so a failed save leaves the previous
//!   file intact
//!
//! # Example
//!
//! ```rust,no_run
//! use growth_core::SimulatorConfig;
//! use state_store::{load_or_initialize, FilesystemStateStore, StateStore};
//!
//! let config = SimulatorConfig::builtin()?;
//! let store = FilesystemStateStore::new("output");
//! for profile in config.resolve_servers()? {
//!     let loaded = load_or_initialize(&store, &profile, &config, 42)?;
//!     store.save(&profile.server_name, &loaded.state)?;
//! }
//! # Ok::<(), growth_core::SimError>(())
//! ```

mod atomic;
mod filesystem;
mod init;
mod layout;
pub mod store;
mod validate;

#[cfg(test)]
mod tests;

pub use atomic::write_json_atomic;
pub use filesystem::FilesystemStateStore;
pub use init::{initialize_database, initialize_server, load_or_initialize, LoadedState};
pub use layout::{ServerLayout, EVENTS_DIR, GROWTH_DATA_DIR, SNAPSHOTS_DIR, STATE_FILE_NAME};
pub use store::StateStore;
pub use validate::validate_server_state;
