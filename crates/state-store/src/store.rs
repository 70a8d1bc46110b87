//! State storage trait.

use growth_core::{Result, ServerState};

/// Persistence of per-server simulation state.
///
/// The store exclusively owns the persisted state. Callers get a copy on
/// load and hand back a complete replacement on save.
pub trait StateStore {
    /// Load a server's state.
    ///
    /// Returns `None` if the server has never been simulated.
    fn load(&self, server_name: &str) -> Result<Option<ServerState>>;

    /// Replace a server's state. Either the whole new state is persisted or
    /// the previous state is left intact.
    fn save(&self, server_name: &str, state: &ServerState) -> Result<()>;
}
