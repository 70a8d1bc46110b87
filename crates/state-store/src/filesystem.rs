//! Filesystem-based state storage implementation.

use std::path::{Path, PathBuf};

use growth_core::{Result, ServerState, SimError};

use crate::atomic::write_json_atomic;
use crate::layout::ServerLayout;
use crate::store::StateStore;
use crate::validate::validate_server_state;

/// Stores each server's state as
/// `<root>/<server>/growth_data/server_state.json`.
#[derive(Debug, Clone)]
pub struct FilesystemStateStore {
    root: PathBuf,
}

impl FilesystemStateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self, server_name: &str) -> ServerLayout {
        ServerLayout::new(&self.root, server_name)
    }

    pub fn state_path(&self, server_name: &str) -> PathBuf {
        self.layout(server_name).state_file()
    }
}

impl StateStore for FilesystemStateStore {
    fn load(&self, server_name: &str) -> Result<Option<ServerState>> {
        let path = self.state_path(server_name);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SimError::io(&path, e)),
        };

        let state: ServerState = serde_json::from_str(&content).map_err(|e| {
            SimError::corruption(
                server_name,
                None,
                format!("{} does not match the state schema: {e}", path.display()),
            )
        })?;
        validate_server_state(server_name, &state)?;

        tracing::debug!(
            "Loaded state for {server_name} ({} databases) from {}",
            state.len(),
            path.display()
        );
        Ok(Some(state))
    }

    fn save(&self, server_name: &str, state: &ServerState) -> Result<()> {
        validate_server_state(server_name, state)?;
        let path = self.state_path(server_name);
        write_json_atomic(&path, state, &format!("state of {server_name}"))?;
        tracing::info!("Stored state for {server_name} to {}", path.display());
        Ok(())
    }
}
