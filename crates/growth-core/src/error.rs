//! Error taxonomy shared by every simulator crate.

use std::path::{Path, PathBuf};

/// Result alias used throughout the simulator crates.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors raised while configuring, simulating or persisting a server.
///
/// All variants are fatal to the current server's period: the caller must
/// leave the server's persisted state and output files untouched.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Malformed or missing configuration, or a period that cannot be scheduled
    #[error("configuration error: {0}")]
    Config(String),

    /// Persisted state failed a schema or invariant check
    #[error("state corruption in {location}: {check}")]
    StateCorruption { location: String, check: String },

    /// A growth pattern name that the pattern library does not know
    #[error("unknown growth pattern '{name}'")]
    Pattern { name: String },

    /// Reading or writing a state, snapshot or event file failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoding a record as JSON failed
    #[error("failed to encode {what}: {source}")]
    Serialization {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// Error parsing YAML configuration
    #[error("failed to parse configuration YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SimError {
    pub fn config(message: impl Into<String>) -> Self {
        SimError::Config(message.into())
    }

    pub fn pattern(name: impl Into<String>) -> Self {
        SimError::Pattern { name: name.into() }
    }

    /// Build a corruption error located at `server` or `server/database`.
    pub fn corruption(server: &str, database: Option<&str>, check: impl Into<String>) -> Self {
        let location = match database {
            Some(database) => format!("{server}/{database}"),
            None => server.to_string(),
        };
        SimError::StateCorruption {
            location,
            check: check.into(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        SimError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Short category name used in run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            SimError::Config(_) | SimError::Yaml(_) => "ConfigError",
            SimError::StateCorruption { .. } => "StateCorruptionError",
            SimError::Pattern { .. } => "PatternError",
            SimError::Io { .. } | SimError::Serialization { .. } => "IOError",
        }
    }
}
