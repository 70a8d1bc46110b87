//! Server identity and workload classification.

use crate::error::SimError;
use serde::{Deserialize, Serialize};

/// Workload class of a simulated server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerType {
    OltpProduction,
    ReportingAnalytics,
    ReferenceConfig,
}

impl ServerType {
    pub const ALL: [ServerType; 3] = [
        ServerType::OltpProduction,
        ServerType::ReportingAnalytics,
        ServerType::ReferenceConfig,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServerType::OltpProduction => "oltp_production",
            ServerType::ReportingAnalytics => "reporting_analytics",
            ServerType::ReferenceConfig => "reference_config",
        }
    }
}

impl std::fmt::Display for ServerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServerType {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServerType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SimError::config(format!("unknown server type '{s}'")))
    }
}

/// A configured server and the databases it hosts, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerProfile {
    pub server_name: String,
    pub server_type: ServerType,
    pub database_names: Vec<String>,
}

impl ServerProfile {
    pub fn new(
        server_name: impl Into<String>,
        server_type: ServerType,
        database_names: Vec<String>,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            server_type,
            database_names,
        }
    }

    /// Key used by per-database overrides, e.g. `Server2/PrimaryStore_DB`.
    pub fn database_key(&self, database_name: &str) -> String {
        database_key(&self.server_name, database_name)
    }
}

pub fn database_key(server_name: &str, database_name: &str) -> String {
    format!("{server_name}/{database_name}")
}
