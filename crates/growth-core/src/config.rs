//! Simulator configuration.
//!
//! The configuration is read once per run and never mutated. It is a YAML
//! document with these sections:
//!
//! - `server_count`, `server_type_assignments`, `unassigned_server_default`:
//!   which servers exist and what workload each one runs
//! - `database_names`: ordered database names per server type
//! - `patterns`: the growth pattern parameter table
//! - `baseline_templates`, `table_patterns`: defaults for new databases
//! - `pattern_assignments`, `anomalies`: overrides keyed by `server/database`
//!
//! See `builtin.yaml` for a complete example.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::pattern::{GrowthPatternKind, GrowthPatternSpec, PatternLibrary};
use crate::records::FileType;
use crate::server::{database_key, ServerProfile, ServerType};
use crate::template::{AnomalyOverride, BaselineTemplate, PatternAssignment, TablePattern};

/// Text of the built-in configuration.
pub const BUILTIN_CONFIG_YAML: &str = include_str!("builtin.yaml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Number of servers, named `Server1` to `Server<n>`
    pub server_count: u32,

    /// Range keys such as `servers_1_4` mapped to a server type
    #[serde(default)]
    pub server_type_assignments: BTreeMap<String, ServerType>,

    /// Type of servers not covered by any range
    pub unassigned_server_default: ServerType,

    pub database_names: BTreeMap<ServerType, Vec<String>>,

    pub patterns: Vec<GrowthPatternSpec>,

    pub baseline_templates: Vec<BaselineTemplate>,

    pub table_patterns: Vec<TablePattern>,

    #[serde(default)]
    pub pattern_assignments: BTreeMap<String, PatternAssignment>,

    #[serde(default)]
    pub anomalies: BTreeMap<String, AnomalyOverride>,
}

impl SimulatorConfig {
    /// Parse and validate a YAML configuration.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: SimulatorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        Self::from_yaml(&content)
    }

    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CONFIG_YAML)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check every cross-reference and parameter of the configuration.
    pub fn validate(&self) -> Result<()> {
        let library = self.pattern_library()?;

        for (index, template) in self.baseline_templates.iter().enumerate() {
            template.validate()?;
            if self.baseline_templates[..index]
                .iter()
                .any(|t| t.server_type == template.server_type)
            {
                return Err(SimError::config(format!(
                    "baseline template for {} is defined more than once",
                    template.server_type
                )));
            }
            library.lookup(&template.default_pattern)?;
        }
        for (index, table_pattern) in self.table_patterns.iter().enumerate() {
            table_pattern.validate()?;
            if self.table_patterns[..index]
                .iter()
                .any(|t| t.server_type == table_pattern.server_type)
            {
                return Err(SimError::config(format!(
                    "table pattern for {} is defined more than once",
                    table_pattern.server_type
                )));
            }
        }

        let servers = self.resolve_servers()?;
        for server in &servers {
            self.template_for(server.server_type)?;
            self.table_pattern_for(server.server_type)?;
        }

        let owner = |key: &str| {
            servers.iter().find(|server| {
                server
                    .database_names
                    .iter()
                    .any(|db| server.database_key(db) == key)
            })
        };
        for (key, assignment) in &self.pattern_assignments {
            if owner(key).is_none() {
                return Err(SimError::config(format!(
                    "pattern assignment '{key}' does not name a configured server/database"
                )));
            }
            library.lookup(&assignment.pattern)?;
            if let Some(size) = assignment.start_size_mb {
                if !size.is_finite() || size <= 0.0 {
                    return Err(SimError::config(format!(
                        "pattern assignment '{key}' start_size_mb must be positive"
                    )));
                }
            }
        }
        for (key, anomaly) in &self.anomalies {
            let Some(server) = owner(key) else {
                return Err(SimError::config(format!(
                    "anomaly '{key}' does not name a configured server/database"
                )));
            };
            anomaly.validate(key)?;
            self.validate_anomaly_increments(key, anomaly, server.server_type)?;
        }
        Ok(())
    }

    /// Compare an anomaly with the base rules it replaces. Percent rules are
    /// checked at the smallest size a new database can start with.
    fn validate_anomaly_increments(
        &self,
        key: &str,
        anomaly: &AnomalyOverride,
        server_type: ServerType,
    ) -> Result<()> {
        let template = self.template_for(server_type)?;
        let start_data_mb = self
            .pattern_assignments
            .get(key)
            .and_then(|a| a.start_size_mb)
            .unwrap_or(template.initial_data_mb.min);
        for file_type in &anomaly.file_types {
            let start_mb = match file_type {
                FileType::Data => start_data_mb,
                FileType::Log => (start_data_mb * template.log_ratio).round(),
            };
            let base_mb = template.rule_for(*file_type)?.increment_for(start_mb);
            anomaly.validate_base_increment(key, *file_type, base_mb)?;
        }
        Ok(())
    }

    pub fn pattern_library(&self) -> Result<PatternLibrary> {
        PatternLibrary::from_specs(&self.patterns)
    }

    /// Expand the server count and range assignments into server profiles,
    /// in server number order.
    pub fn resolve_servers(&self) -> Result<Vec<ServerProfile>> {
        if self.server_count == 0 {
            return Err(SimError::config("server_count must be at least 1"));
        }

        let mut types: BTreeMap<u32, ServerType> = BTreeMap::new();
        for (range_spec, server_type) in &self.server_type_assignments {
            let (start, end) = parse_server_range(range_spec)?;
            if end > self.server_count {
                return Err(SimError::config(format!(
                    "server range '{range_spec}' exceeds server_count {}",
                    self.server_count
                )));
            }
            for number in start..=end {
                if let Some(previous) = types.insert(number, *server_type) {
                    if previous != *server_type {
                        return Err(SimError::config(format!(
                            "Server{number} is assigned both {previous} and {server_type}"
                        )));
                    }
                }
            }
        }

        (1..=self.server_count)
            .map(|number| {
                let server_type = types
                    .get(&number)
                    .copied()
                    .unwrap_or(self.unassigned_server_default);
                let database_names = self
                    .database_names
                    .get(&server_type)
                    .filter(|names| !names.is_empty())
                    .ok_or_else(|| {
                        SimError::config(format!(
                            "no database names configured for server type {server_type}"
                        ))
                    })?;
                for (index, name) in database_names.iter().enumerate() {
                    if name.is_empty() || name.contains('/') {
                        return Err(SimError::config(format!(
                            "invalid database name '{name}' for {server_type}"
                        )));
                    }
                    if database_names[..index].contains(name) {
                        return Err(SimError::config(format!(
                            "database '{name}' listed twice for {server_type}"
                        )));
                    }
                }
                Ok(ServerProfile::new(
                    format!("Server{number}"),
                    server_type,
                    database_names.clone(),
                ))
            })
            .collect()
    }

    pub fn template_for(&self, server_type: ServerType) -> Result<&BaselineTemplate> {
        self.baseline_templates
            .iter()
            .find(|t| t.server_type == server_type)
            .ok_or_else(|| {
                SimError::config(format!("no baseline template for server type {server_type}"))
            })
    }

    pub fn table_pattern_for(&self, server_type: ServerType) -> Result<&TablePattern> {
        self.table_patterns
            .iter()
            .find(|t| t.server_type == server_type)
            .ok_or_else(|| {
                SimError::config(format!("no table pattern for server type {server_type}"))
            })
    }

    pub fn assignment_for(&self, server_name: &str, database_name: &str) -> Option<&PatternAssignment> {
        self.pattern_assignments
            .get(&database_key(server_name, database_name))
    }

    pub fn anomaly_for(&self, server_name: &str, database_name: &str) -> Option<&AnomalyOverride> {
        self.anomalies.get(&database_key(server_name, database_name))
    }

    /// Pattern a newly introduced database starts with.
    pub fn pattern_for_new_database(
        &self,
        profile: &ServerProfile,
        database_name: &str,
    ) -> Result<GrowthPatternKind> {
        match self.assignment_for(&profile.server_name, database_name) {
            Some(assignment) => assignment.pattern.parse(),
            None => self.template_for(profile.server_type)?.default_pattern.parse(),
        }
    }
}

/// Parse a range key such as `servers_1_4` into `(1, 4)`.
pub fn parse_server_range(range_spec: &str) -> Result<(u32, u32)> {
    let invalid = || SimError::config(format!("invalid server range '{range_spec}'"));

    let rest = range_spec.strip_prefix("servers_").ok_or_else(invalid)?;
    let (start, end) = rest.split_once('_').ok_or_else(invalid)?;
    let start: u32 = start.parse().map_err(|_| invalid())?;
    let end: u32 = end.parse().map_err(|_| invalid())?;
    if start == 0 || start > end {
        return Err(invalid());
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_config_is_valid() {
        let config = SimulatorConfig::builtin().unwrap();
        let library = config.pattern_library().unwrap();
        assert_eq!(library.len(), GrowthPatternKind::ALL.len());

        let servers = config.resolve_servers().unwrap();
        assert_eq!(servers.len(), 4);
        assert_eq!(servers[0].server_type, ServerType::OltpProduction);
        assert_eq!(servers[2].server_type, ServerType::ReportingAnalytics);
        assert_eq!(servers[3].server_type, ServerType::ReferenceConfig);
        assert!(servers[0]
            .database_names
            .contains(&"TransactionLog_DB".to_string()));
    }

    #[test]
    fn test_pattern_for_new_database() {
        let config = SimulatorConfig::builtin().unwrap();
        let servers = config.resolve_servers().unwrap();

        assert_eq!(
            config
                .pattern_for_new_database(&servers[1], "PrimaryStore_DB")
                .unwrap(),
            GrowthPatternKind::GrowingFast
        );
        assert_eq!(
            config
                .pattern_for_new_database(&servers[1], "OrderProcessing_DB")
                .unwrap(),
            GrowthPatternKind::Stable
        );
        assert_eq!(
            config
                .pattern_for_new_database(&servers[3], "ConfigStore_DB")
                .unwrap(),
            GrowthPatternKind::Static
        );
        assert!(config.anomaly_for("Server2", "PrimaryStore_DB").is_some());
        assert!(config.anomaly_for("Server1", "PrimaryStore_DB").is_none());
    }

    #[test]
    fn test_parse_server_range() {
        assert_eq!(parse_server_range("servers_1_4").unwrap(), (1, 4));
        assert_eq!(parse_server_range("servers_3_3").unwrap(), (3, 3));
        assert!(parse_server_range("servers_4_1").is_err());
        assert!(parse_server_range("server_1_4").is_err());
        assert!(parse_server_range("servers_x_4").is_err());
        assert!(parse_server_range("servers_0_2").is_err());
    }

    #[test]
    fn test_unknown_pattern_reference() {
        let yaml = BUILTIN_CONFIG_YAML.replace(
            "{ pattern: no_retention, start_size_mb: 9000.0 }",
            "{ pattern: exponential }",
        );
        let err = SimulatorConfig::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, SimError::Pattern { ref name } if name == "exponential"));
    }

    #[test]
    fn test_override_for_unknown_database() {
        let yaml = BUILTIN_CONFIG_YAML.replace(
            "Server2/CustomerCore_DB: {",
            "Server9/CustomerCore_DB: {",
        );
        let err = SimulatorConfig::from_yaml(&yaml).unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
        assert!(err.to_string().contains("Server9/CustomerCore_DB"));
    }

    #[test]
    fn test_anomaly_too_coarse_for_log_rule() {
        // the 64 MB log rule only leaves room for increments up to 6.4 MB
        let yaml = BUILTIN_CONFIG_YAML.replace("file_types: [data]", "file_types: [data, log]");
        let err = SimulatorConfig::from_yaml(&yaml).unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
        assert!(err.to_string().contains("Server2/PrimaryStore_DB"));
        assert!(err.to_string().contains("log autogrowth"));

        let yaml = yaml.replace("frequency_multiplier: 10.0", "frequency_multiplier: 8.0");
        let config = SimulatorConfig::from_yaml(&yaml).unwrap();
        let anomaly = config.anomaly_for("Server2", "PrimaryStore_DB").unwrap();
        assert!(anomaly.applies_to(FileType::Log));
    }

    #[test]
    fn test_range_beyond_server_count() {
        let yaml = BUILTIN_CONFIG_YAML.replace("servers_3_3", "servers_3_9");
        let err = SimulatorConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("servers_3_9"));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = SimulatorConfig::from_yaml("server_count: [").unwrap_err();
        assert!(matches!(err, SimError::Yaml(_)));
    }

    #[test]
    fn test_yaml_roundtrip_keeps_servers() {
        let config = SimulatorConfig::builtin().unwrap();
        let yaml = config.to_yaml().unwrap();
        let reparsed = SimulatorConfig::from_yaml(&yaml).unwrap();
        assert_eq!(
            reparsed.resolve_servers().unwrap(),
            config.resolve_servers().unwrap()
        );
    }
}
