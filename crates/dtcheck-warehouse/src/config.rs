//! Warehouse connection settings.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::sql::DEFAULT_SCHEMA;

/// Connection settings, configured once per process.
///
/// `path` and `schema` drive the bundled DuckDB backend. The remote credential
/// fields are carried for backends that need them and are never printed.
#[derive(Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Database file. `None` or `:memory:` opens a private in-memory database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Schema holding both source and target tables.
    #[serde(default = "default_schema")]
    pub schema: String,

    /// SQL script executed once when the warehouse is opened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_sql: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            path: None,
            schema: default_schema(),
            init_sql: None,
            account: None,
            user: None,
            password: None,
            database: None,
            warehouse: None,
            role: None,
        }
    }
}

impl WarehouseConfig {
    /// In-memory warehouse using the given schema.
    #[must_use]
    pub fn in_memory(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            ..Self::default()
        }
    }

    /// Human-readable location, for logs.
    pub fn location(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => ":memory:".to_string(),
        }
    }
}

impl fmt::Debug for WarehouseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarehouseConfig")
            .field("path", &self.path)
            .field("schema", &self.schema)
            .field("init_sql", &self.init_sql)
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("database", &self.database)
            .field("warehouse", &self.warehouse)
            .field("role", &self.role)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_password() {
        let config = WarehouseConfig {
            password: Some("hunter2".to_string()),
            ..WarehouseConfig::in_memory("analytics")
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn schema_defaults_when_omitted() {
        let config: WarehouseConfig = toml::from_str("path = \"wh.duckdb\"").unwrap();
        assert_eq!(config.schema, DEFAULT_SCHEMA);
        assert_eq!(config.location(), "wh.duckdb");
    }

    #[test]
    fn password_is_never_serialized() {
        let config = WarehouseConfig {
            password: Some("hunter2".to_string()),
            ..WarehouseConfig::in_memory("analytics")
        };
        let text = toml::to_string(&config).unwrap();
        assert!(!text.contains("hunter2"));
    }
}
