//! Harness configuration loaded from `dtcheck.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use dtcheck_runner::TransformConfig;
use dtcheck_warehouse::WarehouseConfig;

pub const DEFAULT_CONFIG_FILE: &str = "dtcheck.toml";

/// Environment variable supplying the warehouse password.
pub const PASSWORD_ENV: &str = "DTCHECK_WAREHOUSE_PASSWORD";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Specification files, run in the listed order.
    pub specs: Vec<PathBuf>,
    pub warehouse: WarehouseConfig,
    pub transform: TransformConfig,
}

impl HarnessConfig {
    /// Load `path`, or `dtcheck.toml` in the working directory when it exists.
    ///
    /// Without either, the defaults apply: an in-memory warehouse and
    /// `dbt run` in the working directory.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                debug!("no configuration file; using defaults");
                Self::default()
            }
        };
        config.apply_password(std::env::var(PASSWORD_ENV).ok());
        Ok(config)
    }

    /// Parse a configuration file. Relative paths inside it resolve against
    /// the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let mut config: Self =
            toml::from_str(&text).with_context(|| format!("parse config {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        debug!(config = %path.display(), spec_count = config.specs.len(), "loaded configuration");
        Ok(config)
    }

    /// Fill the password from the environment unless the file set one.
    pub fn apply_password(&mut self, password: Option<String>) {
        if self.warehouse.password.is_none() {
            self.warehouse.password = password;
        }
    }

    fn resolve_paths(&mut self, base: &Path) {
        for spec in &mut self.specs {
            *spec = resolve(base, spec);
        }
        if let Some(path) = &mut self.warehouse.path
            && path.as_os_str() != ":memory:"
        {
            *path = resolve(base, path);
        }
        if let Some(path) = &mut self.warehouse.init_sql {
            *path = resolve(base, path);
        }
        self.transform.project_dir = resolve(base, &self.transform.project_dir);
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_from_file_wins() {
        let mut config = HarnessConfig::default();
        config.warehouse.password = Some("from-file".to_string());
        config.apply_password(Some("from-env".to_string()));
        assert_eq!(config.warehouse.password.as_deref(), Some("from-file"));

        let mut config = HarnessConfig::default();
        config.apply_password(Some("from-env".to_string()));
        assert_eq!(config.warehouse.password.as_deref(), Some("from-env"));
    }

    #[test]
    fn absolute_paths_are_kept() {
        let base = Path::new("/project");
        assert_eq!(resolve(base, Path::new("/abs/spec.yml")), PathBuf::from("/abs/spec.yml"));
        assert_eq!(resolve(base, Path::new("spec.yml")), PathBuf::from("/project/spec.yml"));
    }
}
