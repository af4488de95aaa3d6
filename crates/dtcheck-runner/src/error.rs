//! Error types for specification loading and run orchestration.

use std::path::PathBuf;

use thiserror::Error;

use dtcheck_normalize::NormalizeError;
use dtcheck_warehouse::WarehouseError;

/// Errors raised while loading a specification document.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to read specification {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse specification {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid specification {name}: {message}")]
    Invalid { name: String, message: String },
}

/// Errors that abort a specification or the whole run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The transformation pipeline reported failure. Fatal to the current
    /// specification; nothing is extracted or compared.
    #[error("transformation failed: {reason}")]
    TransformFailed { reason: String },

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("failed to write actuals to {path}: {source}")]
    Dump {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize actuals: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result alias for run orchestration.
pub type Result<T, E = RunError> = std::result::Result<T, E>;

impl RunError {
    /// True for the transformation failure, which ends only the current specification.
    pub fn is_transform_failure(&self) -> bool {
        matches!(self, Self::TransformFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_failure_is_distinguished() {
        let err = RunError::TransformFailed {
            reason: "`dbt` exited with exit status: 1".to_string(),
        };
        assert!(err.is_transform_failure());
        assert_eq!(
            err.to_string(),
            "transformation failed: `dbt` exited with exit status: 1"
        );

        let other = RunError::Spec(SpecError::Invalid {
            name: "demo".to_string(),
            message: "bad".to_string(),
        });
        assert!(!other.is_transform_failure());
    }
}
