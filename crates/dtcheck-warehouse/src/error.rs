//! Error types for warehouse operations.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("warehouse error: {0}")]
    Database(#[from] duckdb::Error),

    /// Table does not exist in the configured schema.
    #[error("table {schema}.{table} not found")]
    TableNotFound { schema: String, table: String },

    /// More than one table matches a name case-insensitively and none exactly.
    #[error("table name {table} is ambiguous in schema {schema}: {candidates}")]
    AmbiguousTable {
        schema: String,
        table: String,
        candidates: String,
    },

    /// Fixture column with no counterpart in the live schema.
    #[error("column '{column}' does not exist in table {table}")]
    UnknownColumn { table: String, column: String },

    #[error("failed to read init SQL {path}: {source}")]
    InitSql {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for WarehouseError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WarehouseError>;
