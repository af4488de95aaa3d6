//! Error types for table normalization.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    /// A schema column has no counterpart in the extracted frame.
    #[error("column '{column}' not found in extracted data")]
    MissingColumn { column: String },

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for NormalizeError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NormalizeError>;
