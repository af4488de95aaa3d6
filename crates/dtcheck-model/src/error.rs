use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid table name: {0:?}")]
    InvalidTableName(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
