use super::types::SqlType;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Invalid root: expected a JSON object or array, got {0}")]
    InvalidRoot(String),

    #[error("Name collision in table '{table}': '{key}' maps to column '{column}' already used by {existing}")]
    NameCollision {
        table: String,
        column: String,
        key: String,
        existing: String,
    },

    #[error("Type conflict in column '{column}' of table '{table}': {from} cannot hold {with}")]
    TypeWideningConflict {
        table: String,
        column: String,
        from: SqlType,
        with: SqlType,
    },

    #[error("Invalid name: {0}")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, ConversionError>;
