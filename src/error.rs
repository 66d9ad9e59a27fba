//! Error types for the schema compiler core

use thiserror::Error;

use crate::diagnostics::Diagnostics;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema compiler errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("schema validation failed with {} error(s):\n{0}", .0.error_count())]
    Validation(Diagnostics),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<Diagnostics> for SchemaError {
    fn from(diagnostics: Diagnostics) -> Self {
        SchemaError::Validation(diagnostics)
    }
}
