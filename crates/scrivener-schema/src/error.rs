//! Error types for catalog inference

use thiserror::Error;

/// Errors that can occur while reading schema sources
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema source could not be queried
    #[error("Schema source error: {0}")]
    Source(String),

    /// A type definition was structurally invalid
    #[error("Invalid type definition: {0}")]
    InvalidDefinition(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
