//! Error types for the generation pipeline

use thiserror::Error;

/// Errors that abort a generation attempt
///
/// Per-field problems are not errors; they surface as
/// [`FieldWarning`](crate::FieldWarning)s on the result.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Generation timeout
    #[error("Generation timeout")]
    Timeout,

    /// Note exceeds maximum length
    #[error("Note too long: {0} chars (max: {1})")]
    NoteTooLong(usize, usize),

    /// No repair stage produced a JSON object
    #[error("Could not parse provider response: {message}")]
    Parse {
        /// Error from the last stage attempted
        message: String,
        /// Leading excerpt of the raw response
        original_excerpt: String,
        /// Leading excerpt of the text that was handed to the JSON parser
        extracted_excerpt: String,
    },

    /// Enabled fields absent from the parsed response
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// Malformed input other than the provider response
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A normalization task failed to run
    #[error("Normalization error: {0}")]
    Normalization(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::InvalidFormat(e.to_string())
    }
}
