//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the content pipeline and the
//! surrounding application. Implementations live in other crates.

/// Trait for generative text providers
///
/// Implemented by the infrastructure layer (scrivener-llm). The network call
/// itself, its retries and its timeouts belong to the implementation.
pub trait LlmProvider {
    /// Error type for provider operations
    type Error;

    /// Generate text for a prompt
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Name of the model behind this provider, for result metadata
    fn model_name(&self) -> &str {
        "llm"
    }
}
