//! Scrivener LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `scrivener-domain`.
//!
//! The network call to a real generative provider is owned by the
//! surrounding application; this crate ships the deterministic provider used
//! by tests and offline runs.
//!
//! # Examples
//!
//! ```
//! use scrivener_llm::MockProvider;
//! use scrivener_domain::LlmProvider;
//!
//! let provider = MockProvider::new(r#"{"title": "Hello"}"#);
//! let result = provider.generate("any prompt").unwrap();
//! assert_eq!(result, r#"{"title": "Hello"}"#);
//! ```

#![warn(missing_docs)]

use scrivener_domain::LlmProvider;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during provider calls
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Provider answered with something unusable
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Canned reply for prompts containing a fragment
#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail,
}

/// Mock provider for deterministic testing
///
/// Returns pre-configured responses without any network calls. Rules are
/// matched in insertion order against a fragment of the prompt, since real
/// prompts embed the whole note and catalog.
///
/// # Examples
///
/// ```
/// use scrivener_llm::MockProvider;
/// use scrivener_domain::LlmProvider;
///
/// let provider = MockProvider::default()
///     .respond_when("Document type: post", r#"{"title": "A post"}"#)
///     .fail_when("Document type: broken");
///
/// assert_eq!(provider.generate("Document type: post\n...").unwrap(), r#"{"title": "A post"}"#);
/// assert!(provider.generate("Document type: broken").is_err());
/// assert_eq!(provider.call_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    rules: Vec<(String, Reply)>,
    model: String,
    delay: Option<Duration>,
    call_count: Arc<AtomicUsize>,
    last_prompt: Arc<Mutex<Option<String>>>,
}

impl MockProvider {
    /// Create a provider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            rules: Vec::new(),
            model: "mock".to_string(),
            delay: None,
            call_count: Arc::new(AtomicUsize::new(0)),
            last_prompt: Arc::new(Mutex::new(None)),
        }
    }

    /// Respond with `response` to prompts containing `fragment`
    pub fn respond_when(mut self, fragment: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules
            .push((fragment.into(), Reply::Text(response.into())));
        self
    }

    /// Fail prompts containing `fragment`
    pub fn fail_when(mut self, fragment: impl Into<String>) -> Self {
        self.rules.push((fragment.into(), Reply::Fail));
        self
    }

    /// Report a different model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Block for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times generate was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// The most recent prompt received
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("{}")
    }
}

impl LlmProvider for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let reply = self
            .rules
            .iter()
            .find(|(fragment, _)| prompt.contains(fragment.as_str()))
            .map(|(_, reply)| reply);
        match reply {
            Some(Reply::Text(text)) => Ok(text.clone()),
            Some(Reply::Fail) => {
                debug!("Mock provider failing prompt by rule");
                Err(LlmError::Other("Mock error".to_string()))
            }
            None => Ok(self.default_response.clone()),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        assert_eq!(provider.generate("any prompt").unwrap(), "Test response");
        assert_eq!(provider.model_name(), "mock");
    }

    #[test]
    fn test_rules_match_in_order() {
        let provider = MockProvider::default()
            .respond_when("hello", "first")
            .respond_when("hello world", "second");

        assert_eq!(provider.generate("hello world").unwrap(), "first");
        assert_eq!(provider.generate("unknown").unwrap(), "{}");
    }

    #[test]
    fn test_call_count_and_last_prompt() {
        let provider = MockProvider::new("x");
        assert_eq!(provider.call_count(), 0);
        assert!(provider.last_prompt().is_none());

        provider.generate("one").unwrap();
        provider.generate("two").unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.last_prompt().as_deref(), Some("two"));
    }

    #[test]
    fn test_failure_rule() {
        let provider = MockProvider::default().fail_when("bad");
        let result = provider.generate("a bad prompt");
        assert!(matches!(result, Err(LlmError::Other(_))));
    }

    #[test]
    fn test_clone_shares_counters() {
        let provider1 = MockProvider::new("test").with_model("tiny");
        let provider2 = provider1.clone();

        provider1.generate("test").unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
        assert_eq!(provider2.model_name(), "tiny");
    }
}
