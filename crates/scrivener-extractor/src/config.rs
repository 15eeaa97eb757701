//! Configuration for the Generator

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum note length, title and body together (characters)
    pub max_note_length: usize,

    /// Maximum time for a single provider call (seconds)
    pub generation_timeout_secs: u64,

    /// Length of the response excerpts attached to parse errors (characters)
    pub diagnostic_excerpt_chars: usize,

    /// Re-render string fields into canonical markdown
    pub normalize_markdown: bool,
}

impl ExtractorConfig {
    /// Get the generation timeout as a Duration
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_note_length == 0 {
            return Err("max_note_length must be greater than 0".to_string());
        }
        if self.generation_timeout_secs == 0 {
            return Err("generation_timeout_secs must be greater than 0".to_string());
        }
        if self.diagnostic_excerpt_chars == 0 {
            return Err("diagnostic_excerpt_chars must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_note_length: 50_000,
            generation_timeout_secs: 120,
            diagnostic_excerpt_chars: 500,
            normalize_markdown: true,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: short notes, short timeout
    pub fn aggressive() -> Self {
        Self {
            max_note_length: 20_000,
            generation_timeout_secs: 60,
            diagnostic_excerpt_chars: 200,
            normalize_markdown: true,
        }
    }

    /// Lenient preset: long notes, long timeout, text kept as written
    pub fn lenient() -> Self {
        Self {
            max_note_length: 100_000,
            generation_timeout_secs: 300,
            diagnostic_excerpt_chars: 1_000,
            normalize_markdown: false,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
