//! Options for catalog inference

use serde::{Deserialize, Serialize};

/// Default recursion ceiling for declarative schema traversal
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Options controlling catalog inference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaOptions {
    /// Maximum nesting depth followed in declarative type definitions
    ///
    /// Self-referential type graphs are truncated at this depth rather than
    /// reported as errors.
    pub max_depth: usize,

    /// Maximum number of sample documents probed per document type
    pub sample_limit: usize,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            sample_limit: 10,
        }
    }
}

impl SchemaOptions {
    /// Validate the options
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("max_depth must be greater than 0".to_string());
        }
        if self.sample_limit == 0 {
            return Err("sample_limit must be greater than 0".to_string());
        }
        Ok(())
    }
}
