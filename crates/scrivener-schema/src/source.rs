//! Schema sources
//!
//! A [`SchemaSource`] is whatever the surrounding application queries for
//! sample documents or type definitions. Only an in-memory implementation
//! lives here; platform clients implement the trait elsewhere.

use crate::definition::SchemaRegistry;
use crate::SchemaError;
use scrivener_domain::TYPE_KEY;
use serde_json::Value;

/// Provider of sample documents and declarative type definitions
pub trait SchemaSource {
    /// Document type names known to the source
    fn document_types(&self) -> Result<Vec<String>, SchemaError>;

    /// Up to `limit` sample documents of the given type
    fn sample_documents(&self, document_type: &str, limit: usize)
        -> Result<Vec<Value>, SchemaError>;

    /// Declarative type definitions, if the source has any
    fn type_definitions(&self) -> Result<Option<SchemaRegistry>, SchemaError>;
}

/// Schema source backed by JSON values held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySchemaSource {
    samples: Vec<Value>,
    registry: Option<SchemaRegistry>,
}

impl InMemorySchemaSource {
    /// Empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add sample documents; each should carry a `_type` discriminator
    pub fn with_samples(mut self, samples: Vec<Value>) -> Self {
        self.samples.extend(samples);
        self
    }

    /// Attach declarative type definitions
    pub fn with_registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build from a JSON array of sample documents (a single object is also accepted)
    pub fn from_samples_json(json: &str) -> Result<Self, SchemaError> {
        let samples = match serde_json::from_str::<Value>(json)? {
            Value::Array(items) => items,
            object @ Value::Object(_) => vec![object],
            other => {
                return Err(SchemaError::Source(format!(
                    "expected an array of documents, got {}",
                    json_kind(&other)
                )))
            }
        };
        Ok(Self::new().with_samples(samples))
    }

    /// Build from a JSON array of type definitions
    pub fn from_definitions_json(json: &str) -> Result<Self, SchemaError> {
        Ok(Self::new().with_registry(SchemaRegistry::from_json(json)?))
    }
}

impl SchemaSource for InMemorySchemaSource {
    fn document_types(&self) -> Result<Vec<String>, SchemaError> {
        let mut types: Vec<String> = self
            .registry
            .iter()
            .flat_map(|r| r.document_types())
            .map(str::to_string)
            .collect();
        for sample in &self.samples {
            if let Some(name) = document_type_of(sample) {
                if !types.iter().any(|t| t == name) {
                    types.push(name.to_string());
                }
            }
        }
        Ok(types)
    }

    fn sample_documents(
        &self,
        document_type: &str,
        limit: usize,
    ) -> Result<Vec<Value>, SchemaError> {
        Ok(self
            .samples
            .iter()
            .filter(|s| document_type_of(s) == Some(document_type))
            .take(limit)
            .cloned()
            .collect())
    }

    fn type_definitions(&self) -> Result<Option<SchemaRegistry>, SchemaError> {
        Ok(self.registry.clone())
    }
}

fn document_type_of(sample: &Value) -> Option<&str> {
    sample.get(TYPE_KEY).and_then(Value::as_str)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
