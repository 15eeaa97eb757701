//! Request and response types for generation

use crate::ExtractorError;
use scrivener_domain::{DocNode, FieldCatalog};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request to expand a note into a document
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Note title
    pub title: String,

    /// Note body
    pub body: String,

    /// Target document type
    pub document_type: String,

    /// Catalog of the target document type
    pub catalog: FieldCatalog,

    /// Fields to generate
    pub selection: FieldSelection,
}

impl GenerationRequest {
    /// Length of the note in characters
    pub fn note_length(&self) -> usize {
        self.title.chars().count() + self.body.chars().count()
    }
}

/// One selected field and its optional instructions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSetting {
    /// Catalog path
    pub path: String,

    /// Whether the field is generated
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,

    /// Free-text instructions for the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

fn enabled_by_default() -> bool {
    true
}

/// Which catalog fields a generation should fill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSelection {
    fields: Vec<FieldSetting>,
}

impl FieldSelection {
    /// Empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Every non-virtual field of a catalog, without instructions
    pub fn all(catalog: &FieldCatalog) -> Self {
        Self {
            fields: catalog
                .iter()
                .filter(|f| !f.is_virtual)
                .map(|f| FieldSetting {
                    path: f.path.to_string(),
                    enabled: true,
                    instructions: None,
                })
                .collect(),
        }
    }

    /// Parse a JSON array of field settings
    pub fn from_json(json: &str) -> Result<Self, ExtractorError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Enable a field
    pub fn enable(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        match self.fields.iter_mut().find(|s| s.path == path) {
            Some(setting) => setting.enabled = true,
            None => self.fields.push(FieldSetting {
                path,
                enabled: true,
                instructions: None,
            }),
        }
        self
    }

    /// Enable a field with instructions
    pub fn with_instructions(mut self, path: impl Into<String>, instructions: impl Into<String>) -> Self {
        let path = path.into();
        let instructions = Some(instructions.into());
        match self.fields.iter_mut().find(|s| s.path == path) {
            Some(setting) => {
                setting.enabled = true;
                setting.instructions = instructions;
            }
            None => self.fields.push(FieldSetting {
                path,
                enabled: true,
                instructions,
            }),
        }
        self
    }

    /// Whether a path is enabled
    pub fn is_enabled(&self, path: &str) -> bool {
        self.fields.iter().any(|s| s.enabled && s.path == path)
    }

    /// Instructions attached to a path
    pub fn instructions(&self, path: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|s| s.enabled && s.path == path)
            .and_then(|s| s.instructions.as_deref())
    }

    /// Whether nothing is enabled
    pub fn is_empty(&self) -> bool {
        !self.fields.iter().any(|s| s.enabled)
    }
}

/// Which repair stage produced the parsed response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStage {
    /// Parsed as extracted
    Direct,
    /// Parsed after escaping control characters in simple string literals
    EscapedControls,
    /// Parsed after escaping control characters in literals with escaped quotes
    EscapedControlsWithQuotes,
}

impl fmt::Display for RepairStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RepairStage::Direct => "direct",
            RepairStage::EscapedControls => "escaped-controls",
            RepairStage::EscapedControlsWithQuotes => "escaped-controls-with-quotes",
        };
        f.write_str(name)
    }
}

/// Kind of a non-fatal field problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// An unparseable date was dropped
    DateValidation,
    /// Text cleanup failed; the original value was kept
    Normalization,
}

/// A field-level problem that did not abort generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldWarning {
    /// Value-map key the warning concerns
    pub path: String,

    /// What went wrong
    pub kind: WarningKind,

    /// Human-readable detail
    pub message: String,
}

/// Result of a generation
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    /// Reconstructed document, tagged with its document type
    pub document: DocNode,

    /// Non-fatal field problems
    pub warnings: Vec<FieldWarning>,

    /// Value-map keys no catalog field claimed
    pub unmatched_keys: Vec<String>,

    /// Metadata about the generation
    pub metadata: GenerationMetadata,
}

/// Metadata about a generation
#[derive(Debug, Clone, Serialize)]
pub struct GenerationMetadata {
    /// Target document type
    pub document_type: String,

    /// Name of the model used
    pub model_name: String,

    /// Repair stage that produced the value map
    pub repair_stage: RepairStage,

    /// Number of value-map entries parsed
    pub fields_generated: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}
