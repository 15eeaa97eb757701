//! Scrivener Extractor
//!
//! Expands free-form notes into structured documents for a content platform.
//!
//! # Overview
//!
//! A generative provider is asked to fill the fields of a target document
//! type, described by a [`FieldCatalog`](scrivener_domain::FieldCatalog). Its
//! answer is a flat JSON object keyed by field path, and it is not always
//! well-formed. The extractor repairs and parses that answer, normalizes each
//! value by its field kind, and rebuilds the nested document the platform
//! expects: objects, arrays of typed modules with stable `_key`s, slugs and
//! rich-text blocks.
//!
//! # Architecture
//!
//! ```text
//! Note → Prompt → LLM → Parse/Repair → Validate → Normalize → Reconstruct → Document
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use scrivener_domain::{FieldCatalog, FieldKind, FieldPath, RandomKeys, SchemaField};
//! use scrivener_extractor::{ExtractorConfig, FieldSelection, GenerationRequest, Generator};
//! use scrivener_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut catalog = FieldCatalog::new("post");
//! catalog.insert(SchemaField::new(FieldPath::parse("title")?, FieldKind::String, "Title"))?;
//!
//! let llm = MockProvider::new(r#"{"title": "Notes from the north"}"#);
//! let generator = Generator::new(llm, RandomKeys, ExtractorConfig::default());
//!
//! let request = GenerationRequest {
//!     title: "Trip".to_string(),
//!     body: "We went north.".to_string(),
//!     document_type: "post".to_string(),
//!     selection: FieldSelection::all(&catalog),
//!     catalog,
//! };
//!
//! let result = generator.generate(request).await?;
//!
//! println!("{}", serde_json::to_string_pretty(&result.document.into_value())?);
//! println!("Warnings: {}", result.warnings.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod blocks;
mod config;
mod dates;
mod error;
mod generator;
mod markdown;
mod normalizer;
mod parser;
mod prompt;
mod reconstructor;
mod types;


pub use blocks::text_to_blocks;
pub use config::ExtractorConfig;
pub use dates::{normalize_date, normalize_datetime};
pub use error::ExtractorError;
pub use generator::Generator;
pub use markdown::{canonicalize, clean_text};
pub use normalizer::FieldNormalizer;
pub use parser::{parse_response, validate_required, ParsedResponse};
pub use prompt::PromptBuilder;
pub use reconstructor::{slugify, Reconstruction, Reconstructor};
pub use types::{
    FieldSelection, FieldSetting, FieldWarning, GenerationMetadata, GenerationRequest,
    GenerationResult, RepairStage, WarningKind,
};
