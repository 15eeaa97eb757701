//! Scrivener Schema
//!
//! Infers the field catalog of a document type.
//!
//! Two strategies are available:
//! - Declarative extraction from type definitions (bounded-depth descent)
//! - Sample probing when no definitions exist
//!
//! Partial catalogs from several samples are merged first-seen-wins.
//!
//! # Examples
//!
//! ```no_run
//! use scrivener_schema::{CatalogService, InMemorySchemaSource};
//! use serde_json::json;
//!
//! let source = InMemorySchemaSource::new()
//!     .with_samples(vec![json!({"_type": "post", "title": "Hello"})]);
//! let service = CatalogService::new(source);
//! let catalog = service.catalog("post");
//! assert!(catalog.contains("title"));
//! ```

#![warn(missing_docs)]

mod declarative;
mod definition;
mod error;
mod merger;
mod options;
mod prober;
mod service;
mod source;
pub mod title;

pub use declarative::DeclarativeExtractor;
pub use definition::{SchemaRegistry, TypeDefinition, DOCUMENT_TYPE};
pub use error::SchemaError;
pub use merger::merge_catalogs;
pub use options::{SchemaOptions, DEFAULT_MAX_DEPTH};
pub use prober::SampleProber;
pub use service::CatalogService;
pub use source::{InMemorySchemaSource, SchemaSource};
