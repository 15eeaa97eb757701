//! Scrivener Domain Layer
//!
//! Shared vocabulary for turning generated note expansions into documents of
//! an arbitrary content schema. This crate performs no I/O; it defines the
//! types every other crate passes around.
//!
//! ## Key Concepts
//!
//! - **Field Path**: `segment ('.' segment)*` address, with `name[]` array
//!   segments and, in generated maps only, explicit `name[3]` indices
//! - **Schema Field / Field Catalog**: the addressable fields of one document type
//! - **DocNode**: recursive document value with discriminated objects split out
//! - **Value Map**: flat path → value map parsed from provider output
//! - **Key Generator**: stable `_key` source for array items

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod field;
pub mod field_path;
pub mod keys;
pub mod node;
pub mod traits;
pub mod value_map;

// Re-exports for convenience
pub use catalog::{CatalogError, FieldCatalog};
pub use field::{FieldKind, SchemaField, BLOCK_TYPE};
pub use field_path::{FieldPath, PathError, Segment};
pub use keys::{KeyGenerator, RandomKeys, SequentialKeys};
pub use node::{is_reserved, DocNode, Fields, KEY_KEY, TYPE_KEY};
pub use traits::LlmProvider;
pub use value_map::ValueMap;
