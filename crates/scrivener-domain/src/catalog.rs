//! Field catalog: the addressable fields of one document type

use crate::{FieldPath, SchemaField};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised when a field cannot join a catalog
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The field names a parent that is not in the catalog yet
    #[error("Field '{path}' references missing parent '{parent}'")]
    MissingParent {
        /// Path of the rejected field
        path: String,
        /// Parent path that could not be found
        parent: String,
    },
}

/// Set of schema fields for one document type, keyed by path
///
/// Insertion order is kept (parents are always inserted before their
/// children); [`FieldCatalog::sorted`] gives the lexicographic display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "CatalogRecord", into = "CatalogRecord")]
pub struct FieldCatalog {
    document_type: String,
    fields: Vec<SchemaField>,
    index: HashMap<String, usize>,
}

impl FieldCatalog {
    /// Create an empty catalog for a document type
    pub fn new(document_type: impl Into<String>) -> Self {
        Self {
            document_type: document_type.into(),
            fields: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Document type this catalog describes
    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    /// Insert a field, keeping the first definition seen for a path
    ///
    /// Returns `Ok(true)` when the field was added and `Ok(false)` when a field
    /// with the same path already existed.
    pub fn insert(&mut self, field: SchemaField) -> Result<bool, CatalogError> {
        let key = field.path.to_string();
        if self.index.contains_key(&key) {
            return Ok(false);
        }
        if let Some(parent) = &field.parent_path {
            let parent = parent.to_string();
            if !self.index.contains_key(&parent) {
                return Err(CatalogError::MissingParent { path: key, parent });
            }
        }
        self.index.insert(key, self.fields.len());
        self.fields.push(field);
        Ok(true)
    }

    /// Look up a field by its type-level path string
    pub fn get(&self, path: &str) -> Option<&SchemaField> {
        self.index.get(path).map(|&i| &self.fields[i])
    }

    /// Look up the catalog field addressed by a concrete (possibly indexed) path
    pub fn resolve(&self, path: &FieldPath) -> Option<&SchemaField> {
        self.get(&path.type_level().to_string())
    }

    /// Whether the catalog holds a field at `path`
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &SchemaField> {
        self.fields.iter()
    }

    /// Fields sorted lexicographically by path
    pub fn sorted(&self) -> Vec<&SchemaField> {
        let mut fields: Vec<&SchemaField> = self.fields.iter().collect();
        fields.sort_by_key(|f| f.path.to_string());
        fields
    }

    /// Fields that are not array items, in insertion order
    pub fn top_level(&self) -> impl Iterator<Item = &SchemaField> {
        self.fields.iter().filter(|f| !f.is_array_item)
    }

    /// Array-item fields whose parent is `array_path`, in insertion order
    pub fn nested_fields(&self, array_path: &FieldPath) -> Vec<&SchemaField> {
        self.fields
            .iter()
            .filter(|f| f.is_array_item && f.parent_path.as_ref() == Some(array_path))
            .collect()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the catalog holds no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Consume the catalog, returning its fields in insertion order
    pub fn into_fields(self) -> Vec<SchemaField> {
        self.fields
    }
}

/// Serialized form: document type plus fields in insertion order
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogRecord {
    document_type: String,
    fields: Vec<SchemaField>,
}

impl From<CatalogRecord> for FieldCatalog {
    fn from(record: CatalogRecord) -> Self {
        let mut catalog = FieldCatalog::new(record.document_type);
        for field in record.fields {
            // Hand-edited catalogs may list children first; keep them anyway.
            let key = field.path.to_string();
            if !catalog.index.contains_key(&key) {
                catalog.index.insert(key, catalog.fields.len());
                catalog.fields.push(field);
            }
        }
        catalog
    }
}

impl From<FieldCatalog> for CatalogRecord {
    fn from(catalog: FieldCatalog) -> Self {
        Self {
            document_type: catalog.document_type,
            fields: catalog.fields,
        }
    }
}
