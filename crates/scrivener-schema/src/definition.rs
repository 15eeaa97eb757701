//! Declarative type definitions
//!
//! The shape mirrors what content platforms expose for their schemas:
//! document types hold field definitions; fields may hold inline `fields`
//! (objects) or `of` member types (arrays), or name another registered type.

use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Type name marking a document (top-level) type
pub const DOCUMENT_TYPE: &str = "document";

/// One node of a declarative type-definition tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// Property or type name; absent for anonymous array members
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Base type: a built-in (`string`, `array`, `object`, ...) or another type's name
    #[serde(rename = "type")]
    pub type_name: String,

    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Inline object fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<TypeDefinition>,

    /// Array member types
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub of: Vec<TypeDefinition>,
}

impl TypeDefinition {
    /// Named definition with the given base type
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            type_name: type_name.into(),
            title: None,
            fields: Vec::new(),
            of: Vec::new(),
        }
    }

    /// Anonymous definition (array member by type only)
    pub fn member(type_name: impl Into<String>) -> Self {
        Self {
            name: None,
            type_name: type_name.into(),
            title: None,
            fields: Vec::new(),
            of: Vec::new(),
        }
    }

    /// Set inline fields
    pub fn with_fields(mut self, fields: Vec<TypeDefinition>) -> Self {
        self.fields = fields;
        self
    }

    /// Set array member types
    pub fn with_members(mut self, of: Vec<TypeDefinition>) -> Self {
        self.of = of;
        self
    }

    /// Set the display title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Named type definitions, resolvable by name
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: HashMap<String, TypeDefinition>,
    order: Vec<String>,
}

impl SchemaRegistry {
    /// Build a registry; anonymous top-level definitions are rejected
    pub fn new(definitions: Vec<TypeDefinition>) -> Result<Self, SchemaError> {
        let mut registry = Self::default();
        for definition in definitions {
            let name = definition.name.clone().ok_or_else(|| {
                SchemaError::InvalidDefinition(format!(
                    "top-level type of base '{}' has no name",
                    definition.type_name
                ))
            })?;
            if !registry.types.contains_key(&name) {
                registry.order.push(name.clone());
            }
            registry.types.insert(name, definition);
        }
        Ok(registry)
    }

    /// Parse a JSON array of definitions
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let definitions: Vec<TypeDefinition> = serde_json::from_str(json)?;
        Self::new(definitions)
    }

    /// Look up a named type
    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    /// Names of document types, in definition order
    pub fn document_types(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter(|name| {
                self.types
                    .get(name.as_str())
                    .is_some_and(|t| t.type_name == DOCUMENT_TYPE)
            })
            .map(String::as_str)
            .collect()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_from_json() {
        let registry = SchemaRegistry::from_json(
            r#"[
                {"name": "post", "type": "document", "fields": [{"name": "title", "type": "string"}]},
                {"name": "quoteModule", "type": "object", "fields": [{"name": "quote", "type": "text"}]}
            ]"#,
        )
        .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.document_types(), vec!["post"]);
        assert_eq!(registry.get("quoteModule").unwrap().fields.len(), 1);
    }

    #[test]
    fn test_anonymous_top_level_rejected() {
        let result = SchemaRegistry::new(vec![TypeDefinition::member("object")]);
        assert!(matches!(result, Err(SchemaError::InvalidDefinition(_))));
    }
}
