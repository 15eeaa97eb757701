//! Document-shaped values
//!
//! [`DocNode`] is the one recursive type every traversal in Scrivener works
//! on: probing sample documents, normalizing generated values, and building
//! the reconstructed document. Objects carrying a `_type` discriminator are
//! split out as [`DocNode::Tagged`] so the distinction is made once, at the
//! JSON boundary, instead of at every call site.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Discriminator property name
pub const TYPE_KEY: &str = "_type";

/// Stable per-item key property name
pub const KEY_KEY: &str = "_key";

/// Prefix of platform-reserved property names (`_id`, `_rev`, `_type`, ...)
pub const RESERVED_PREFIX: char = '_';

/// Whether a property name is internal to the content platform
pub fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

/// Property map of an object node
pub type Fields = BTreeMap<String, DocNode>;

/// A JSON-like document value with discriminated objects split out
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum DocNode {
    /// JSON null
    #[default]
    Null,
    /// JSON boolean
    Bool(bool),
    /// JSON number
    Number(Number),
    /// JSON string
    String(String),
    /// JSON array
    Array(Vec<DocNode>),
    /// Object with a `_type` discriminator
    Tagged {
        /// Discriminator value
        tag: String,
        /// Stable item key, if present
        key: Option<String>,
        /// Remaining properties (`_type` and `_key` excluded)
        fields: Fields,
    },
    /// Object without a discriminator
    Object(Fields),
}

impl DocNode {
    /// A string node
    pub fn string(value: impl Into<String>) -> Self {
        DocNode::String(value.into())
    }

    /// A tagged object node without a key
    pub fn tagged(tag: impl Into<String>, fields: Fields) -> Self {
        DocNode::Tagged {
            tag: tag.into(),
            key: None,
            fields,
        }
    }

    /// Whether this is JSON null
    pub fn is_null(&self) -> bool {
        matches!(self, DocNode::Null)
    }

    /// Borrow the string value, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocNode::String(s) => Some(s),
            _ => None,
        }
    }

    /// Discriminator value, if this is a tagged object
    pub fn tag(&self) -> Option<&str> {
        match self {
            DocNode::Tagged { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Whether this is a tagged object with the given discriminator
    pub fn has_tag(&self, expected: &str) -> bool {
        self.tag() == Some(expected)
    }

    /// Item key of an object node (tagged or plain)
    pub fn key(&self) -> Option<&str> {
        match self {
            DocNode::Tagged { key, .. } => key.as_deref(),
            DocNode::Object(fields) => fields.get(KEY_KEY).and_then(DocNode::as_str),
            _ => None,
        }
    }

    /// Property map of an object node (tagged or plain)
    pub fn fields(&self) -> Option<&Fields> {
        match self {
            DocNode::Tagged { fields, .. } | DocNode::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Give an object node a key if it has none
    ///
    /// Scalars and arrays are left untouched. Returns whether a key was added.
    pub fn ensure_key(&mut self, generate: impl FnOnce() -> String) -> bool {
        match self {
            DocNode::Tagged { key, .. } => match key {
                Some(existing) if !existing.is_empty() => false,
                _ => {
                    *key = Some(generate());
                    true
                }
            },
            DocNode::Object(fields) => {
                let present = fields
                    .get(KEY_KEY)
                    .and_then(DocNode::as_str)
                    .is_some_and(|k| !k.is_empty());
                if present {
                    false
                } else {
                    fields.insert(KEY_KEY.to_string(), DocNode::String(generate()));
                    true
                }
            }
            _ => false,
        }
    }

    /// Convert into a `serde_json::Value`
    pub fn into_value(self) -> Value {
        self.into()
    }
}

impl From<Value> for DocNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => DocNode::Null,
            Value::Bool(b) => DocNode::Bool(b),
            Value::Number(n) => DocNode::Number(n),
            Value::String(s) => DocNode::String(s),
            Value::Array(items) => DocNode::Array(items.into_iter().map(DocNode::from).collect()),
            Value::Object(mut map) => {
                let tag = match map.get(TYPE_KEY) {
                    Some(Value::String(tag)) if !tag.is_empty() => Some(tag.clone()),
                    _ => None,
                };
                match tag {
                    Some(tag) => {
                        map.remove(TYPE_KEY);
                        let key = match map.remove(KEY_KEY) {
                            Some(Value::String(key)) => Some(key),
                            _ => None,
                        };
                        DocNode::Tagged {
                            tag,
                            key,
                            fields: object_fields(map),
                        }
                    }
                    None => DocNode::Object(object_fields(map)),
                }
            }
        }
    }
}

fn object_fields(map: Map<String, Value>) -> Fields {
    map.into_iter().map(|(k, v)| (k, DocNode::from(v))).collect()
}

impl From<DocNode> for Value {
    fn from(node: DocNode) -> Self {
        match node {
            DocNode::Null => Value::Null,
            DocNode::Bool(b) => Value::Bool(b),
            DocNode::Number(n) => Value::Number(n),
            DocNode::String(s) => Value::String(s),
            DocNode::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            DocNode::Tagged { tag, key, fields } => {
                let mut map = Map::new();
                map.insert(TYPE_KEY.to_string(), Value::String(tag));
                if let Some(key) = key {
                    map.insert(KEY_KEY.to_string(), Value::String(key));
                }
                for (k, v) in fields {
                    map.insert(k, v.into());
                }
                Value::Object(map)
            }
            DocNode::Object(fields) => {
                Value::Object(fields.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&str> for DocNode {
    fn from(s: &str) -> Self {
        DocNode::String(s.to_string())
    }
}

impl From<String> for DocNode {
    fn from(s: String) -> Self {
        DocNode::String(s)
    }
}
