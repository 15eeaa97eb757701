//! Schema fields and their kinds

use crate::FieldPath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminator value marking a rich-text block
pub const BLOCK_TYPE: &str = "block";

/// Kind of content a field holds
///
/// Built-in kinds get their own variant; anything else a deployment defines
/// (a module type such as `quoteModule`) is carried as [`FieldKind::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    /// Single-line string
    String,
    /// Multi-line plain text
    Text,
    /// Integer or float
    Number,
    /// True/false
    Boolean,
    /// Calendar date (`YYYY-MM-DD`)
    Date,
    /// Timestamp
    Datetime,
    /// URL-safe identifier
    Slug,
    /// Image asset
    Image,
    /// Pointer to another document
    Reference,
    /// Plain nested object
    Object,
    /// Array of items
    Array,
    /// Rich-text block sequence
    BlockContent,
    /// Deployment-defined module or object type
    Custom(String),
}

impl FieldKind {
    /// Parse a kind from a schema type name
    pub fn parse(name: &str) -> Self {
        match name {
            "string" | "url" | "email" => FieldKind::String,
            "text" => FieldKind::Text,
            "number" => FieldKind::Number,
            "boolean" => FieldKind::Boolean,
            "date" => FieldKind::Date,
            "datetime" => FieldKind::Datetime,
            "slug" => FieldKind::Slug,
            "image" => FieldKind::Image,
            "reference" => FieldKind::Reference,
            "object" => FieldKind::Object,
            "array" => FieldKind::Array,
            "blockContent" | BLOCK_TYPE => FieldKind::BlockContent,
            other => FieldKind::Custom(other.to_string()),
        }
    }

    /// Type name as shown to users and written to catalogs
    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::String => "string",
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::Datetime => "datetime",
            FieldKind::Slug => "slug",
            FieldKind::Image => "image",
            FieldKind::Reference => "reference",
            FieldKind::Object => "object",
            FieldKind::Array => "array",
            FieldKind::BlockContent => "blockContent",
            FieldKind::Custom(name) => name,
        }
    }

    /// Date or datetime
    pub fn is_temporal(&self) -> bool {
        matches!(self, FieldKind::Date | FieldKind::Datetime)
    }

    /// Whether generated strings for this kind are run through text cleanup
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            FieldKind::String | FieldKind::Text | FieldKind::BlockContent | FieldKind::Array
        )
    }

    /// Whether a string value for this kind becomes rich-text blocks
    pub fn holds_rich_text(&self) -> bool {
        matches!(self, FieldKind::BlockContent | FieldKind::Array)
    }
}

impl From<String> for FieldKind {
    fn from(name: String) -> Self {
        FieldKind::parse(&name)
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One addressable field of a document type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    /// Property name (last path segment)
    pub name: String,

    /// Type-level path
    #[serde(with = "path_string")]
    pub path: FieldPath,

    /// Content kind
    #[serde(rename = "type")]
    pub kind: FieldKind,

    /// Human-readable breadcrumb title
    pub title: String,

    /// Path of the enclosing field, if any
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_path_string")]
    pub parent_path: Option<FieldPath>,

    /// Module discriminator for fields inside polymorphic arrays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_type: Option<String>,

    /// Lives inside an array item
    #[serde(default)]
    pub is_array_item: bool,

    /// Cannot be set as a bare top-level key
    #[serde(default)]
    pub is_virtual: bool,
}

impl SchemaField {
    /// A top-level or plain-object field
    pub fn new(path: FieldPath, kind: FieldKind, title: impl Into<String>) -> Self {
        Self {
            name: path.leaf().to_string(),
            path,
            kind,
            title: title.into(),
            parent_path: None,
            module_type: None,
            is_array_item: false,
            is_virtual: false,
        }
    }

    /// Set the parent path
    pub fn with_parent(mut self, parent: FieldPath) -> Self {
        self.parent_path = Some(parent);
        self
    }

    /// Mark as living inside items of an array, optionally tagged with a module type
    pub fn in_array_item(mut self, module_type: Option<String>) -> Self {
        self.is_array_item = true;
        self.is_virtual = true;
        self.module_type = module_type;
        self
    }

    /// Path segments relative to the enclosing array item
    ///
    /// `modules[].quoteModule.author` with module `quoteModule` yields
    /// `["author"]`; an untagged `items[].label` yields `["label"]`.
    pub fn item_relative_path(&self) -> Vec<String> {
        let rest = self.path.after_array();
        let skip = match (&self.module_type, rest.first()) {
            (Some(module), Some(first)) if first.name() == module && rest.len() > 1 => 1,
            _ => 0,
        };
        rest[skip..].iter().map(|s| s.name().to_string()).collect()
    }
}

mod path_string {
    use crate::FieldPath;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(path: &FieldPath, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(path)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<FieldPath, D::Error> {
        let raw = String::deserialize(d)?;
        FieldPath::parse(&raw).map_err(serde::de::Error::custom)
    }
}

mod opt_path_string {
    use crate::FieldPath;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(path: &Option<FieldPath>, s: S) -> Result<S::Ok, S::Error> {
        match path {
            Some(path) => s.collect_str(path),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<FieldPath>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|raw| FieldPath::parse(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
