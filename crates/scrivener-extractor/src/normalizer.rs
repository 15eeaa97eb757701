//! Per-field normalization
//!
//! Each value-map entry is cleaned according to its catalog kind. Problems
//! with a single field never abort generation: the field is dropped (dates)
//! or kept as written (text), and a warning is recorded.

use crate::blocks::text_to_blocks;
use crate::dates::{normalize_date, normalize_datetime};
use crate::markdown::clean_text;
use crate::types::{FieldWarning, WarningKind};
use scrivener_domain::{
    is_reserved, DocNode, FieldCatalog, FieldKind, FieldPath, Fields, KeyGenerator, BLOCK_TYPE,
};
use tracing::warn;

/// Normalizes generated values against a catalog
#[derive(Debug, Clone, Copy)]
pub struct FieldNormalizer {
    reformat_markdown: bool,
}

/// Shared state for normalizing one entry
struct Pass<'a, K: ?Sized> {
    catalog: &'a FieldCatalog,
    keys: &'a K,
    key: &'a str,
    warnings: Vec<FieldWarning>,
}

impl FieldNormalizer {
    /// Create a normalizer; `reformat_markdown` re-renders text canonically
    pub fn new(reformat_markdown: bool) -> Self {
        Self { reformat_markdown }
    }

    /// Normalize one value-map entry
    ///
    /// The kind comes from the catalog entry the key resolves to; keys that
    /// resolve to nothing are normalized by the shape of their value.
    pub fn normalize_entry<K: KeyGenerator + ?Sized>(
        &self,
        key: &str,
        value: DocNode,
        catalog: &FieldCatalog,
        keys: &K,
    ) -> (DocNode, Vec<FieldWarning>) {
        let mut pass = Pass {
            catalog,
            keys,
            key,
            warnings: Vec::new(),
        };
        let path = FieldPath::parse(key).ok().map(|p| p.type_level());
        let value = self.normalize(&mut pass, value, path.as_ref());
        (value, pass.warnings)
    }

    fn normalize<K: KeyGenerator + ?Sized>(
        &self,
        pass: &mut Pass<'_, K>,
        value: DocNode,
        path: Option<&FieldPath>,
    ) -> DocNode {
        let kind = path
            .and_then(|p| pass.catalog.resolve(p))
            .map(|f| f.kind.clone());

        match value {
            DocNode::String(text) => match kind {
                Some(kind) if kind.is_temporal() => self.date(pass, text, &kind),
                kind => self.text(pass, text, kind.as_ref()),
            },
            DocNode::Array(items) => {
                let item_path = path.map(|p| p.clone().into_array());
                DocNode::Array(
                    items
                        .into_iter()
                        .map(|item| self.normalize_item(pass, item, item_path.as_ref()))
                        .collect(),
                )
            }
            DocNode::Tagged { tag, key, fields } => {
                if tag == BLOCK_TYPE {
                    return DocNode::Tagged { tag, key, fields };
                }
                let fields = self.normalize_fields(pass, fields, path);
                DocNode::Tagged { tag, key, fields }
            }
            DocNode::Object(fields) => DocNode::Object(self.normalize_fields(pass, fields, path)),
            other => other,
        }
    }

    /// Items of an array live under `path[]`, or `path[].tag` when tagged
    fn normalize_item<K: KeyGenerator + ?Sized>(
        &self,
        pass: &mut Pass<'_, K>,
        item: DocNode,
        item_path: Option<&FieldPath>,
    ) -> DocNode {
        match item {
            DocNode::String(text) => DocNode::String(self.clean(pass, text)),
            DocNode::Tagged { ref tag, .. } => {
                let path = item_path.map(|p| p.child(tag.as_str()));
                self.normalize(pass, item, path.as_ref())
            }
            other => self.normalize(pass, other, item_path),
        }
    }

    fn normalize_fields<K: KeyGenerator + ?Sized>(
        &self,
        pass: &mut Pass<'_, K>,
        fields: Fields,
        path: Option<&FieldPath>,
    ) -> Fields {
        fields
            .into_iter()
            .map(|(name, value)| {
                if is_reserved(&name) {
                    return (name, value);
                }
                let child = path.map(|p| p.child(name.as_str()));
                let value = self.normalize(pass, value, child.as_ref());
                (name, value)
            })
            .collect()
    }

    fn date<K: KeyGenerator + ?Sized>(
        &self,
        pass: &mut Pass<'_, K>,
        raw: String,
        kind: &FieldKind,
    ) -> DocNode {
        let normalized = match kind {
            FieldKind::Datetime => normalize_datetime(&raw),
            _ => normalize_date(&raw),
        };
        match normalized {
            Some(value) => DocNode::String(value),
            None => {
                warn!("Dropping unparseable {} '{}' at '{}'", kind, raw, pass.key);
                pass.warnings.push(FieldWarning {
                    path: pass.key.to_string(),
                    kind: WarningKind::DateValidation,
                    message: format!("'{}' is not a valid {}", raw, kind),
                });
                DocNode::Null
            }
        }
    }

    fn text<K: KeyGenerator + ?Sized>(
        &self,
        pass: &mut Pass<'_, K>,
        raw: String,
        kind: Option<&FieldKind>,
    ) -> DocNode {
        let cleaned = self.clean(pass, raw);
        match kind {
            Some(kind) if kind.holds_rich_text() => {
                DocNode::Array(text_to_blocks(&cleaned, pass.keys))
            }
            _ => DocNode::String(cleaned),
        }
    }

    fn clean<K: KeyGenerator + ?Sized>(&self, pass: &mut Pass<'_, K>, raw: String) -> String {
        match clean_text(&raw, self.reformat_markdown) {
            Ok(cleaned) => cleaned,
            Err(e) => {
                warn!("Text cleanup failed at '{}': {}", pass.key, e);
                pass.warnings.push(FieldWarning {
                    path: pass.key.to_string(),
                    kind: WarningKind::Normalization,
                    message: e.to_string(),
                });
                raw
            }
        }
    }
}
