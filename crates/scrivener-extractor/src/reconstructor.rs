//! Content reconstruction
//!
//! Rebuilds a nested document from a flat value map, guided by the catalog.
//! The map is drained as entries are matched; whatever is left over is
//! reported back as unmatched.

use crate::blocks::text_to_blocks;
use scrivener_domain::{
    DocNode, FieldCatalog, FieldKind, FieldPath, Fields, KeyGenerator, SchemaField, ValueMap,
    KEY_KEY,
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Output of a reconstruction
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    /// Top-level document properties
    pub fields: Fields,

    /// Value-map keys no catalog field claimed, in emission order
    pub unmatched_keys: Vec<String>,
}

/// Builds documents from value maps
pub struct Reconstructor<'a, K: ?Sized> {
    catalog: &'a FieldCatalog,
    keys: &'a K,
}

/// An array item being assembled from nested-field values
#[derive(Default)]
struct ItemDraft {
    tag: Option<String>,
    fields: Fields,
}

impl<'a, K: KeyGenerator + ?Sized> Reconstructor<'a, K> {
    /// Create a reconstructor for a catalog
    pub fn new(catalog: &'a FieldCatalog, keys: &'a K) -> Self {
        Self { catalog, keys }
    }

    /// Reconstruct a document, consuming the value map
    pub fn reconstruct(&self, mut values: ValueMap) -> Reconstruction {
        let mut fields = Fields::new();

        for field in self.catalog.top_level() {
            let names = path_names(&field.path);
            let value = match field.kind {
                FieldKind::Array => self.array(field, &mut values),
                _ => values
                    .remove(&field.path.to_string())
                    .map(|v| convert(&field.kind, v, self.keys)),
            };
            match value {
                Some(DocNode::Null) | None => {}
                Some(value) => place(&mut fields, &names, value),
            }
        }

        // Objects of a named type carry that type as their discriminator
        for field in self.catalog.top_level() {
            if let FieldKind::Custom(tag) = &field.kind {
                retag(&mut fields, &path_names(&field.path), tag);
            }
        }

        let unmatched_keys: Vec<String> = values.keys().map(str::to_string).collect();
        for key in &unmatched_keys {
            warn!("No catalog field matched generated key '{}'", key);
        }
        Reconstruction {
            fields,
            unmatched_keys,
        }
    }

    fn array(&self, field: &SchemaField, values: &mut ValueMap) -> Option<DocNode> {
        let bare = field.path.to_string();

        if matches!(values.get(&bare), Some(DocNode::Array(_))) {
            let items = match values.remove(&bare) {
                Some(DocNode::Array(items)) => items,
                _ => return None,
            };
            return Some(DocNode::Array(
                items.into_iter().map(|item| self.finish_item(item)).collect(),
            ));
        }

        let nested = self.catalog.nested_fields(&field.path);
        if nested.is_empty() {
            return match values.remove(&bare) {
                None | Some(DocNode::Null) => None,
                Some(single) => Some(DocNode::Array(vec![self.finish_item(single)])),
            };
        }

        let items = self.assemble_items(&nested, values);
        if items.is_empty() {
            return None;
        }
        debug!("Assembled {} items for '{}'", items.len(), bare);
        Some(DocNode::Array(items))
    }

    /// Pull every nested-field value out of the map and group them into items
    ///
    /// Explicit indices fix an item's slot. Unindexed values of the same
    /// module fill that module's slots in emission order, so the k-th
    /// unindexed value of each field lands in the module's k-th item.
    fn assemble_items(&self, nested: &[&SchemaField], values: &mut ValueMap) -> Vec<DocNode> {
        let mut indexed: Vec<(usize, usize, DocNode)> = Vec::new();
        let mut unindexed: Vec<(usize, DocNode)> = Vec::new();
        for (n, field) in nested.iter().enumerate() {
            while let Some((value, index)) = values.take_instance(&field.path) {
                match index {
                    Some(slot) => indexed.push((n, slot, value)),
                    None => unindexed.push((n, value)),
                }
            }
        }

        let mut drafts: BTreeMap<usize, ItemDraft> = BTreeMap::new();
        let mut module_slots: HashMap<Option<String>, Vec<usize>> = HashMap::new();

        for (n, slot, value) in indexed {
            let field = nested[n];
            let module_list = module_slots.entry(field.module_type.clone()).or_default();
            if !module_list.contains(&slot) {
                module_list.push(slot);
            }
            self.fill(drafts.entry(slot).or_default(), field, value);
        }
        for list in module_slots.values_mut() {
            list.sort_unstable();
        }

        let mut seen: HashMap<usize, usize> = HashMap::new();
        for (n, value) in unindexed {
            let field = nested[n];
            let k = seen.entry(n).or_insert(0);
            let module_list = module_slots.entry(field.module_type.clone()).or_default();
            let slot = match module_list.get(*k) {
                Some(&slot) => slot,
                None => {
                    let slot = (0..).find(|s| !drafts.contains_key(s)).unwrap_or(drafts.len());
                    module_list.push(slot);
                    slot
                }
            };
            *k += 1;
            self.fill(drafts.entry(slot).or_default(), field, value);
        }

        drafts
            .into_values()
            .map(|draft| {
                let node = match draft.tag {
                    Some(tag) => DocNode::tagged(tag, draft.fields),
                    None => DocNode::Object(draft.fields),
                };
                self.finish_item(node)
            })
            .collect()
    }

    fn fill(&self, draft: &mut ItemDraft, field: &SchemaField, value: DocNode) {
        if draft.tag.is_none() {
            draft.tag = field.module_type.clone();
        }
        let value = convert(&field.kind, value, self.keys);
        if value.is_null() {
            return;
        }
        place(&mut draft.fields, &field.item_relative_path(), value);
    }

    fn finish_item(&self, item: DocNode) -> DocNode {
        let mut item = repair_wrapped_item(item);
        item.ensure_key(|| self.keys.next_key());
        item
    }
}

/// Apply the kind-specific conversion to a value
fn convert<K: KeyGenerator + ?Sized>(kind: &FieldKind, value: DocNode, keys: &K) -> DocNode {
    match (kind, value) {
        (FieldKind::Slug, DocNode::String(text)) => slug_node(&text),
        (FieldKind::BlockContent, DocNode::String(text)) => {
            DocNode::Array(text_to_blocks(&text, keys))
        }
        (_, value) => value,
    }
}

fn slug_node(text: &str) -> DocNode {
    let mut fields = Fields::new();
    fields.insert("current".to_string(), DocNode::String(slugify(text)));
    DocNode::tagged("slug", fields)
}

/// Lower-case, punctuation and whitespace collapsed to single hyphens
///
/// # Examples
///
/// ```
/// use scrivener_extractor::slugify;
///
/// assert_eq!(slugify("Hello, World!  2024"), "hello-world-2024");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Unwrap `{"heroModule": {...}}` into a `heroModule`-tagged item
///
/// Applies only to untagged items whose single non-key property holds a
/// plain object, or an object tagged with the property's own name.
fn repair_wrapped_item(item: DocNode) -> DocNode {
    let DocNode::Object(mut outer) = item else {
        return item;
    };
    let single = {
        let mut names = outer.keys().filter(|k| k.as_str() != KEY_KEY);
        match (names.next(), names.next()) {
            (Some(name), None) => Some(name.clone()),
            _ => None,
        }
    };
    let Some(name) = single else {
        return DocNode::Object(outer);
    };

    let unwrappable = match outer.get(&name) {
        Some(DocNode::Object(_)) => true,
        Some(DocNode::Tagged { tag, .. }) => *tag == name,
        _ => false,
    };
    if !unwrappable {
        return DocNode::Object(outer);
    }

    let outer_key = match outer.remove(KEY_KEY) {
        Some(DocNode::String(key)) if !key.is_empty() => Some(key),
        _ => None,
    };
    let (inner_key, mut fields) = match outer.remove(&name) {
        Some(DocNode::Tagged { key, fields, .. }) => (key, fields),
        Some(DocNode::Object(fields)) => (None, fields),
        _ => (None, Fields::new()),
    };
    let plain_key = match fields.remove(KEY_KEY) {
        Some(DocNode::String(key)) if !key.is_empty() => Some(key),
        _ => None,
    };
    debug!("Unwrapped array item wrapped in '{}'", name);
    DocNode::Tagged {
        tag: name,
        key: outer_key.or(inner_key).or(plain_key),
        fields,
    }
}

/// Set `value` at a nested property path, creating objects along the way
fn place(fields: &mut Fields, names: &[String], value: DocNode) {
    let Some((last, parents)) = names.split_last() else {
        return;
    };
    let mut current = fields;
    for name in parents {
        let entry = current
            .entry(name.clone())
            .or_insert_with(|| DocNode::Object(Fields::new()));
        if !matches!(entry, DocNode::Object(_) | DocNode::Tagged { .. }) {
            debug!("Replacing non-object at '{}' to hold nested values", name);
            *entry = DocNode::Object(Fields::new());
        }
        current = match entry {
            DocNode::Object(inner) | DocNode::Tagged { fields: inner, .. } => inner,
            _ => return,
        };
    }
    match (current.get_mut(last), value) {
        (Some(DocNode::Object(existing)), DocNode::Object(incoming)) => {
            for (k, v) in incoming {
                existing.entry(k).or_insert(v);
            }
        }
        (_, value) => {
            current.insert(last.clone(), value);
        }
    }
}

/// Turn the plain object at `names` into a `tag`-tagged one
fn retag(fields: &mut Fields, names: &[String], tag: &str) {
    let Some((last, parents)) = names.split_last() else {
        return;
    };
    let mut current = fields;
    for name in parents {
        current = match current.get_mut(name) {
            Some(DocNode::Object(inner)) | Some(DocNode::Tagged { fields: inner, .. }) => inner,
            _ => return,
        };
    }
    let Some(node) = current.get_mut(last) else {
        return;
    };
    if let DocNode::Object(inner) = node {
        let mut inner = std::mem::take(inner);
        let key = match inner.remove(KEY_KEY) {
            Some(DocNode::String(key)) => Some(key),
            _ => None,
        };
        *node = DocNode::Tagged {
            tag: tag.to_string(),
            key,
            fields: inner,
        };
    }
}

fn path_names(path: &FieldPath) -> Vec<String> {
    path.segments().iter().map(|s| s.name().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use scrivener_domain::SequentialKeys;
    use serde_json::{json, Value};

    fn map_of(value: Value) -> ValueMap {
        match value {
            Value::Object(map) => ValueMap::from(map),
            _ => panic!("expected object"),
        }
    }

    fn page_catalog() -> FieldCatalog {
        let mut catalog = FieldCatalog::new("page");
        for (path, kind) in [
            ("title", FieldKind::String),
            ("slug", FieldKind::Slug),
            ("body", FieldKind::BlockContent),
            ("seo", FieldKind::Object),
            ("modules", FieldKind::Array),
            ("tags", FieldKind::Array),
        ] {
            catalog
                .insert(SchemaField::new(FieldPath::parse(path).unwrap(), kind, path))
                .unwrap();
        }
        catalog
            .insert(
                SchemaField::new(FieldPath::parse("seo.metaTitle").unwrap(), FieldKind::String, "Meta")
                    .with_parent(FieldPath::root("seo")),
            )
            .unwrap();
        for (path, module) in [
            ("modules[].quoteModule.quote", "quoteModule"),
            ("modules[].quoteModule.author", "quoteModule"),
            ("modules[].heroModule.headline", "heroModule"),
        ] {
            catalog
                .insert(
                    SchemaField::new(FieldPath::parse(path).unwrap(), FieldKind::String, path)
                        .with_parent(FieldPath::root("modules"))
                        .in_array_item(Some(module.to_string())),
                )
                .unwrap();
        }
        catalog
    }

    fn rebuild(catalog: &FieldCatalog, values: Value) -> (Value, Vec<String>) {
        let keys = SequentialKeys::default();
        let out = Reconstructor::new(catalog, &keys).reconstruct(map_of(values));
        (DocNode::Object(out.fields).into_value(), out.unmatched_keys)
    }

    #[test]
    fn test_unindexed_module_fields_form_one_item() {
        let (doc, unmatched) = rebuild(
            &page_catalog(),
            json!({
                "modules[].quoteModule.quote": "Be bold",
                "modules[].quoteModule.author": "Ada"
            }),
        );
        assert!(unmatched.is_empty());
        assert_eq!(
            doc["modules"],
            json!([{"_type": "quoteModule", "_key": "k0", "quote": "Be bold", "author": "Ada"}])
        );
    }

    #[test]
    fn test_explicit_indices_order_items() {
        let (doc, _) = rebuild(
            &page_catalog(),
            json!({
                "modules[1].quoteModule.quote": "Second",
                "modules[0].heroModule.headline": "First",
                "modules[1].quoteModule.author": "Grace"
            }),
        );
        let modules = doc["modules"].as_array().unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0]["_type"], "heroModule");
        assert_eq!(modules[1]["_type"], "quoteModule");
        assert_eq!(modules[1]["author"], "Grace");
    }

    #[test]
    fn test_modules_get_separate_default_slots() {
        let (doc, _) = rebuild(
            &page_catalog(),
            json!({
                "modules[].heroModule.headline": "Welcome",
                "modules[].quoteModule.quote": "Q1",
                "modules[].quoteModule.author": "A1"
            }),
        );
        let modules = doc["modules"].as_array().unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0]["_type"], "quoteModule");
        assert_eq!(modules[0]["author"], "A1");
        assert_eq!(modules[1]["_type"], "heroModule");
    }

    #[test]
    fn test_unindexed_values_join_indexed_module_items() {
        let (doc, _) = rebuild(
            &page_catalog(),
            json!({
                "modules[0].quoteModule.quote": "Q",
                "modules[].quoteModule.author": "A"
            }),
        );
        assert_eq!(doc["modules"].as_array().unwrap().len(), 1);
        assert_eq!(doc["modules"][0]["author"], "A");
    }

    #[test]
    fn test_bare_array_used_verbatim_with_keys() {
        let (doc, _) = rebuild(
            &page_catalog(),
            json!({
                "modules": [
                    {"_type": "quoteModule", "_key": "keep", "quote": "x"},
                    {"_type": "heroModule", "headline": "y"}
                ],
                "modules[].quoteModule.quote": "ignored"
            }),
        );
        let modules = doc["modules"].as_array().unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0]["_key"], "keep");
        assert_eq!(modules[1]["_key"], "k0");
    }

    #[test]
    fn test_auto_repair_wrapped_module() {
        let (doc, _) = rebuild(
            &page_catalog(),
            json!({"modules": [{"_key": "w", "heroModule": {"headline": "X"}}]}),
        );
        assert_eq!(
            doc["modules"],
            json!([{"_type": "heroModule", "_key": "w", "headline": "X"}])
        );
    }

    #[test]
    fn test_auto_repair_misfires_on_single_object_property() {
        // A legitimately untagged item whose only property is an object is
        // indistinguishable from a wrapped module and gets rewritten too.
        let (doc, _) = rebuild(
            &page_catalog(),
            json!({"tags": [{"meta": {"color": "red"}}]}),
        );
        assert_eq!(doc["tags"][0]["_type"], "meta");
        assert_eq!(doc["tags"][0]["color"], "red");
    }

    #[test]
    fn test_tagged_items_never_rewritten() {
        let (doc, _) = rebuild(
            &page_catalog(),
            json!({"modules": [{"_type": "wrapper", "heroModule": {"headline": "X"}}]}),
        );
        assert_eq!(doc["modules"][0]["_type"], "wrapper");
        assert_eq!(doc["modules"][0]["heroModule"]["headline"], "X");
    }

    #[test]
    fn test_single_bare_value_becomes_sole_item() {
        let (doc, _) = rebuild(&page_catalog(), json!({"tags": "rust"}));
        assert_eq!(doc["tags"], json!(["rust"]));
    }

    #[test]
    fn test_slug_and_block_conversion() {
        let (doc, _) = rebuild(
            &page_catalog(),
            json!({"slug": "Hello, World!  2024", "body": "One.\n\nTwo."}),
        );
        assert_eq!(doc["slug"], json!({"_type": "slug", "current": "hello-world-2024"}));
        assert_eq!(doc["body"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_nested_object_fields_placed() {
        let (doc, _) = rebuild(&page_catalog(), json!({"seo.metaTitle": "Meta"}));
        assert_eq!(doc["seo"], json!({"metaTitle": "Meta"}));
    }

    #[test]
    fn test_named_object_type_becomes_tagged() {
        let mut catalog = FieldCatalog::new("page");
        for (path, kind) in [
            ("seo", FieldKind::Custom("seoSettings".to_string())),
            ("seo.metaTitle", FieldKind::String),
            ("seo.image", FieldKind::Custom("imageMeta".to_string())),
            ("seo.image.alt", FieldKind::String),
        ] {
            let path = FieldPath::parse(path).unwrap();
            let parents = &path.segments()[..path.len() - 1];
            let parent = (!parents.is_empty()).then(|| FieldPath::from_segments(parents.to_vec()));
            let field = SchemaField::new(path.clone(), kind, "f");
            let field = match parent {
                Some(parent) => field.with_parent(parent),
                None => field,
            };
            catalog.insert(field).unwrap();
        }

        let (doc, _) = rebuild(&catalog, json!({"seo.metaTitle": "M", "seo.image.alt": "A"}));
        assert_eq!(
            doc["seo"],
            json!({"_type": "seoSettings", "metaTitle": "M", "image": {"_type": "imageMeta", "alt": "A"}})
        );

        let (doc, _) = rebuild(&catalog, json!({"seo": {"_type": "other", "metaTitle": "M"}}));
        assert_eq!(doc["seo"]["_type"], "other");
    }

    #[test]
    fn test_nulls_dropped_and_unmatched_reported() {
        let (doc, unmatched) = rebuild(
            &page_catalog(),
            json!({"title": null, "mystery": 1, "modules[0].ghost.x": "y"}),
        );
        assert!(doc.get("title").is_none());
        assert_eq!(unmatched, vec!["mystery".to_string(), "modules[0].ghost.x".to_string()]);
    }

    #[test]
    fn test_round_trip_is_stable() {
        let catalog = page_catalog();
        let keys = SequentialKeys::default();
        let first = Reconstructor::new(&catalog, &keys).reconstruct(map_of(json!({
            "title": "T",
            "slug": "My Page",
            "body": "Para.",
            "seo.metaTitle": "M",
            "modules[].quoteModule.quote": "Q",
            "modules[1].heroModule.headline": "H",
            "tags": ["a", "b"]
        })));
        assert!(first.unmatched_keys.is_empty());

        let replay: ValueMap = first.fields.clone().into_iter().collect();
        let second = Reconstructor::new(&catalog, &keys).reconstruct(replay);
        assert!(second.unmatched_keys.is_empty());
        assert_eq!(first.fields, second.fields);
    }

    proptest! {
        #[test]
        fn slugify_is_clean_and_idempotent(text in "\\PC{0,40}") {
            let slug = slugify(&text);
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
            prop_assert_eq!(slugify(&slug), slug.clone());
        }
    }
}
