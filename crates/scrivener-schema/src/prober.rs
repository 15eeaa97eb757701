//! Sample-based field prober
//!
//! Infers a catalog by structurally walking example documents when no
//! declarative schema is available.

use crate::merger::merge_catalogs;
use crate::options::DEFAULT_MAX_DEPTH;
use crate::title::{breadcrumb, humanize};
use scrivener_domain::{
    is_reserved, DocNode, FieldCatalog, FieldKind, FieldPath, Fields, SchemaField, BLOCK_TYPE,
};
use serde_json::Value;
use tracing::debug;

/// Discriminators of rich-text internals; array groups with these are skipped
const INTERNAL_GROUPS: &[&str] = &["span", "markDef", "link"];

/// Children of a `block` group that describe spans and marks, not content
const BLOCK_INTERNAL_CHILDREN: &[&str] = &["children", "markDefs", "style", "listItem", "level"];

/// Infers field catalogs from sample documents
///
/// Values nested deeper than `max_depth` levels are not catalogued.
#[derive(Debug, Clone, Copy)]
pub struct SampleProber {
    max_depth: usize,
}

impl Default for SampleProber {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleProber {
    /// Create a prober with the default depth ceiling
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Create a prober that stops descending after `max_depth` levels
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Probe every sample and merge the results, first-seen-wins
    pub fn probe(&self, document_type: &str, samples: &[Value]) -> FieldCatalog {
        let catalogs = samples
            .iter()
            .map(|sample| self.probe_document(document_type, &DocNode::from(sample.clone())));
        let catalog = merge_catalogs(document_type, catalogs);
        debug!(
            "Probed {} samples of '{}' into {} fields",
            samples.len(),
            document_type,
            catalog.len()
        );
        catalog
    }

    /// Probe a single document
    pub fn probe_document(&self, document_type: &str, document: &DocNode) -> FieldCatalog {
        let mut catalog = FieldCatalog::new(document_type);
        if let Some(fields) = document.fields() {
            for (key, value) in fields.iter().filter(|(k, _)| !is_reserved(k)) {
                self.visit(&mut catalog, FieldPath::root(key), &[], None, value, 0);
            }
        }
        catalog
    }

    fn visit(
        &self,
        catalog: &mut FieldCatalog,
        path: FieldPath,
        ancestors: &[String],
        parent: Option<&FieldPath>,
        value: &DocNode,
        depth: usize,
    ) {
        if depth >= self.max_depth {
            debug!("Depth limit {} reached at '{}', truncating", self.max_depth, path);
            return;
        }
        let title = breadcrumb(ancestors, &humanize(path.leaf()));

        match value {
            // Nothing to learn from an empty value; a later sample may fill it in.
            DocNode::Null => {}
            DocNode::Bool(_) | DocNode::Number(_) | DocNode::String(_) => {
                add(catalog, field(path, classify(value), title, parent));
            }
            DocNode::Tagged { tag, fields, .. } => {
                let kind = FieldKind::parse(tag);
                let opaque = matches!(
                    kind,
                    FieldKind::BlockContent | FieldKind::Slug | FieldKind::Image | FieldKind::Reference
                );
                if !add(catalog, field(path.clone(), kind, title, parent)) || opaque {
                    return;
                }
                self.visit_children(catalog, &path, ancestors, fields, depth);
            }
            DocNode::Object(fields) => {
                if add(catalog, field(path.clone(), FieldKind::Object, title, parent)) {
                    self.visit_children(catalog, &path, ancestors, fields, depth);
                }
            }
            DocNode::Array(items) => {
                self.visit_array(catalog, path, ancestors, parent, items, depth)
            }
        }
    }

    fn visit_children(
        &self,
        catalog: &mut FieldCatalog,
        path: &FieldPath,
        ancestors: &[String],
        fields: &Fields,
        depth: usize,
    ) {
        let mut trail = ancestors.to_vec();
        trail.push(humanize(path.leaf()));
        for (key, child) in fields.iter().filter(|(k, _)| !is_reserved(k)) {
            self.visit(catalog, path.child(key), &trail, Some(path), child, depth + 1);
        }
    }

    fn visit_array(
        &self,
        catalog: &mut FieldCatalog,
        path: FieldPath,
        ancestors: &[String],
        parent: Option<&FieldPath>,
        items: &[DocNode],
        depth: usize,
    ) {
        let title = breadcrumb(ancestors, &humanize(path.leaf()));
        if !items.is_empty() && items.iter().all(|item| item.has_tag(BLOCK_TYPE)) {
            add(catalog, field(path, FieldKind::BlockContent, title, parent));
            return;
        }
        if !add(catalog, field(path.clone(), FieldKind::Array, title, parent)) {
            return;
        }
        if depth + 1 >= self.max_depth {
            debug!("Depth limit {} reached at '{}[]', truncating", self.max_depth, path);
            return;
        }

        let mut trail = ancestors.to_vec();
        trail.push(humanize(path.leaf()));

        for group in group_items(items) {
            let mut group_trail = trail.clone();
            let item_base = match &group.module {
                Some(module) => {
                    group_trail.push(humanize(module));
                    path.clone().into_array().child(module.as_str())
                }
                None => path.clone().into_array(),
            };
            for (child, sample) in group.children {
                let child_field = SchemaField::new(
                    item_base.child(child.as_str()),
                    classify(sample),
                    breadcrumb(&group_trail, &humanize(&child)),
                )
                .with_parent(path.clone())
                .in_array_item(group.module.clone());
                add(catalog, child_field);
            }
        }
    }
}

/// Items of one array sharing a discriminator (or sharing the lack of one)
struct ItemGroup<'a> {
    module: Option<String>,
    children: Vec<(String, &'a DocNode)>,
}

/// Group object items by discriminator and union their child keys
///
/// Groups and children keep first-seen order; a child's sample value is the
/// first non-null value seen for it.
fn group_items(items: &[DocNode]) -> Vec<ItemGroup<'_>> {
    let mut groups: Vec<ItemGroup<'_>> = Vec::new();

    for item in items {
        let (module, fields) = match item {
            DocNode::Tagged { tag, fields, .. } => (Some(tag.as_str()), fields),
            DocNode::Object(fields) => (None, fields),
            _ => continue,
        };
        if module.is_some_and(|m| INTERNAL_GROUPS.contains(&m)) {
            continue;
        }
        let is_block = module == Some(BLOCK_TYPE);

        let pos = match groups.iter().position(|g| g.module.as_deref() == module) {
            Some(pos) => pos,
            None => {
                groups.push(ItemGroup {
                    module: module.map(str::to_string),
                    children: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[pos];

        for (key, value) in fields {
            if is_reserved(key) || (is_block && BLOCK_INTERNAL_CHILDREN.contains(&key.as_str())) {
                continue;
            }
            match group.children.iter_mut().find(|(k, _)| k == key) {
                Some(slot) if slot.1.is_null() => slot.1 = value,
                Some(_) => {}
                None => group.children.push((key.clone(), value)),
            }
        }
    }

    groups
}

/// Kind of a value without descending into it
fn classify(value: &DocNode) -> FieldKind {
    match value {
        DocNode::Null | DocNode::String(_) => FieldKind::String,
        DocNode::Bool(_) => FieldKind::Boolean,
        DocNode::Number(_) => FieldKind::Number,
        DocNode::Tagged { tag, .. } => FieldKind::parse(tag),
        DocNode::Object(_) => FieldKind::Object,
        DocNode::Array(items) => {
            if !items.is_empty() && items.iter().all(|i| i.has_tag(BLOCK_TYPE)) {
                FieldKind::BlockContent
            } else {
                FieldKind::Array
            }
        }
    }
}

fn field(path: FieldPath, kind: FieldKind, title: String, parent: Option<&FieldPath>) -> SchemaField {
    let field = SchemaField::new(path, kind, title);
    match parent {
        Some(parent) => field.with_parent(parent.clone()),
        None => field,
    }
}

/// Insert a field; returns whether it was newly added
fn add(catalog: &mut FieldCatalog, field: SchemaField) -> bool {
    match catalog.insert(field) {
        Ok(added) => added,
        Err(e) => {
            debug!("Skipping probed field: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn probe(sample: Value) -> FieldCatalog {
        SampleProber::new().probe("page", &[sample])
    }

    #[test]
    fn test_scalars_and_reserved_keys() {
        let catalog = probe(json!({
            "_id": "abc",
            "_type": "page",
            "title": "Hello",
            "views": 3,
            "featured": true,
            "subtitle": null
        }));
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("title").unwrap().kind, FieldKind::String);
        assert_eq!(catalog.get("views").unwrap().kind, FieldKind::Number);
        assert_eq!(catalog.get("featured").unwrap().kind, FieldKind::Boolean);
        assert!(catalog.get("_id").is_none());
    }

    #[test]
    fn test_block_array_collapses_to_block_content() {
        let catalog = probe(json!({
            "body": [
                {"_type": "block", "_key": "a", "style": "normal", "children": [{"_type": "span", "text": "x"}]},
                {"_type": "block", "_key": "b", "style": "h2", "children": []}
            ]
        }));
        assert_eq!(catalog.len(), 1);
        let body = catalog.get("body").unwrap();
        assert_eq!(body.kind, FieldKind::BlockContent);
        assert!(catalog.nested_fields(&FieldPath::root("body")).is_empty());
    }

    #[test]
    fn test_tagged_objects() {
        let catalog = probe(json!({
            "slug": {"_type": "slug", "current": "hello"},
            "cover": {"_type": "image", "asset": {"_ref": "image-1"}},
            "author": {"_type": "reference", "_ref": "person-1"},
            "seo": {"_type": "seoSettings", "metaTitle": "Hi"}
        }));
        assert_eq!(catalog.get("slug").unwrap().kind, FieldKind::Slug);
        assert_eq!(catalog.get("cover").unwrap().kind, FieldKind::Image);
        assert_eq!(catalog.get("author").unwrap().kind, FieldKind::Reference);
        assert!(catalog.get("slug.current").is_none());
        assert!(catalog.get("cover.asset").is_none());

        let seo = catalog.get("seo").unwrap();
        assert_eq!(seo.kind, FieldKind::Custom("seoSettings".to_string()));
        let meta = catalog.get("seo.metaTitle").unwrap();
        assert_eq!(meta.parent_path, Some(FieldPath::root("seo")));
        assert_eq!(meta.title, "Seo → Meta Title");
    }

    #[test]
    fn test_plain_object_recurses() {
        let catalog = probe(json!({"meta": {"readingTime": 4, "tags": {"primary": "rust"}}}));
        assert_eq!(catalog.get("meta").unwrap().kind, FieldKind::Object);
        assert_eq!(catalog.get("meta.readingTime").unwrap().kind, FieldKind::Number);
        assert_eq!(catalog.get("meta.tags.primary").unwrap().kind, FieldKind::String);
        assert_eq!(
            catalog.get("meta.tags.primary").unwrap().parent_path,
            Some(FieldPath::parse("meta.tags").unwrap())
        );
    }

    #[test]
    fn test_polymorphic_array_groups_by_module() {
        let catalog = probe(json!({
            "modules": [
                {"_type": "quoteModule", "_key": "a", "quote": "Be bold"},
                {"_type": "heroModule", "_key": "b", "headline": "Hi", "image": {"_type": "image"}},
                {"_type": "quoteModule", "_key": "c", "author": "Ada"},
                {"_type": "span", "text": "ignored"},
                "stray string"
            ]
        }));

        assert_eq!(catalog.get("modules").unwrap().kind, FieldKind::Array);
        let nested = catalog.nested_fields(&FieldPath::root("modules"));
        let paths: Vec<String> = nested.iter().map(|f| f.path.to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "modules[].quoteModule.quote",
                "modules[].quoteModule.author",
                "modules[].heroModule.headline",
                "modules[].heroModule.image",
            ]
        );
        let author = catalog.get("modules[].quoteModule.author").unwrap();
        assert!(author.is_array_item);
        assert!(author.is_virtual);
        assert_eq!(author.module_type.as_deref(), Some("quoteModule"));
        assert_eq!(author.title, "Modules → Quote Module → Author");
        assert_eq!(
            catalog.get("modules[].heroModule.image").unwrap().kind,
            FieldKind::Image
        );
    }

    #[test]
    fn test_untagged_items_use_default_bucket() {
        let catalog = probe(json!({
            "links": [{"label": "Docs", "url": "https://x"}, {"label": "Blog", "_key": "k"}]
        }));
        let label = catalog.get("links[].label").unwrap();
        assert_eq!(label.module_type, None);
        assert!(catalog.get("links[].url").is_some());
        assert!(catalog.get("links[]._key").is_none());
    }

    #[test]
    fn test_mixed_block_array_ignores_block_internals() {
        let catalog = probe(json!({
            "content": [
                {"_type": "block", "style": "normal", "children": [], "markDefs": []},
                {"_type": "callout", "tone": "info"}
            ]
        }));
        assert_eq!(catalog.get("content").unwrap().kind, FieldKind::Array);
        let paths: Vec<String> = catalog
            .nested_fields(&FieldPath::root("content"))
            .iter()
            .map(|f| f.path.to_string())
            .collect();
        assert_eq!(paths, vec!["content[].callout.tone"]);
    }

    #[test]
    fn test_samples_merge_first_seen_wins() {
        let catalog = SampleProber::new().probe(
            "post",
            &[json!({"a": "text"}), json!({"a": 5, "b": true})],
        );
        assert_eq!(catalog.get("a").unwrap().kind, FieldKind::String);
        assert_eq!(catalog.get("b").unwrap().kind, FieldKind::Boolean);
    }

    #[test]
    fn test_deep_nesting_truncated_at_max_depth() {
        let sample = json!({"a": {"b": {"c": {"d": "deep"}}}, "list": [{"x": 1}]});
        let catalog = SampleProber::with_max_depth(2).probe("page", &[sample.clone()]);
        assert!(catalog.contains("a.b"));
        assert!(!catalog.contains("a.b.c"));
        assert!(catalog.contains("list[].x"));

        let shallow = SampleProber::with_max_depth(1).probe("page", &[sample.clone()]);
        assert!(shallow.contains("a"));
        assert!(!shallow.contains("a.b"));
        assert!(shallow.contains("list"));
        assert!(!shallow.contains("list[].x"));

        let full = SampleProber::new().probe("page", &[sample]);
        assert!(full.contains("a.b.c.d"));
    }

    #[test]
    fn test_empty_array_has_no_children() {
        let catalog = probe(json!({"tags": []}));
        assert_eq!(catalog.get("tags").unwrap().kind, FieldKind::Array);
        assert_eq!(catalog.len(), 1);
    }
}
