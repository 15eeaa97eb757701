//! Declarative schema extractor
//!
//! Walks a type-definition tree with bounded recursive descent. There is no
//! cycle detection: self-referential type graphs are simply cut off at the
//! configured depth.

use crate::definition::{SchemaRegistry, TypeDefinition};
use crate::title::{breadcrumb, humanize};
use scrivener_domain::{FieldCatalog, FieldKind, FieldPath, SchemaField, BLOCK_TYPE};
use tracing::debug;

/// Resolved structure of a definition
enum Shape<'a> {
    /// Scalar or opaque value; descent stops here
    Leaf(FieldKind),
    /// Object whose fields are walked under the same path
    Object {
        kind: FieldKind,
        fields: &'a [TypeDefinition],
    },
    /// Array whose member types are walked under `path[]`
    Array { members: &'a [TypeDefinition] },
}

impl Shape<'_> {
    fn kind(&self) -> FieldKind {
        match self {
            Shape::Leaf(kind) => kind.clone(),
            Shape::Object { kind, .. } => kind.clone(),
            Shape::Array { .. } => FieldKind::Array,
        }
    }
}

/// Where a definition is being visited from
#[derive(Clone, Default)]
struct Scope {
    /// Path prefix for fields at this level
    base: Option<FieldPath>,
    /// Parent path assigned to fields at this level
    parent: Option<FieldPath>,
    /// `Some(module)` while inside array items
    item: Option<Option<String>>,
    /// Ancestor titles
    trail: Vec<String>,
}

/// Extracts field catalogs from declarative type definitions
pub struct DeclarativeExtractor<'a> {
    registry: &'a SchemaRegistry,
    max_depth: usize,
}

impl<'a> DeclarativeExtractor<'a> {
    /// Create an extractor over a registry with the given depth ceiling
    pub fn new(registry: &'a SchemaRegistry, max_depth: usize) -> Self {
        Self {
            registry,
            max_depth,
        }
    }

    /// Extract the catalog of a document type, or `None` if it is not defined
    pub fn extract(&self, document_type: &str) -> Option<FieldCatalog> {
        let definition = self.registry.get(document_type)?;
        let mut catalog = FieldCatalog::new(document_type);
        let scope = Scope::default();
        for field in &definition.fields {
            self.visit(&mut catalog, field, &scope, 0);
        }
        debug!(
            "Extracted {} fields from definition of '{}'",
            catalog.len(),
            document_type
        );
        Some(catalog)
    }

    fn visit(&self, catalog: &mut FieldCatalog, def: &TypeDefinition, scope: &Scope, depth: usize) {
        let Some(name) = def.name.as_deref() else {
            debug!("Skipping unnamed field of type '{}'", def.type_name);
            return;
        };
        if depth >= self.max_depth {
            debug!(
                "Depth limit {} reached at '{}', truncating",
                self.max_depth, name
            );
            return;
        }

        let path = match &scope.base {
            Some(base) => base.child(name),
            None => FieldPath::root(name),
        };
        let label = def.title.clone().unwrap_or_else(|| humanize(name));
        let shape = shape_of(self.registry, def);

        let mut field = SchemaField::new(path.clone(), shape.kind(), breadcrumb(&scope.trail, &label));
        if let Some(parent) = &scope.parent {
            field = field.with_parent(parent.clone());
        }
        if let Some(module) = &scope.item {
            field = field.in_array_item(module.clone());
        }
        match catalog.insert(field) {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                debug!("Skipping field: {}", e);
                return;
            }
        }

        let mut trail = scope.trail.clone();
        trail.push(label);

        match shape {
            Shape::Leaf(_) => {}
            Shape::Object { fields, .. } => {
                let child_scope = Scope {
                    base: Some(path.clone()),
                    // Inside array items everything hangs off the array itself.
                    parent: match scope.item {
                        Some(_) => scope.parent.clone(),
                        None => Some(path),
                    },
                    item: scope.item.clone(),
                    trail,
                };
                for child in fields {
                    self.visit(catalog, child, &child_scope, depth + 1);
                }
            }
            Shape::Array { members } => {
                for member in members {
                    self.visit_member(catalog, member, &path, &trail, depth + 1);
                }
            }
        }
    }

    fn visit_member(
        &self,
        catalog: &mut FieldCatalog,
        member: &TypeDefinition,
        array_path: &FieldPath,
        trail: &[String],
        depth: usize,
    ) {
        if member.type_name == BLOCK_TYPE {
            return;
        }
        let fields = match shape_of(self.registry, member) {
            Shape::Object { fields, .. } => fields,
            // Arrays of scalars or references have no per-item fields.
            Shape::Leaf(_) | Shape::Array { .. } => return,
        };

        let module = member_name(member).filter(|name| name != "object");
        let mut member_trail = trail.to_vec();
        let base = match &module {
            Some(module) => {
                member_trail.push(member.title.clone().unwrap_or_else(|| humanize(module)));
                array_path.clone().into_array().child(module.as_str())
            }
            None => array_path.clone().into_array(),
        };
        let scope = Scope {
            base: Some(base),
            parent: Some(array_path.clone()),
            item: Some(module),
            trail: member_trail,
        };
        for field in fields {
            self.visit(catalog, field, &scope, depth);
        }
    }
}

fn shape_of<'r>(registry: &'r SchemaRegistry, def: &'r TypeDefinition) -> Shape<'r> {
    match def.type_name.as_str() {
        "array" => array_shape(&def.of),
        "object" => Shape::Object {
            kind: FieldKind::Object,
            fields: &def.fields,
        },
        name => match FieldKind::parse(name) {
            FieldKind::Custom(custom) => {
                if !def.fields.is_empty() {
                    return Shape::Object {
                        kind: FieldKind::Custom(custom),
                        fields: &def.fields,
                    };
                }
                match registry.get(&custom) {
                    Some(named) if named.type_name == "array" => array_shape(&named.of),
                    Some(named) if named.type_name == "object" || !named.fields.is_empty() => {
                        Shape::Object {
                            kind: FieldKind::Custom(custom),
                            fields: &named.fields,
                        }
                    }
                    Some(named) => Shape::Leaf(FieldKind::parse(&named.type_name)),
                    None => Shape::Leaf(FieldKind::Custom(custom)),
                }
            }
            builtin => Shape::Leaf(builtin),
        },
    }
}

fn array_shape(members: &[TypeDefinition]) -> Shape<'_> {
    if !members.is_empty() && members.iter().all(|m| m.type_name == BLOCK_TYPE) {
        Shape::Leaf(FieldKind::BlockContent)
    } else {
        Shape::Array { members }
    }
}

/// Name an array member is known by: its own name for inline objects,
/// otherwise the named type it refers to
fn member_name(member: &TypeDefinition) -> Option<String> {
    if member.type_name == "object" || !member.fields.is_empty() {
        member.name.clone()
    } else {
        Some(member.type_name.clone())
    }
}
