//! Union of partial catalogs with first-seen-wins semantics

use scrivener_domain::FieldCatalog;
use tracing::debug;

/// Merge catalogs for one document type into a single catalog
///
/// Catalogs are visited in order; for a path seen more than once the earliest
/// definition is kept even when a later one infers a different type.
pub fn merge_catalogs<I>(document_type: &str, catalogs: I) -> FieldCatalog
where
    I: IntoIterator<Item = FieldCatalog>,
{
    let mut merged = FieldCatalog::new(document_type);

    for catalog in catalogs {
        for field in catalog.into_fields() {
            let path = field.path.to_string();
            let kind = field.kind.clone();
            match merged.insert(field) {
                Ok(true) => {}
                Ok(false) => {
                    if let Some(existing) = merged.get(&path) {
                        if existing.kind != kind {
                            debug!(
                                "Keeping '{}' as {} (later sample says {})",
                                path, existing.kind, kind
                            );
                        }
                    }
                }
                Err(e) => debug!("Dropping field during merge: {}", e),
            }
        }
    }

    merged
}
