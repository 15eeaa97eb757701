//! Catalog service
//!
//! Chooses between declarative extraction and sample probing for a document
//! type and absorbs every inference failure into an empty catalog.

use crate::declarative::DeclarativeExtractor;
use crate::prober::SampleProber;
use crate::source::SchemaSource;
use crate::{SchemaError, SchemaOptions};
use scrivener_domain::{FieldCatalog, SchemaField};
use tracing::{debug, info, warn};

/// Builds field catalogs from a schema source
pub struct CatalogService<S> {
    source: S,
    options: SchemaOptions,
}

impl<S: SchemaSource> CatalogService<S> {
    /// Create a service with default options
    pub fn new(source: S) -> Self {
        Self::with_options(source, SchemaOptions::default())
    }

    /// Create a service with explicit options
    ///
    /// Invalid options are replaced by the defaults.
    pub fn with_options(source: S, options: SchemaOptions) -> Self {
        let options = match options.validate() {
            Ok(()) => options,
            Err(e) => {
                warn!("Ignoring schema options ({}), using defaults", e);
                SchemaOptions::default()
            }
        };
        Self { source, options }
    }

    /// Options in effect
    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// The underlying source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Catalog for a document type
    ///
    /// Never fails: an unreachable source or a type with no definition and no
    /// samples yields an empty catalog.
    pub fn catalog(&self, document_type: &str) -> FieldCatalog {
        match self.infer(document_type) {
            Ok(catalog) => {
                info!(
                    "Catalog for '{}' has {} fields",
                    document_type,
                    catalog.len()
                );
                catalog
            }
            Err(e) => {
                warn!("Catalog inference for '{}' failed: {}", document_type, e);
                FieldCatalog::new(document_type)
            }
        }
    }

    /// Catalog fields in display order (lexicographic by path)
    pub fn catalog_display(&self, document_type: &str) -> Vec<SchemaField> {
        self.catalog(document_type)
            .sorted()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Catalogs for every document type the source knows
    pub fn all_catalogs(&self) -> Vec<FieldCatalog> {
        match self.source.document_types() {
            Ok(types) => types.iter().map(|t| self.catalog(t)).collect(),
            Err(e) => {
                warn!("Listing document types failed: {}", e);
                Vec::new()
            }
        }
    }

    fn infer(&self, document_type: &str) -> Result<FieldCatalog, SchemaError> {
        if let Some(registry) = self.source.type_definitions()? {
            let extractor = DeclarativeExtractor::new(&registry, self.options.max_depth);
            if let Some(catalog) = extractor.extract(document_type) {
                return Ok(catalog);
            }
            debug!(
                "No definition for '{}', falling back to samples",
                document_type
            );
        }
        let samples = self
            .source
            .sample_documents(document_type, self.options.sample_limit)?;
        Ok(SampleProber::with_max_depth(self.options.max_depth).probe(document_type, &samples))
    }
}
