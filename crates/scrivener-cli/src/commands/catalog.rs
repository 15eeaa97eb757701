//! Catalog command implementation.

use crate::cli::{CatalogArgs, SourceArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use scrivener_domain::FieldCatalog;
use scrivener_schema::{CatalogService, InMemorySchemaSource};
use std::fs;

/// Execute the catalog command.
pub fn execute_catalog(args: CatalogArgs, formatter: &Formatter) -> Result<()> {
    let service = CatalogService::new(load_source(&args.source)?);
    let fields = service.catalog_display(&args.document_type);
    println!("{}", formatter.format_catalog(&args.document_type, &fields)?);
    Ok(())
}

/// Infer the catalog of `document_type` from the files named on the command line.
pub fn load_catalog(source: &SourceArgs, document_type: &str) -> Result<FieldCatalog> {
    let service = CatalogService::new(load_source(source)?);
    Ok(service.catalog(document_type))
}

fn load_source(source: &SourceArgs) -> Result<InMemorySchemaSource> {
    match (&source.samples, &source.schema) {
        (Some(path), _) => Ok(InMemorySchemaSource::from_samples_json(&fs::read_to_string(path)?)?),
        (None, Some(path)) => Ok(InMemorySchemaSource::from_definitions_json(&fs::read_to_string(path)?)?),
        (None, None) => Err(CliError::InvalidInput(
            "Either --samples or --schema is required".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_catalog_from_samples_file() {
        let dir = TempDir::new().unwrap();
        let samples = write(
            &dir,
            "samples.json",
            r#"[{"_type": "post", "title": "a", "seo": {"metaTitle": "m"}}]"#,
        );
        let source = SourceArgs {
            samples: Some(samples),
            schema: None,
        };

        let catalog = load_catalog(&source, "post").unwrap();
        assert!(catalog.contains("title"));
        assert!(catalog.contains("seo.metaTitle"));
    }

    #[test]
    fn test_catalog_from_schema_file() {
        let dir = TempDir::new().unwrap();
        let schema = write(
            &dir,
            "schema.json",
            r#"[{"name": "post", "type": "document", "fields": [{"name": "publishedAt", "type": "date"}]}]"#,
        );
        let source = SourceArgs {
            samples: None,
            schema: Some(schema),
        };

        let catalog = load_catalog(&source, "post").unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("publishedAt"));
    }

    #[test]
    fn test_unknown_type_yields_empty_catalog() {
        let dir = TempDir::new().unwrap();
        let samples = write(&dir, "samples.json", r#"[{"_type": "post", "title": "a"}]"#);
        let source = SourceArgs {
            samples: Some(samples),
            schema: None,
        };
        assert!(load_catalog(&source, "page").unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = SourceArgs {
            samples: Some(PathBuf::from("/nonexistent/samples.json")),
            schema: None,
        };
        assert!(matches!(load_catalog(&source, "post"), Err(CliError::Io(_))));
    }
}
