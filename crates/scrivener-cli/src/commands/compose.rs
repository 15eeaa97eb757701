//! Compose command implementation.

use crate::cli::ComposeArgs;
use crate::commands::catalog::load_catalog;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use scrivener_domain::{FieldCatalog, RandomKeys};
use scrivener_extractor::{FieldSelection, GenerationResult, Generator};
use scrivener_llm::MockProvider;
use std::fs;
use std::path::Path;

/// Model name reported for documents composed from a saved response
const SAVED_RESPONSE_MODEL: &str = "saved-response";

/// Execute the compose command.
pub async fn execute_compose(args: ComposeArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let raw = fs::read_to_string(&args.response)?;
    let catalog = load_catalog(&args.source, &args.document_type)?;
    let selection = load_selection(args.fields.as_deref(), &catalog)?;

    let result = compose(&raw, &catalog, &selection, config).await?;
    println!("{}", formatter.format_generation(&result)?);
    Ok(())
}

/// Run a saved provider response through the generation pipeline.
pub async fn compose(
    raw: &str,
    catalog: &FieldCatalog,
    selection: &FieldSelection,
    config: &Config,
) -> Result<GenerationResult> {
    if catalog.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "No fields found for document type '{}'",
            catalog.document_type()
        )));
    }

    let replay = MockProvider::new(raw).with_model(SAVED_RESPONSE_MODEL);
    let generator = Generator::new(replay, RandomKeys, config.extractor.clone());
    Ok(generator.process_response(raw, catalog, selection).await?)
}

/// Field settings from `path`, or every field of the catalog.
pub fn load_selection(path: Option<&Path>, catalog: &FieldCatalog) -> Result<FieldSelection> {
    match path {
        Some(path) => Ok(FieldSelection::from_json(&fs::read_to_string(path)?)?),
        None => Ok(FieldSelection::all(catalog)),
    }
}
