//! Prompt command implementation.

use crate::cli::PromptArgs;
use crate::commands::catalog::load_catalog;
use crate::commands::compose::load_selection;
use crate::config::Config;
use crate::error::{CliError, Result};
use scrivener_extractor::PromptBuilder;
use std::fs;

/// Execute the prompt command.
pub fn execute_prompt(args: PromptArgs, config: &Config) -> Result<()> {
    let text = fs::read_to_string(&args.note)?;
    let fallback = args
        .note
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (title, body) = split_note(&text, &fallback);

    let length = title.chars().count() + body.chars().count();
    if length > config.extractor.max_note_length {
        return Err(CliError::InvalidInput(format!(
            "Note is {} characters; the limit is {}",
            length, config.extractor.max_note_length
        )));
    }

    let catalog = load_catalog(&args.source, &args.document_type)?;
    let selection = load_selection(args.fields.as_deref(), &catalog)?;

    let prompt = PromptBuilder::new(&title, &body, &args.document_type)
        .with_fields(&catalog, &selection)
        .build();
    println!("{}", prompt);
    Ok(())
}

/// Split a markdown note into title and body
///
/// The first non-blank line is the title when it is a `# ` heading;
/// otherwise the fallback title is used and the whole text is the body.
fn split_note(text: &str, fallback_title: &str) -> (String, String) {
    let trimmed = text.trim_start();
    if let Some(rest) = trimmed.strip_prefix("# ") {
        let (title, body) = rest.split_once('\n').unwrap_or((rest, ""));
        return (title.trim().to_string(), body.trim().to_string());
    }
    (fallback_title.to_string(), text.trim().to_string())
}
