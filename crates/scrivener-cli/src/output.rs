//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use scrivener_domain::SchemaField;
use scrivener_extractor::{GenerationResult, ParsedResponse};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Longest value shown in a table cell before it is cut
const CELL_WIDTH: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a field catalog.
    pub fn format_catalog(&self, document_type: &str, fields: &[SchemaField]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(fields)?),
            OutputFormat::Quiet => Ok(fields
                .iter()
                .map(|f| f.path.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if fields.is_empty() {
                    return Ok(self.warning(&format!("No fields found for '{}'.", document_type)));
                }

                let mut builder = Builder::default();
                builder.push_record(["Path", "Type", "Title", "Module", "Item"]);
                for field in fields {
                    builder.push_record([
                        field.path.to_string(),
                        field.kind.to_string(),
                        field.title.clone(),
                        field.module_type.clone().unwrap_or_default(),
                        if field.is_array_item { "yes" } else { "" }.to_string(),
                    ]);
                }

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));

                Ok(format!(
                    "{}\n{}",
                    table,
                    self.info(&format!("{} field(s) in '{}'", fields.len(), document_type))
                ))
            }
        }
    }

    /// Format a parsed response.
    pub fn format_parsed(&self, parsed: &ParsedResponse) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "stage": parsed.stage,
                "values": parsed.values.to_value(),
            }))?),
            OutputFormat::Quiet => Ok(parsed.values.keys().collect::<Vec<_>>().join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Key", "Value"]);
                for (key, value) in parsed.values.iter() {
                    let rendered = serde_json::to_string(value)?;
                    builder.push_record([key.to_string(), truncate(&rendered, CELL_WIDTH)]);
                }

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));

                Ok(format!(
                    "{}\n{}",
                    table,
                    self.info(&format!(
                        "{} value(s), repair stage: {}",
                        parsed.values.len(),
                        parsed.stage
                    ))
                ))
            }
        }
    }

    /// Format a generation result.
    pub fn format_generation(&self, result: &GenerationResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
            OutputFormat::Quiet => Ok(serde_json::to_string(&result.document)?),
            OutputFormat::Table => {
                let mut lines = vec![serde_json::to_string_pretty(&result.document)?];
                for warning in &result.warnings {
                    lines.push(self.warning(&format!("{}: {}", warning.path, warning.message)));
                }
                for key in &result.unmatched_keys {
                    lines.push(self.warning(&format!("Unmatched key: {}", key)));
                }
                lines.push(self.success(&format!(
                    "Composed '{}' from {} value(s) (repair stage: {})",
                    result.metadata.document_type,
                    result.metadata.fields_generated,
                    result.metadata.repair_stage
                )));
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
