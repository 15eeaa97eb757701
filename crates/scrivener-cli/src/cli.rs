//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Scrivener CLI - Inspect catalogs and turn provider responses into documents.
#[derive(Debug, Parser)]
#[command(name = "scrivener")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SCRIVENER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (paths and keys only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the field catalog of a document type
    Catalog(CatalogArgs),

    /// Parse and repair a saved provider response
    Parse(ParseArgs),

    /// Rebuild a document from a saved provider response
    Compose(ComposeArgs),

    /// Print the prompt that would be sent for a note
    Prompt(PromptArgs),
}

/// Where the catalog comes from.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// JSON file of sample documents
    #[arg(long)]
    pub samples: Option<PathBuf>,

    /// JSON file of declarative type definitions
    #[arg(long)]
    pub schema: Option<PathBuf>,
}

/// Arguments for the catalog command.
#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Document type
    #[arg(short = 't', long = "type")]
    pub document_type: String,

    #[command(flatten)]
    pub source: SourceArgs,
}

/// Arguments for the parse command.
#[derive(Debug, Args)]
pub struct ParseArgs {
    /// File holding the raw provider response
    #[arg(short, long)]
    pub response: PathBuf,
}

/// Arguments for the compose command.
#[derive(Debug, Args)]
pub struct ComposeArgs {
    /// Document type
    #[arg(short = 't', long = "type")]
    pub document_type: String,

    /// File holding the raw provider response
    #[arg(short, long)]
    pub response: PathBuf,

    #[command(flatten)]
    pub source: SourceArgs,

    /// JSON file of field settings; every field is enabled when omitted
    #[arg(long)]
    pub fields: Option<PathBuf>,
}

/// Arguments for the prompt command.
#[derive(Debug, Args)]
pub struct PromptArgs {
    /// Document type
    #[arg(short = 't', long = "type")]
    pub document_type: String,

    /// Markdown note; a leading `# ` line is taken as the title
    #[arg(short, long)]
    pub note: PathBuf,

    #[command(flatten)]
    pub source: SourceArgs,

    /// JSON file of field settings; every field is enabled when omitted
    #[arg(long)]
    pub fields: Option<PathBuf>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
