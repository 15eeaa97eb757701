//! Scrivener CLI - Command-line interface for the Scrivener document pipeline.

use clap::Parser;
use scrivener_cli::commands;
use scrivener_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> scrivener_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load config; a missing file means defaults
    let config = Config::load(cli.config.as_deref())?;

    init_tracing(&config, cli.verbose);

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Catalog(args) => commands::execute_catalog(args, &formatter)?,
        Command::Parse(args) => commands::execute_parse(args, &config, &formatter)?,
        Command::Compose(args) => commands::execute_compose(args, &config, &formatter).await?,
        Command::Prompt(args) => commands::execute_prompt(args, &config)?,
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over the config file, which wins over `--verbose`
fn init_tracing(config: &Config, verbose: bool) {
    let fallback = config
        .settings
        .log_level
        .clone()
        .unwrap_or_else(|| if verbose { "debug" } else { "warn" }.to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
