//! Parse command implementation.

use crate::cli::ParseArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use scrivener_extractor::parse_response;
use std::fs;

/// Execute the parse command.
pub fn execute_parse(args: ParseArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let raw = fs::read_to_string(&args.response)?;
    let parsed = parse_response(&raw, config.extractor.diagnostic_excerpt_chars)?;
    println!("{}", formatter.format_parsed(&parsed)?);
    Ok(())
}
