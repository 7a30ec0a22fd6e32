//! Output formatting utilities

use clap::ValueEnum;
use qoe_lib::predictor::OutputFormatter;
use qoe_lib::{QoeError, QualityScore, Result};
use std::error::Error;

/// Output format for the score
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Bare number with two decimals (default)
    #[default]
    Plain,
    /// One JSON object with score, quality label and bundle id
    Json,
}

/// Text printed on stdout for a successful prediction
pub fn render_score(
    score: &QualityScore,
    formatter: &OutputFormatter,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Plain => Ok(formatter.render_plain(score)),
        OutputFormat::Json => Ok(serde_json::to_string(score)?),
    }
}

pub fn print_score(
    score: &QualityScore,
    formatter: &OutputFormatter,
    format: OutputFormat,
) -> Result<()> {
    println!("{}", render_score(score, formatter, format)?);
    Ok(())
}

/// One-line diagnostic for a failed request
pub fn error_line(err: &QoeError) -> String {
    format!("ERROR: {}: {}", err.kind(), err)
}

/// Print the diagnostic, followed by the cause chain when verbose
pub fn print_error(err: &QoeError, verbose: bool) {
    eprintln!("{}", error_line(err));
    if verbose {
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
    }
}
