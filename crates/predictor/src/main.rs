//! Streaming quality predictor
//!
//! Scores one measurement against a trained artifact bundle. On success the
//! only thing written to stdout is the score; failures produce a single
//! `ERROR:` line on stderr and exit status 1.

mod config;
mod output;

use clap::error::ErrorKind;
use clap::Parser;
use qoe_lib::{
    init_tracing, BundlePredictor, FeatureRecord, LogSettings, ScorePredictor, StructuredLogger,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Video streaming quality predictor
#[derive(Parser, Debug)]
#[command(name = "qoe-predict")]
#[command(author, version, about = "Predict a 1-5 video streaming quality score", long_about = None)]
pub struct Cli {
    /// BANDWIDTH LATENCY PACKET_LOSS RESOLUTION BITRATE (after any options; taken verbatim)
    #[arg(
        value_name = "FEATURE",
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub features: Vec<String>,

    /// Directory holding the artifact bundle (defaults to the executable's directory)
    #[arg(long, env = "QOE_ARTIFACT_DIR")]
    pub artifacts: Option<PathBuf>,

    /// Print diagnostics to stderr
    #[arg(long, short, env = "QOE_VERBOSE")]
    pub verbose: bool,

    /// Output format
    #[arg(long, short, default_value = "plain")]
    pub format: output::OutputFormat,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return usage_error(err),
    };

    if cli.verbose {
        let settings = LogSettings {
            level: "debug".to_string(),
            json: false,
        };
        if let Err(e) = init_tracing(&settings) {
            eprintln!("failed to initialize logging: {e}");
        }
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::print_error(&err, cli.verbose);
            if cli.verbose {
                StructuredLogger::new("predictor").log_failure(err.kind(), &err.to_string());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> qoe_lib::Result<()> {
    // Arguments are checked before any artifact is read
    let record = FeatureRecord::from_args(&cli.features)?;
    let config = config::predictor_config(cli)?;
    let predictor = BundlePredictor::load(config)?;
    let score = predictor.predict(&record)?;
    output::print_score(&score, predictor.output_formatter(), cli.format)
}

/// Help and version go to stdout with status 0; anything else is a usage failure
fn usage_error(err: clap::Error) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{err}");
            ExitCode::SUCCESS
        }
        kind => {
            let class = match kind {
                ErrorKind::WrongNumberOfValues
                | ErrorKind::TooFewValues
                | ErrorKind::TooManyValues
                | ErrorKind::MissingRequiredArgument
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => "ArgumentCountError",
                _ => "ArgumentParseError",
            };
            let rendered = err.to_string();
            let message = rendered
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("error: ");
            eprintln!("ERROR: {class}: {message}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use qoe_lib::QoeError;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_negative_positionals() {
        let cli = Cli::try_parse_from(["qoe-predict", "-5", "100", "-1.5", "4K", "5000"]).unwrap();
        assert_eq!(cli.features, vec!["-5", "100", "-1.5", "4K", "5000"]);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_options_precede_values() {
        let cli = Cli::try_parse_from([
            "qoe-predict",
            "--artifacts",
            "/tmp/bundle",
            "-v",
            "--format",
            "json",
            "50",
            "100",
            "1",
            "1080p",
            "5000",
        ])
        .unwrap();
        assert_eq!(cli.features.len(), 5);
        assert_eq!(cli.artifacts, Some(PathBuf::from("/tmp/bundle")));
        assert!(cli.verbose);
        assert!(matches!(cli.format, output::OutputFormat::Json));
    }

    #[test]
    fn test_hyphenated_resolution_is_a_value() {
        let cli = Cli::try_parse_from(["qoe-predict", "50", "100", "1", "-4K", "5000"]).unwrap();
        assert_eq!(cli.features, vec!["50", "100", "1", "-4K", "5000"]);

        let cli = Cli::try_parse_from(["qoe-predict", "50", "100", "1", "--hd", "5000"]).unwrap();
        assert_eq!(cli.features[3], "--hd");
    }

    #[test]
    fn test_trailing_options_count_as_values() {
        let cli =
            Cli::try_parse_from(["qoe-predict", "50", "100", "1", "4K", "5000", "-v"]).unwrap();
        assert!(!cli.verbose);
        let err = run(&cli).unwrap_err();
        assert!(matches!(err, QoeError::ArgumentCount { expected: 5, got: 6 }));
    }

    #[test]
    fn test_wrong_count_fails_before_loading() {
        let cli =
            Cli::try_parse_from(["qoe-predict", "--artifacts", "/nonexistent", "1", "2"]).unwrap();
        let err = run(&cli).unwrap_err();
        assert!(matches!(err, QoeError::ArgumentCount { expected: 5, got: 2 }));
    }
}
