//! Streaming quality model trainer
//!
//! Fits the encoder, scaler and boosted-tree regressor on a labeled dataset
//! (synthesized when none exists) and writes a fresh artifact bundle.

mod config;
mod report;

use crate::config::TrainerConfig;
use anyhow::{Context, Result};
use clap::Parser;
use qoe_lib::{init_tracing, StructuredLogger, Trainer};
use std::path::PathBuf;
use tracing::info;

/// Video streaming quality model trainer
#[derive(Parser, Debug)]
#[command(name = "qoe-train")]
#[command(author, version, about = "Train the video streaming quality model", long_about = None)]
pub struct Cli {
    /// TOML configuration file (default: qoe-train.toml when present)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Labeled CSV dataset; synthesized when absent
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Output directory for the artifact bundle
    #[arg(long, short = 'o')]
    pub artifacts: Option<PathBuf>,

    /// Rows to synthesize when no dataset exists
    #[arg(long)]
    pub samples: Option<usize>,

    /// Seed for data synthesis and the train/test split
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fraction of rows held out for evaluation
    #[arg(long)]
    pub test_fraction: Option<f64>,

    /// Cross-validation folds
    #[arg(long)]
    pub cv_folds: Option<usize>,

    /// Do not write synthesized data to disk
    #[arg(long)]
    pub no_save_synthetic: bool,

    /// Tree counts to search (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub n_estimators: Vec<usize>,

    /// Tree depths to search (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub max_depth: Vec<u32>,

    /// Learning rates to search (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub learning_rate: Vec<f64>,

    /// Log filter when RUST_LOG is unset
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    pub log_json: bool,

    /// Report format
    #[arg(long, short, default_value = "table")]
    pub format: report::OutputFormat,
}

impl Cli {
    /// Apply explicit flags on top of the loaded configuration
    fn apply(&self, config: &mut TrainerConfig) {
        if let Some(path) = &self.data {
            config.data_path = path.clone();
        }
        if let Some(dir) = &self.artifacts {
            config.artifact_dir = dir.clone();
        }
        if let Some(samples) = self.samples {
            config.synthetic_samples = samples;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(fraction) = self.test_fraction {
            config.test_fraction = fraction;
        }
        if let Some(folds) = self.cv_folds {
            config.cv_folds = folds;
        }
        if self.no_save_synthetic {
            config.save_synthetic = false;
        }
        if !self.n_estimators.is_empty() {
            config.grid.n_estimators = self.n_estimators.clone();
        }
        if !self.max_depth.is_empty() {
            config.grid.max_depth = self.max_depth.clone();
        }
        if !self.learning_rate.is_empty() {
            config.grid.learning_rate = self.learning_rate.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if self.log_json {
            config.log_json = true;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = TrainerConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    init_tracing(&config.log_settings()).context("Failed to initialize logging")?;
    info!(
        data_path = %config.data_path.display(),
        artifact_dir = %config.artifact_dir.display(),
        seed = config.seed,
        "Loaded trainer configuration"
    );

    let trainer = Trainer::new(config.training_config());
    let report = trainer
        .run()
        .inspect_err(|err| {
            StructuredLogger::new("trainer").log_failure(err.kind(), &err.to_string())
        })
        .context("Training failed")?;

    report::print_report(&report, cli.format)
}
