//! Trainer configuration
//!
//! Layers, lowest precedence first: built-in defaults, an optional TOML file,
//! `QOE_TRAIN__*` environment variables, then command-line flags.

use anyhow::{bail, Context, Result};
use qoe_lib::{LogSettings, ParamGrid, TrainingConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File read when `--config` is not given, if present
pub const DEFAULT_CONFIG_FILE: &str = "qoe-train.toml";

const ENV_PREFIX: &str = "QOE_TRAIN";

/// Trainer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Labeled dataset; synthesized when absent
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Output directory for the artifact bundle
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    #[serde(default = "default_synthetic_samples")]
    pub synthetic_samples: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,

    #[serde(default = "default_cv_folds")]
    pub cv_folds: usize,

    /// Write synthesized data to `data_path`
    #[serde(default = "default_save_synthetic")]
    pub save_synthetic: bool,

    #[serde(default)]
    pub grid: ParamGrid,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("video_streaming_data.csv")
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_synthetic_samples() -> usize {
    1000
}

fn default_seed() -> u64 {
    42
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_cv_folds() -> usize {
    5
}

fn default_save_synthetic() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            artifact_dir: default_artifact_dir(),
            synthetic_samples: default_synthetic_samples(),
            seed: default_seed(),
            test_fraction: default_test_fraction(),
            cv_folds: default_cv_folds(),
            save_synthetic: default_save_synthetic(),
            grid: ParamGrid::default(),
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl TrainerConfig {
    /// Load from an optional file and the process environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(file, None)
    }

    /// Load with an explicit environment map in place of the process environment
    pub fn load_with_env(
        file: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let (path, required) = match file {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };

        let settings = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(required),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("grid.n_estimators")
                    .with_list_parse_key("grid.max_depth")
                    .with_list_parse_key("grid.learning_rate")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        settings
            .try_deserialize()
            .context("Invalid trainer configuration")
    }

    /// Reject settings no training run can satisfy
    pub fn validate(&self) -> Result<()> {
        if self.synthetic_samples == 0 {
            bail!("synthetic_samples must be greater than 0");
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            bail!("test_fraction must be in (0, 1), got {}", self.test_fraction);
        }
        if self.cv_folds < 2 {
            bail!("cv_folds must be at least 2, got {}", self.cv_folds);
        }
        self.grid.validate().context("Invalid hyperparameter grid")?;
        Ok(())
    }

    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            data_path: self.data_path.clone(),
            artifact_dir: self.artifact_dir.clone(),
            synthetic_samples: self.synthetic_samples,
            seed: self.seed,
            test_fraction: self.test_fraction,
            cv_folds: self.cv_folds,
            save_synthetic: self.save_synthetic,
            grid: self.grid.clone(),
        }
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            level: self.log_level.clone(),
            json: self.log_json,
        }
    }
}
