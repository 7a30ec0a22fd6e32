//! Observability infrastructure for the trainer and predictor
//!
//! Provides:
//! - Subscriber setup writing to stderr (stdout carries command output only)
//! - Structured lifecycle events with tracing

use crate::models::{BoostingParams, FeatureRecord, QualityScore, MAX_SCORE, MIN_SCORE};
use crate::training::RegressionMetrics;
use std::path::Path;
use tracing::{debug, info, warn};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output settings
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `settings.level`.
pub fn init_tracing(settings: &LogSettings) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let registry = tracing_subscriber::registry().with(filter);
    if settings.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    }
}

/// Structured logger for training and prediction events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    component: String,
}

impl StructuredLogger {
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    /// Log start of a training run
    pub fn log_training_started(&self, version: &str, artifact_dir: &Path) {
        info!(
            event = "training_started",
            component = %self.component,
            version = %version,
            artifact_dir = %artifact_dir.display(),
            "Starting model training"
        );
    }

    /// Log dataset acquisition
    pub fn log_dataset_loaded(&self, source: &Path, rows: usize, synthetic: bool) {
        if synthetic {
            info!(
                event = "dataset_synthesized",
                component = %self.component,
                path = %source.display(),
                rows = rows,
                "Dataset not found, synthesized a deterministic one"
            );
        } else {
            info!(
                event = "dataset_loaded",
                component = %self.component,
                path = %source.display(),
                rows = rows,
                "Loaded dataset"
            );
        }
    }

    /// Log fitted encoder and scaler layout
    pub fn log_pipeline_fitted(&self, columns: &[String], categories: &[String]) {
        info!(
            event = "pipeline_fitted",
            component = %self.component,
            width = columns.len(),
            columns = ?columns,
            categories = ?categories,
            "Fitted encoder and scaler"
        );
    }

    /// Log the cross-validated score of one grid candidate
    pub fn log_candidate(&self, params: &BoostingParams, mean_mse: f64, std_mse: f64) {
        debug!(
            event = "grid_candidate",
            component = %self.component,
            n_estimators = params.n_estimators,
            max_depth = params.max_depth,
            learning_rate = params.learning_rate,
            mean_mse = mean_mse,
            std_mse = std_mse,
            "Scored grid candidate"
        );
    }

    /// Log the configuration chosen by grid search
    pub fn log_best_params(&self, params: &BoostingParams, mean_mse: f64) {
        info!(
            event = "grid_search_complete",
            component = %self.component,
            n_estimators = params.n_estimators,
            max_depth = params.max_depth,
            learning_rate = params.learning_rate,
            best_cv_neg_mse = -mean_mse,
            "Selected best configuration"
        );
    }

    /// Log hold-out evaluation
    pub fn log_evaluation(&self, metrics: &RegressionMetrics) {
        info!(
            event = "evaluation",
            component = %self.component,
            mse = metrics.mse,
            rmse = metrics.rmse,
            mae = metrics.mae,
            r2 = metrics.r2,
            "Evaluated model on test split"
        );
    }

    /// Log a saved bundle
    pub fn log_bundle_saved(&self, dir: &Path, bundle_id: &str) {
        info!(
            event = "bundle_saved",
            component = %self.component,
            dir = %dir.display(),
            bundle_id = %bundle_id,
            "Model and transformers saved"
        );
    }

    /// Log a verified bundle load
    pub fn log_bundle_loaded(&self, dir: &Path, bundle_id: &str, columns: &[String], elapsed_us: u64) {
        debug!(
            event = "bundle_loaded",
            component = %self.component,
            dir = %dir.display(),
            bundle_id = %bundle_id,
            columns = ?columns,
            elapsed_us = elapsed_us,
            "Loaded artifact bundle"
        );
    }

    /// Log one scored request
    pub fn log_prediction(
        &self,
        record: &FeatureRecord,
        raw: f64,
        score: &QualityScore,
        elapsed_us: u64,
    ) {
        if !(MIN_SCORE..=MAX_SCORE).contains(&raw) {
            debug!(
                event = "score_clamped",
                component = %self.component,
                raw = raw,
                score = score.score,
                "Model output clamped to score domain"
            );
        }
        debug!(
            event = "prediction",
            component = %self.component,
            bandwidth = record.bandwidth,
            latency = record.latency,
            packet_loss = record.packet_loss,
            resolution = %record.resolution,
            bitrate = record.bitrate,
            raw = raw,
            score = score.score,
            quality = %score.quality,
            bundle_id = %score.bundle_id,
            elapsed_us = elapsed_us,
            "Generated quality prediction"
        );
    }

    /// Log a failed run or request
    pub fn log_failure(&self, kind: &str, message: &str) {
        warn!(
            event = "failure",
            component = %self.component,
            kind = %kind,
            message = %message,
            "Operation failed"
        );
    }
}
