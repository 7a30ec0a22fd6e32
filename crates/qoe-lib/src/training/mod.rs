//! Model training
//!
//! One training run: acquire a labeled dataset (loaded from disk or
//! synthesized), fit the feature pipeline on all of it, split, pick boosting
//! hyperparameters by cross-validated grid search on the training split,
//! refit, evaluate on the held-out split and persist a fresh bundle.

mod grid;
mod metrics;

pub use grid::{grid_search, kfold_ranges, CvResult, GridSearchResult, ParamGrid};
pub use metrics::{mean_absolute_error, mean_squared_error, r2_score, RegressionMetrics};

use crate::bundle::ArtifactBundle;
use crate::dataset;
use crate::error::Result;
use crate::features::FeaturePipeline;
use crate::models::{BoostingParams, FeatureRecord, Sample};
use crate::observability::StructuredLogger;
use crate::predictor::QualityModel;
use crate::synthetic;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for one training run
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Dataset to read; synthesized when the file does not exist
    pub data_path: PathBuf,
    /// Where the bundle is written
    pub artifact_dir: PathBuf,
    /// Rows to synthesize when no dataset exists
    pub synthetic_samples: usize,
    /// Seed for data synthesis and the train/test split
    pub seed: u64,
    pub test_fraction: f64,
    pub cv_folds: usize,
    /// Persist synthesized data to `data_path`
    pub save_synthetic: bool,
    pub grid: ParamGrid,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("video_streaming_data.csv"),
            artifact_dir: PathBuf::from("."),
            synthetic_samples: synthetic::DEFAULT_SAMPLES,
            seed: synthetic::DEFAULT_SEED,
            test_fraction: 0.2,
            cv_folds: 5,
            save_synthetic: true,
            grid: ParamGrid::default(),
        }
    }
}

/// Where the training data came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    File(PathBuf),
    Synthetic { seed: u64, saved_to: Option<PathBuf> },
}

/// Summary of a completed training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub source: DataSource,
    pub samples: usize,
    pub train_samples: usize,
    pub test_samples: usize,
    pub columns: Vec<String>,
    pub categories: Vec<String>,
    pub cv_results: Vec<CvResult>,
    pub best_params: BoostingParams,
    pub best_cv_mse: f64,
    pub test_metrics: RegressionMetrics,
    pub bundle_id: String,
    pub artifacts: Vec<PathBuf>,
}

/// Runs a training pass to completion
pub struct Trainer {
    config: TrainingConfig,
    logger: StructuredLogger,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            logger: StructuredLogger::new("trainer"),
        }
    }

    /// Load the configured dataset, or synthesize one if the file is absent
    pub fn acquire_dataset(&self) -> Result<(Vec<Sample>, DataSource)> {
        let path = &self.config.data_path;
        if path.exists() {
            let samples = dataset::load_csv(path)?;
            self.logger.log_dataset_loaded(path, samples.len(), false);
            return Ok((samples, DataSource::File(path.clone())));
        }

        let samples = synthetic::generate(self.config.synthetic_samples, self.config.seed);
        let saved_to = if self.config.save_synthetic {
            dataset::write_csv(path, &samples)?;
            Some(path.clone())
        } else {
            None
        };
        self.logger.log_dataset_loaded(path, samples.len(), true);
        Ok((
            samples,
            DataSource::Synthetic {
                seed: self.config.seed,
                saved_to,
            },
        ))
    }

    /// Full run: fit, select, evaluate and persist
    pub fn run(&self) -> Result<TrainingReport> {
        self.logger
            .log_training_started(env!("CARGO_PKG_VERSION"), &self.config.artifact_dir);
        let (samples, source) = self.acquire_dataset()?;
        let (bundle, mut report) = self.fit(&samples, source)?;

        let paths = bundle.save(&self.config.artifact_dir)?;
        self.logger
            .log_bundle_saved(&self.config.artifact_dir, bundle.bundle_id());
        report.artifacts = paths.to_vec();
        Ok(report)
    }

    /// Fit a bundle on in-memory samples without touching disk
    pub fn fit(
        &self,
        samples: &[Sample],
        source: DataSource,
    ) -> Result<(ArtifactBundle, TrainingReport)> {
        let records: Vec<FeatureRecord> = samples.iter().map(|s| s.record.clone()).collect();
        let pipeline = FeaturePipeline::fit(&records)?;
        let columns = pipeline.columns();
        self.logger
            .log_pipeline_fitted(&columns, pipeline.encoder().categories());

        let (train, test) =
            dataset::train_test_split(samples, self.config.test_fraction, self.config.seed)?;
        let (train_x, train_y) = matrix(&pipeline, &train)?;
        let (test_x, test_y) = matrix(&pipeline, &test)?;

        let search = grid_search(
            &columns,
            &train_x,
            &train_y,
            &self.config.grid,
            self.config.cv_folds,
            &self.logger,
        )?;
        let best = search.best().clone();
        self.logger.log_best_params(&best.params, best.mean_mse);

        let model = QualityModel::fit(columns.clone(), &train_x, &train_y, best.params)?;
        let predicted = model.predict_batch(&test_x)?;
        let test_metrics = RegressionMetrics::compute(&test_y, &predicted);
        self.logger.log_evaluation(&test_metrics);

        let categories = pipeline.encoder().categories().to_vec();
        let bundle = ArtifactBundle::new(pipeline, model)?;
        let report = TrainingReport {
            source,
            samples: samples.len(),
            train_samples: train.len(),
            test_samples: test.len(),
            columns,
            categories,
            cv_results: search.results,
            best_params: bundle.model().params(),
            best_cv_mse: best.mean_mse,
            test_metrics,
            bundle_id: bundle.bundle_id().to_string(),
            artifacts: Vec::new(),
        };
        Ok((bundle, report))
    }
}

fn matrix(pipeline: &FeaturePipeline, samples: &[Sample]) -> Result<(Vec<Vec<f64>>, Vec<f64>)> {
    let x = samples
        .iter()
        .map(|s| pipeline.transform(&s.record))
        .collect::<Result<Vec<_>>>()?;
    let y = samples.iter().map(|s| s.quality_score).collect();
    Ok((x, y))
}
