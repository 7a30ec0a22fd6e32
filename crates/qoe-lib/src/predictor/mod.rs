//! ML prediction engine

mod inference;
mod output;

pub use inference::QualityModel;
pub use output::{OutputConfig, OutputFormatter, SCORE_DECIMALS};

use crate::bundle::ArtifactBundle;
use crate::error::Result;
use crate::models::{FeatureRecord, QualityScore};
use crate::observability::StructuredLogger;
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

/// Trait for prediction implementations
pub trait ScorePredictor {
    /// Score one raw measurement
    fn predict(&self, record: &FeatureRecord) -> Result<QualityScore>;

    /// Identifier of the artifact bundle backing this predictor
    fn bundle_id(&self) -> &str;
}

/// Explicit predictor settings, fixed at construction
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// Directory holding the three artifact files
    pub artifact_dir: PathBuf,
    /// Emit per-stage diagnostics
    pub verbose: bool,
}

impl PredictorConfig {
    pub fn new(artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifact_dir: artifact_dir.into(),
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Predictor backed by a verified artifact bundle
pub struct BundlePredictor {
    config: PredictorConfig,
    bundle: ArtifactBundle,
    output_formatter: OutputFormatter,
    logger: StructuredLogger,
}

impl BundlePredictor {
    /// Load the bundle named by the config
    pub fn load(config: PredictorConfig) -> Result<Self> {
        let start = Instant::now();
        let bundle = ArtifactBundle::load(&config.artifact_dir)?;
        let predictor = Self::from_bundle(bundle, config);
        if predictor.config.verbose {
            predictor.logger.log_bundle_loaded(
                &predictor.config.artifact_dir,
                predictor.bundle.bundle_id(),
                &predictor.bundle.pipeline().columns(),
                start.elapsed().as_micros() as u64,
            );
        }
        Ok(predictor)
    }

    pub fn from_bundle(bundle: ArtifactBundle, config: PredictorConfig) -> Self {
        Self {
            config,
            bundle,
            output_formatter: OutputFormatter::new(),
            logger: StructuredLogger::new("predictor"),
        }
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Score five raw values, returning the clamped and rounded score
    pub fn predict_values(
        &self,
        bandwidth: f64,
        latency: f64,
        packet_loss: f64,
        resolution: &str,
        bitrate: f64,
    ) -> Result<f64> {
        let record = FeatureRecord::new(bandwidth, latency, packet_loss, resolution, bitrate);
        Ok(self.predict(&record)?.score)
    }
}

impl ScorePredictor for BundlePredictor {
    fn predict(&self, record: &FeatureRecord) -> Result<QualityScore> {
        let start = Instant::now();
        let pipeline = self.bundle.pipeline();

        let features = pipeline.transform(record)?;
        if self.config.verbose {
            let known = pipeline.encoder().index_of(&record.resolution).is_some();
            debug!(
                columns = ?pipeline.columns(),
                features = ?features,
                known_resolution = known,
                "Encoded feature vector"
            );
        }

        let raw = self.bundle.model().predict_raw(&features)?;
        let score = self.output_formatter.format(raw, self.bundle.bundle_id());

        if self.config.verbose {
            self.logger
                .log_prediction(record, raw, &score, start.elapsed().as_micros() as u64);
        }
        Ok(score)
    }

    fn bundle_id(&self) -> &str {
        self.bundle.bundle_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeaturePipeline;
    use crate::models::{BoostingParams, MAX_SCORE, MIN_SCORE};
    use crate::QoeError;
    use tempfile::TempDir;

    fn training_set() -> (Vec<FeatureRecord>, Vec<f64>) {
        let resolutions = ["480p", "720p", "1080p", "1440p", "4K"];
        let records: Vec<FeatureRecord> = (0..100)
            .map(|i| {
                let t = i as f64 / 100.0;
                FeatureRecord::new(
                    1.0 + 99.0 * t,
                    5.0 + 495.0 * ((i * 37) % 100) as f64 / 100.0,
                    10.0 * ((i * 13) % 100) as f64 / 100.0,
                    resolutions[i % resolutions.len()],
                    500.0 + 14500.0 * ((i * 53) % 100) as f64 / 100.0,
                )
            })
            .collect();
        let scores = records
            .iter()
            .map(|r| (1.0 + 4.0 * r.bandwidth / 100.0).clamp(1.0, 5.0))
            .collect();
        (records, scores)
    }

    fn predictor_in(dir: &TempDir) -> BundlePredictor {
        let (records, scores) = training_set();
        let pipeline = FeaturePipeline::fit(&records).unwrap();
        let x = pipeline.transform_batch(&records).unwrap();
        let params = BoostingParams {
            n_estimators: 60,
            max_depth: 3,
            learning_rate: 0.1,
        };
        let model = QualityModel::fit(pipeline.columns(), &x, &scores, params).unwrap();
        ArtifactBundle::new(pipeline, model)
            .unwrap()
            .save(dir.path())
            .unwrap();
        BundlePredictor::load(PredictorConfig::new(dir.path())).unwrap()
    }

    #[test]
    fn test_prediction_within_domain() {
        let dir = TempDir::new().unwrap();
        let predictor = predictor_in(&dir);
        let extremes = [
            FeatureRecord::new(1e9, 0.0, 0.0, "4K", 1e9),
            FeatureRecord::new(-1e9, 1e9, 1e3, "480p", -1e9),
            FeatureRecord::new(50.0, 100.0, 1.0, "unknown", 5000.0),
        ];
        for record in &extremes {
            let score = predictor.predict(record).unwrap();
            assert!(
                (MIN_SCORE..=MAX_SCORE).contains(&score.score),
                "{} out of range",
                score.score
            );
        }
    }

    #[test]
    fn test_repeated_predictions_identical() {
        let dir = TempDir::new().unwrap();
        let predictor = predictor_in(&dir);
        let first = predictor
            .predict_values(50.0, 100.0, 1.0, "1080p", 5000.0)
            .unwrap();

        let reloaded = BundlePredictor::load(PredictorConfig::new(dir.path()).verbose(true)).unwrap();
        for _ in 0..5 {
            assert_eq!(
                reloaded
                    .predict_values(50.0, 100.0, 1.0, "1080p", 5000.0)
                    .unwrap(),
                first
            );
        }
    }

    #[test]
    fn test_training_row_reproduced_within_residual() {
        let dir = TempDir::new().unwrap();
        let predictor = predictor_in(&dir);
        let (records, scores) = training_set();
        for (record, expected) in records.iter().zip(&scores).step_by(7) {
            let score = predictor.predict(record).unwrap();
            assert!(
                (score.score - expected).abs() < 0.5,
                "predicted {} for target {}",
                score.score,
                expected
            );
        }
    }

    #[test]
    fn test_missing_bundle_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let result = BundlePredictor::load(PredictorConfig::new(dir.path()));
        assert!(matches!(result, Err(QoeError::MissingArtifact { .. })));
    }

    #[test]
    fn test_invalid_record_aborts_request() {
        let dir = TempDir::new().unwrap();
        let predictor = predictor_in(&dir);
        let result = predictor.predict_values(f64::NAN, 100.0, 1.0, "1080p", 5000.0);
        assert!(matches!(result, Err(QoeError::Validation(_))));
    }
}
