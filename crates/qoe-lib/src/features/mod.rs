//! Feature encoding for ML inference
//!
//! Turns a raw [`FeatureRecord`] into the fixed-width vector the model was
//! trained on. The layout is numeric columns in input order followed by one
//! one-hot column per frozen resolution category, then min-max scaled:
//!
//! `[bandwidth, latency, packet_loss, bitrate, res_<cat1>, ..., res_<catN>]`

mod encoder;
mod scaler;

pub use encoder::{CategoryEncoder, CATEGORY_PREFIX};
pub use scaler::MinMaxScaler;

use crate::error::{QoeError, Result};
use crate::models::{FeatureRecord, NUMERIC_COLUMNS};

/// Encoder and scaler fitted together during one training run
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturePipeline {
    encoder: CategoryEncoder,
    scaler: MinMaxScaler,
}

impl FeaturePipeline {
    /// Fit the encoder on the resolution column, then the scaler on the encoded matrix
    pub fn fit(records: &[FeatureRecord]) -> Result<Self> {
        for record in records {
            record
                .validate()
                .map_err(|e| QoeError::TrainingFit(e.to_string()))?;
        }
        let encoder = CategoryEncoder::fit(records.iter().map(|r| r.resolution.as_str()))?;
        let rows: Vec<Vec<f64>> = records.iter().map(|r| assemble(&encoder, r)).collect();
        let scaler = MinMaxScaler::fit(column_names(&encoder), &rows)?;
        Ok(Self { encoder, scaler })
    }

    /// Pair a stored encoder and scaler, checking that their column layouts agree
    pub fn from_parts(encoder: CategoryEncoder, scaler: MinMaxScaler) -> Result<Self> {
        encoder.validate()?;
        scaler.validate()?;
        let expected = column_names(&encoder);
        if scaler.columns() != expected.as_slice() {
            return Err(QoeError::ArtifactMismatch(format!(
                "Scaler columns {:?} do not match encoder layout {:?}",
                scaler.columns(),
                expected
            )));
        }
        Ok(Self { encoder, scaler })
    }

    pub fn encoder(&self) -> &CategoryEncoder {
        &self.encoder
    }

    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    pub fn into_parts(self) -> (CategoryEncoder, MinMaxScaler) {
        (self.encoder, self.scaler)
    }

    /// Width of the final feature vector
    pub fn width(&self) -> usize {
        NUMERIC_COLUMNS.len() + self.encoder.width()
    }

    /// Final column names in model order
    pub fn columns(&self) -> Vec<String> {
        column_names(&self.encoder)
    }

    /// Encode and scale a single record
    pub fn transform(&self, record: &FeatureRecord) -> Result<Vec<f64>> {
        record.validate()?;
        let row = assemble(&self.encoder, record);
        if row.len() != self.scaler.width() {
            return Err(QoeError::Transform(format!(
                "Encoded {} columns but scaler was fitted on {}",
                row.len(),
                self.scaler.width()
            )));
        }
        if self.scaler.columns() != self.columns().as_slice() {
            return Err(QoeError::Transform(
                "Encoded column order differs from the fitted order".to_string(),
            ));
        }
        self.scaler.transform(&row)
    }

    /// Encode and scale many records
    pub fn transform_batch(&self, records: &[FeatureRecord]) -> Result<Vec<Vec<f64>>> {
        records.iter().map(|r| self.transform(r)).collect()
    }
}

/// Unscaled row: numeric values followed by the one-hot segment
fn assemble(encoder: &CategoryEncoder, record: &FeatureRecord) -> Vec<f64> {
    let mut row = Vec::with_capacity(NUMERIC_COLUMNS.len() + encoder.width());
    row.extend_from_slice(&record.numeric_values());
    row.extend(encoder.encode(&record.resolution));
    row
}

fn column_names(encoder: &CategoryEncoder) -> Vec<String> {
    NUMERIC_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(encoder.column_names())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_records() -> Vec<FeatureRecord> {
        vec![
            FeatureRecord::new(1.0, 5.0, 0.0, "480p", 500.0),
            FeatureRecord::new(100.0, 500.0, 10.0, "4K", 15000.0),
            FeatureRecord::new(50.0, 100.0, 1.0, "1080p", 5000.0),
            FeatureRecord::new(25.0, 250.0, 5.0, "720p", 2500.0),
        ]
    }

    #[test]
    fn test_column_layout() {
        let pipeline = FeaturePipeline::fit(&training_records()).unwrap();
        assert_eq!(
            pipeline.columns(),
            vec![
                "bandwidth",
                "latency",
                "packet_loss",
                "bitrate",
                "res_1080p",
                "res_480p",
                "res_4K",
                "res_720p"
            ]
        );
        assert_eq!(pipeline.width(), 4 + 4);
    }

    #[test]
    fn test_known_category_one_hot_segment() {
        let pipeline = FeaturePipeline::fit(&training_records()).unwrap();
        let features = pipeline
            .transform(&FeatureRecord::new(50.0, 100.0, 1.0, "4K", 5000.0))
            .unwrap();
        assert_eq!(features.len(), pipeline.width());
        // one-hot columns span [0, 1] in training, so they pass through scaling unchanged
        assert_eq!(&features[4..], &[0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unknown_category_never_errors() {
        let pipeline = FeaturePipeline::fit(&training_records()).unwrap();
        let features = pipeline
            .transform(&FeatureRecord::new(50.0, 100.0, 1.0, "8K", 5000.0))
            .unwrap();
        assert!(features[4..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_numeric_scaling_and_extrapolation() {
        let pipeline = FeaturePipeline::fit(&training_records()).unwrap();
        let features = pipeline
            .transform(&FeatureRecord::new(199.0, 5.0, 20.0, "720p", 500.0))
            .unwrap();
        assert!((features[0] - 2.0).abs() < 1e-12);
        assert_eq!(features[1], 0.0);
        assert!((features[2] - 2.0).abs() < 1e-12);
        assert_eq!(features[3], 0.0);
    }

    #[test]
    fn test_invalid_record_rejected() {
        let pipeline = FeaturePipeline::fit(&training_records()).unwrap();
        let result = pipeline.transform(&FeatureRecord::new(f64::NAN, 1.0, 1.0, "4K", 1.0));
        assert!(matches!(result, Err(QoeError::Validation(_))));
    }

    #[test]
    fn test_from_parts_rejects_mismatched_layout() {
        let a = FeaturePipeline::fit(&training_records()).unwrap();
        let b = FeaturePipeline::fit(&[
            FeatureRecord::new(1.0, 1.0, 1.0, "480p", 1.0),
            FeatureRecord::new(2.0, 2.0, 2.0, "720p", 2.0),
        ])
        .unwrap();
        let (encoder, _) = a.into_parts();
        let (_, scaler) = b.into_parts();
        assert!(matches!(
            FeaturePipeline::from_parts(encoder, scaler),
            Err(QoeError::ArtifactMismatch(_))
        ));
    }
}
