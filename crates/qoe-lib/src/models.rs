//! Core data models for streaming quality prediction

use crate::error::{QoeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of raw inputs accepted per prediction request
pub const RAW_FIELD_COUNT: usize = 5;

/// Names of the numeric columns, in the order they enter the feature vector
pub const NUMERIC_COLUMNS: [&str; 4] = ["bandwidth", "latency", "packet_loss", "bitrate"];

/// Lower bound of the quality score domain
pub const MIN_SCORE: f64 = 1.0;

/// Upper bound of the quality score domain
pub const MAX_SCORE: f64 = 5.0;

/// One raw measurement of a streaming session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Mbps
    pub bandwidth: f64,
    /// ms
    pub latency: f64,
    /// percent
    pub packet_loss: f64,
    /// Opaque resolution token (e.g. "1080p")
    pub resolution: String,
    /// kbps
    pub bitrate: f64,
}

impl FeatureRecord {
    pub fn new(
        bandwidth: f64,
        latency: f64,
        packet_loss: f64,
        resolution: impl Into<String>,
        bitrate: f64,
    ) -> Self {
        Self {
            bandwidth,
            latency,
            packet_loss,
            resolution: resolution.into(),
            bitrate,
        }
    }

    /// Build a record from positional arguments:
    /// `bandwidth latency packet_loss resolution bitrate`
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        if args.len() != RAW_FIELD_COUNT {
            return Err(QoeError::ArgumentCount {
                expected: RAW_FIELD_COUNT,
                got: args.len(),
            });
        }
        let record = Self {
            bandwidth: parse_number("bandwidth", args[0].as_ref())?,
            latency: parse_number("latency", args[1].as_ref())?,
            packet_loss: parse_number("packet_loss", args[2].as_ref())?,
            resolution: args[3].as_ref().to_string(),
            bitrate: parse_number("bitrate", args[4].as_ref())?,
        };
        Ok(record)
    }

    /// Numeric fields in feature-vector order
    pub fn numeric_values(&self) -> [f64; 4] {
        [self.bandwidth, self.latency, self.packet_loss, self.bitrate]
    }

    /// Reject values that cannot be encoded
    pub fn validate(&self) -> Result<()> {
        for (name, value) in NUMERIC_COLUMNS.iter().zip(self.numeric_values()) {
            if !value.is_finite() {
                return Err(QoeError::Validation(format!(
                    "{} must be a finite number, got {}",
                    name, value
                )));
            }
        }
        if self.resolution.trim().is_empty() {
            return Err(QoeError::Validation("resolution is missing".to_string()));
        }
        Ok(())
    }
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|_| QoeError::ArgumentParse {
        field,
        value: raw.to_string(),
    })
}

/// Labeled training example
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub record: FeatureRecord,
    pub quality_score: f64,
}

/// Coarse quality band for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityLabel {
    Excellent,
    Good,
    Fair,
    Poor,
    Bad,
}

impl QualityLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= 4.5 {
            QualityLabel::Excellent
        } else if score >= 3.5 {
            QualityLabel::Good
        } else if score >= 2.5 {
            QualityLabel::Fair
        } else if score >= 1.5 {
            QualityLabel::Poor
        } else {
            QualityLabel::Bad
        }
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QualityLabel::Excellent => "Excellent",
            QualityLabel::Good => "Good",
            QualityLabel::Fair => "Fair",
            QualityLabel::Poor => "Poor",
            QualityLabel::Bad => "Bad",
        };
        f.write_str(name)
    }
}

/// Final prediction output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityScore {
    /// Clamped to [1, 5] and rounded to two decimals
    pub score: f64,
    pub quality: QualityLabel,
    /// Unclamped model output
    #[serde(skip)]
    pub raw: f64,
    pub bundle_id: String,
}

/// Hyperparameters of one boosted-tree configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub max_depth: u32,
    pub learning_rate: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 3,
            learning_rate: 0.1,
        }
    }
}

impl fmt::Display for BoostingParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n_estimators={}, max_depth={}, learning_rate={}",
            self.n_estimators, self.max_depth, self.learning_rate
        )
    }
}
