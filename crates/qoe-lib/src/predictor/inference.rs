//! Gradient-boosted regression inference using gbdt
//!
//! The booster itself is treated as a black box; this module only guards
//! the shape of what goes in and the sanity of what comes out.

use crate::error::{QoeError, Result};
use crate::models::BoostingParams;
use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec, ValueType};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::debug;

const LOSS: &str = "SquaredError";

/// Fitted regressor together with the column layout it was trained on
#[derive(Serialize, Deserialize)]
pub struct QualityModel {
    feature_names: Vec<String>,
    params: BoostingParams,
    booster: GBDT,
}

impl QualityModel {
    /// Fit a booster on a scaled, row-major feature matrix
    pub fn fit(
        feature_names: Vec<String>,
        x: &[Vec<f64>],
        y: &[f64],
        params: BoostingParams,
    ) -> Result<Self> {
        if x.is_empty() {
            return Err(QoeError::TrainingFit("Empty training matrix".to_string()));
        }
        if x.len() != y.len() {
            return Err(QoeError::TrainingFit(format!(
                "Mismatched X/y lengths: {} rows, {} targets",
                x.len(),
                y.len()
            )));
        }
        let width = feature_names.len();
        if let Some(idx) = x.iter().position(|row| row.len() != width) {
            return Err(QoeError::TrainingFit(format!(
                "Row {} has {} columns, expected {}",
                idx,
                x[idx].len(),
                width
            )));
        }
        if params.n_estimators == 0 || params.max_depth == 0 || params.learning_rate <= 0.0 {
            return Err(QoeError::TrainingFit(format!("Invalid parameters: {params}")));
        }

        let mut cfg = Config::new();
        cfg.set_feature_size(width);
        cfg.set_max_depth(params.max_depth);
        cfg.set_iterations(params.n_estimators);
        cfg.set_shrinkage(params.learning_rate as ValueType);
        cfg.set_loss(LOSS);
        cfg.set_debug(false);
        cfg.set_data_sample_ratio(1.0);
        cfg.set_feature_sample_ratio(1.0);
        cfg.set_training_optimization_level(2);

        let mut data: DataVec = x
            .iter()
            .zip(y)
            .map(|(row, &label)| {
                Data::new_training_data(to_values(row), 1.0, label as ValueType, None)
            })
            .collect();

        let start = Instant::now();
        let mut booster = GBDT::new(&cfg);
        panic::catch_unwind(AssertUnwindSafe(|| booster.fit(&mut data)))
            .map_err(|payload| QoeError::TrainingFit(panic_message(payload)))?;
        debug!(
            rows = x.len(),
            params = %params,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Booster fitted"
        );

        Ok(Self {
            feature_names,
            params,
            booster,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn width(&self) -> usize {
        self.feature_names.len()
    }

    pub fn params(&self) -> BoostingParams {
        self.params
    }

    /// Raw, unclamped score for one scaled feature vector
    pub fn predict_raw(&self, features: &[f64]) -> Result<f64> {
        let scores = self.predict_batch(std::slice::from_ref(&features.to_vec()))?;
        scores
            .into_iter()
            .next()
            .ok_or_else(|| QoeError::ModelInference("No output from model".to_string()))
    }

    /// Raw scores for many scaled feature vectors
    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        if let Some(row) = rows.iter().find(|row| row.len() != self.width()) {
            return Err(QoeError::Transform(format!(
                "Model expects {} features, got {}",
                self.width(),
                row.len()
            )));
        }
        let data: DataVec = rows
            .iter()
            .map(|row| Data::new_test_data(to_values(row), None))
            .collect();
        let predicted = panic::catch_unwind(AssertUnwindSafe(|| self.booster.predict(&data)))
            .map_err(|payload| QoeError::ModelInference(panic_message(payload)))?;
        if predicted.len() != rows.len() {
            return Err(QoeError::ModelInference(format!(
                "Model returned {} values for {} rows",
                predicted.len(),
                rows.len()
            )));
        }
        predicted
            .into_iter()
            .map(|v| {
                let v = v as f64;
                if v.is_finite() {
                    Ok(v)
                } else {
                    Err(QoeError::ModelInference(format!(
                        "Model produced a non-finite score: {v}"
                    )))
                }
            })
            .collect()
    }
}

impl fmt::Debug for QualityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualityModel")
            .field("feature_names", &self.feature_names)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

fn to_values(row: &[f64]) -> Vec<ValueType> {
    row.iter().map(|&v| v as ValueType).collect()
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "model panicked".to_string()
    }
}
