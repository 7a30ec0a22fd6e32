//! Hyperparameter grid search with k-fold cross-validation

use super::metrics::mean_squared_error;
use crate::error::{QoeError, Result};
use crate::models::BoostingParams;
use crate::observability::StructuredLogger;
use crate::predictor::QualityModel;
use serde::{Deserialize, Serialize};

/// Candidate values for each boosting hyperparameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<u32>,
    pub learning_rate: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![100, 200],
            max_depth: vec![3, 6],
            learning_rate: vec![0.1, 0.05],
        }
    }
}

impl ParamGrid {
    /// Every combination, learning rate varying fastest
    pub fn candidates(&self) -> Vec<BoostingParams> {
        let mut out = Vec::with_capacity(
            self.n_estimators.len() * self.max_depth.len() * self.learning_rate.len(),
        );
        for &n_estimators in &self.n_estimators {
            for &max_depth in &self.max_depth {
                for &learning_rate in &self.learning_rate {
                    out.push(BoostingParams {
                        n_estimators,
                        max_depth,
                        learning_rate,
                    });
                }
            }
        }
        out
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_estimators.is_empty() || self.max_depth.is_empty() || self.learning_rate.is_empty()
        {
            return Err(QoeError::TrainingFit(
                "Every grid dimension needs at least one value".to_string(),
            ));
        }
        if self.n_estimators.contains(&0) || self.max_depth.contains(&0) {
            return Err(QoeError::TrainingFit(
                "n_estimators and max_depth must be positive".to_string(),
            ));
        }
        if self.learning_rate.iter().any(|lr| !(*lr > 0.0 && lr.is_finite())) {
            return Err(QoeError::TrainingFit(
                "learning_rate values must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Cross-validated score of one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvResult {
    pub params: BoostingParams,
    pub fold_mse: Vec<f64>,
    pub mean_mse: f64,
    pub std_mse: f64,
}

/// Outcome of a grid search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSearchResult {
    pub results: Vec<CvResult>,
    pub best_index: usize,
}

impl GridSearchResult {
    pub fn best(&self) -> &CvResult {
        &self.results[self.best_index]
    }
}

/// Contiguous, unshuffled fold boundaries; the first `n % k` folds get one extra row
pub fn kfold_ranges(n: usize, k: usize) -> Vec<std::ops::Range<usize>> {
    let base = n / k;
    let extra = n % k;
    let mut start = 0;
    (0..k)
        .map(|fold| {
            let len = base + usize::from(fold < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

/// Score every grid candidate by mean fold MSE and pick the lowest (first wins ties)
pub fn grid_search(
    feature_names: &[String],
    x: &[Vec<f64>],
    y: &[f64],
    grid: &ParamGrid,
    folds: usize,
    logger: &StructuredLogger,
) -> Result<GridSearchResult> {
    grid.validate()?;
    if folds < 2 {
        return Err(QoeError::TrainingFit(format!(
            "Cross-validation needs at least 2 folds, got {folds}"
        )));
    }
    if x.len() < folds {
        return Err(QoeError::TrainingFit(format!(
            "Cannot split {} rows into {} folds",
            x.len(),
            folds
        )));
    }

    let ranges = kfold_ranges(x.len(), folds);
    let mut results = Vec::new();
    for params in grid.candidates() {
        let mut fold_mse = Vec::with_capacity(folds);
        for range in &ranges {
            let (train_x, train_y, test_x, test_y) = split_fold(x, y, range);
            let model = QualityModel::fit(feature_names.to_vec(), &train_x, &train_y, params)?;
            let predicted = model.predict_batch(&test_x)?;
            fold_mse.push(mean_squared_error(&test_y, &predicted));
        }
        let mean_mse = fold_mse.iter().sum::<f64>() / fold_mse.len() as f64;
        let std_mse = (fold_mse.iter().map(|m| (m - mean_mse).powi(2)).sum::<f64>()
            / fold_mse.len() as f64)
            .sqrt();
        logger.log_candidate(&params, mean_mse, std_mse);
        results.push(CvResult {
            params,
            fold_mse,
            mean_mse,
            std_mse,
        });
    }

    let best_index = results
        .iter()
        .enumerate()
        .fold(0, |best, (idx, r)| {
            if r.mean_mse < results[best].mean_mse {
                idx
            } else {
                best
            }
        });
    Ok(GridSearchResult {
        results,
        best_index,
    })
}

type Fold = (Vec<Vec<f64>>, Vec<f64>, Vec<Vec<f64>>, Vec<f64>);

fn split_fold(x: &[Vec<f64>], y: &[f64], test: &std::ops::Range<usize>) -> Fold {
    let mut train_x = Vec::with_capacity(x.len() - test.len());
    let mut train_y = Vec::with_capacity(x.len() - test.len());
    for i in (0..test.start).chain(test.end..x.len()) {
        train_x.push(x[i].clone());
        train_y.push(y[i]);
    }
    (train_x, train_y, x[test.clone()].to_vec(), y[test.clone()].to_vec())
}
