//! Per-column min-max scaling

use crate::error::{QoeError, Result};
use serde::{Deserialize, Serialize};

/// Frozen per-column minimum and maximum, keyed by column name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    columns: Vec<String>,
    data_min: Vec<f64>,
    data_max: Vec<f64>,
}

impl MinMaxScaler {
    /// Learn column ranges from a row-major matrix whose columns are named by `columns`
    pub fn fit(columns: Vec<String>, rows: &[Vec<f64>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(QoeError::TrainingFit(
                "Cannot fit scaler on an empty matrix".to_string(),
            ));
        }
        let width = columns.len();
        let mut data_min = vec![f64::INFINITY; width];
        let mut data_max = vec![f64::NEG_INFINITY; width];
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(QoeError::TrainingFit(format!(
                    "Row {} has {} columns, expected {}",
                    row_idx,
                    row.len(),
                    width
                )));
            }
            for (j, &v) in row.iter().enumerate() {
                if !v.is_finite() {
                    return Err(QoeError::TrainingFit(format!(
                        "Non-finite value in column {} at row {}",
                        columns[j], row_idx
                    )));
                }
                data_min[j] = data_min[j].min(v);
                data_max[j] = data_max[j].max(v);
            }
        }
        Ok(Self {
            columns,
            data_min,
            data_max,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let width = self.columns.len();
        if width == 0 || self.data_min.len() != width || self.data_max.len() != width {
            return Err(QoeError::ArtifactMismatch(format!(
                "Scaler has {} columns but {} minimums and {} maximums",
                width,
                self.data_min.len(),
                self.data_max.len()
            )));
        }
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Scale one row. Out-of-range values extrapolate past [0, 1].
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.width() {
            return Err(QoeError::Transform(format!(
                "Scaler expects {} columns, got {}",
                self.width(),
                row.len()
            )));
        }
        Ok(row
            .iter()
            .enumerate()
            .map(|(j, &v)| (v - self.data_min[j]) / self.range(j))
            .collect())
    }

    /// Constant columns use a range of 1
    fn range(&self, j: usize) -> f64 {
        let range = self.data_max[j] - self.data_min[j];
        if range == 0.0 {
            1.0
        } else {
            range
        }
    }
}
