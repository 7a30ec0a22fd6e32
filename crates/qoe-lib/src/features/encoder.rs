//! One-hot encoding of the resolution token

use crate::error::{QoeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Prefix of one-hot column names
pub const CATEGORY_PREFIX: &str = "res_";

/// Frozen mapping from resolution tokens to one-hot positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    /// Sorted, de-duplicated categories seen at fit time
    categories: Vec<String>,
}

impl CategoryEncoder {
    /// Learn the category set from training values
    pub fn fit<'a, I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let categories: BTreeSet<&str> = values.into_iter().collect();
        if categories.is_empty() {
            return Err(QoeError::TrainingFit(
                "Cannot fit encoder on an empty column".to_string(),
            ));
        }
        Ok(Self {
            categories: categories.into_iter().map(str::to_string).collect(),
        })
    }

    /// Rebuild from a stored category list, which must already be sorted and unique
    pub fn from_categories(categories: Vec<String>) -> Result<Self> {
        let encoder = Self { categories };
        encoder.validate()?;
        Ok(encoder)
    }

    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(QoeError::ArtifactMismatch(
                "Encoder has no categories".to_string(),
            ));
        }
        if self.categories.windows(2).any(|w| w[0] >= w[1]) {
            return Err(QoeError::ArtifactMismatch(
                "Encoder categories must be sorted and unique".to_string(),
            ));
        }
        Ok(())
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Position of a category, if it was seen at fit time
    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    /// One-hot vector for a value. Unknown values encode as all zeros.
    pub fn encode(&self, value: &str) -> Vec<f64> {
        let mut encoded = vec![0.0; self.categories.len()];
        if let Some(idx) = self.index_of(value) {
            encoded[idx] = 1.0;
        }
        encoded
    }

    /// Column names in one-hot order
    pub fn column_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{CATEGORY_PREFIX}{c}"))
            .collect()
    }
}
