//! Prediction output formatting and post-processing
//!
//! Handles conversion of raw model outputs to a [`QualityScore`] bounded to
//! the score domain.

use crate::models::{QualityLabel, QualityScore, MAX_SCORE, MIN_SCORE};

/// Decimal places kept in the reported score
pub const SCORE_DECIMALS: i32 = 2;

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub min_score: f64,
    pub max_score: f64,
    pub decimals: i32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            min_score: MIN_SCORE,
            max_score: MAX_SCORE,
            decimals: SCORE_DECIMALS,
        }
    }
}

/// Formats raw model outputs into a QualityScore
pub struct OutputFormatter {
    config: OutputConfig,
}

impl OutputFormatter {
    pub fn new() -> Self {
        Self {
            config: OutputConfig::default(),
        }
    }

    /// Clamp, round and label a raw model output
    pub fn format(&self, raw: f64, bundle_id: &str) -> QualityScore {
        let score = self.round(self.clamp(raw));
        QualityScore {
            score,
            quality: QualityLabel::from_score(score),
            raw,
            bundle_id: bundle_id.to_string(),
        }
    }

    /// Hard clamp into the score domain
    pub fn clamp(&self, raw: f64) -> f64 {
        raw.clamp(self.config.min_score, self.config.max_score)
    }

    /// Round half away from zero
    pub fn round(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.config.decimals);
        (value * factor).round() / factor
    }

    /// Text written to stdout for a score
    pub fn render_plain(&self, score: &QualityScore) -> String {
        format!("{:.*}", self.config.decimals.max(0) as usize, score.score)
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_to_domain() {
        let formatter = OutputFormatter::new();
        assert_eq!(formatter.format(7.3, "b").score, 5.0);
        assert_eq!(formatter.format(-12.0, "b").score, 1.0);
        assert_eq!(formatter.format(f64::MAX, "b").score, 5.0);
        assert_eq!(formatter.format(f64::MIN, "b").score, 1.0);
    }

    #[test]
    fn test_rounded_to_two_decimals() {
        let formatter = OutputFormatter::new();
        let score = formatter.format(3.14159, "b");
        assert_eq!(score.score, 3.14);
        assert_eq!(score.raw, 3.14159);
        assert_eq!(formatter.format(2.005001, "b").score, 2.01);
    }

    #[test]
    fn test_label_follows_clamped_score() {
        let formatter = OutputFormatter::new();
        assert_eq!(formatter.format(9.0, "b").quality, QualityLabel::Excellent);
        assert_eq!(formatter.format(0.0, "b").quality, QualityLabel::Bad);
        assert_eq!(formatter.format(3.6, "b").quality, QualityLabel::Good);
    }

    #[test]
    fn test_plain_rendering() {
        let formatter = OutputFormatter::new();
        assert_eq!(formatter.render_plain(&formatter.format(3.5, "b")), "3.50");
        assert_eq!(formatter.render_plain(&formatter.format(10.0, "b")), "5.00");
        assert_eq!(formatter.render_plain(&formatter.format(1.234, "b")), "1.23");
    }
}
