//! Deterministic synthetic training data
//!
//! Used when no dataset file exists. The same seed and size always produce
//! the same samples, so a bundle trained on synthetic data is reproducible.

use crate::models::{FeatureRecord, Sample, MAX_SCORE, MIN_SCORE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_SAMPLES: usize = 1000;

/// Resolution labels drawn uniformly
pub const RESOLUTIONS: [&str; 5] = ["480p", "720p", "1080p", "1440p", "4K"];

/// Standard deviation of the label noise
const NOISE_STD: f64 = 0.2;

/// Quality tier contributed by a resolution label
pub fn resolution_tier(resolution: &str) -> f64 {
    match resolution {
        "4K" => 1.0,
        "1440p" => 0.8,
        "1080p" => 0.6,
        "720p" => 0.4,
        _ => 0.2,
    }
}

/// Unnormalized quality before rescaling into the score domain
pub fn raw_quality(record: &FeatureRecord) -> f64 {
    5.0 * (record.bandwidth / 100.0) + 3.0 * resolution_tier(&record.resolution)
        + 2.0 * (record.bitrate / 15000.0)
        - 4.0 * (record.latency / 500.0)
        - 3.0 * (record.packet_loss / 10.0)
}

/// Generate `n_samples` labeled rows from `seed`
pub fn generate(n_samples: usize, seed: u64) -> Vec<Sample> {
    let mut rng = StdRng::seed_from_u64(seed);

    // Feature columns are drawn one after another
    let bandwidth: Vec<f64> = (0..n_samples).map(|_| rng.random_range(1.0..100.0)).collect();
    let latency: Vec<f64> = (0..n_samples).map(|_| rng.random_range(5.0..500.0)).collect();
    let packet_loss: Vec<f64> = (0..n_samples).map(|_| rng.random_range(0.0..10.0)).collect();
    let resolution: Vec<&str> = (0..n_samples)
        .map(|_| RESOLUTIONS[rng.random_range(0..RESOLUTIONS.len())])
        .collect();
    let bitrate: Vec<f64> = (0..n_samples)
        .map(|_| rng.random_range(500.0..15000.0))
        .collect();

    let records: Vec<FeatureRecord> = (0..n_samples)
        .map(|i| {
            FeatureRecord::new(
                bandwidth[i],
                latency[i],
                packet_loss[i],
                resolution[i],
                bitrate[i],
            )
        })
        .collect();

    let raw: Vec<f64> = records.iter().map(raw_quality).collect();
    let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max > min { max - min } else { 1.0 };

    records
        .into_iter()
        .zip(raw)
        .map(|(record, q)| {
            let normalized = MIN_SCORE + (MAX_SCORE - MIN_SCORE) * (q - min) / span;
            let noisy = normalized + NOISE_STD * standard_normal(&mut rng);
            Sample {
                record,
                quality_score: noisy.clamp(MIN_SCORE, MAX_SCORE),
            }
        })
        .collect()
}

/// Sample standard normal using Box-Muller transform
fn standard_normal(rng: &mut impl Rng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(1e-10);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_data() {
        assert_eq!(generate(200, DEFAULT_SEED), generate(200, DEFAULT_SEED));
        assert_ne!(generate(200, DEFAULT_SEED), generate(200, 7));
    }

    #[test]
    fn test_feature_ranges() {
        for sample in generate(500, DEFAULT_SEED) {
            let r = &sample.record;
            assert!((1.0..100.0).contains(&r.bandwidth));
            assert!((5.0..500.0).contains(&r.latency));
            assert!((0.0..10.0).contains(&r.packet_loss));
            assert!((500.0..15000.0).contains(&r.bitrate));
            assert!(RESOLUTIONS.contains(&r.resolution.as_str()));
            assert!((MIN_SCORE..=MAX_SCORE).contains(&sample.quality_score));
        }
    }

    #[test]
    fn test_all_resolutions_drawn() {
        let samples = generate(DEFAULT_SAMPLES, DEFAULT_SEED);
        for res in RESOLUTIONS {
            assert!(samples.iter().any(|s| s.record.resolution == res));
        }
    }

    #[test]
    fn test_target_formula_direction() {
        let good = FeatureRecord::new(100.0, 5.0, 0.0, "4K", 15000.0);
        let bad = FeatureRecord::new(1.0, 500.0, 10.0, "480p", 500.0);
        assert!(raw_quality(&good) > raw_quality(&bad));
        assert_eq!(resolution_tier("8K"), 0.2);
        assert_eq!(resolution_tier("1440p"), 0.8);
    }
}
