//! Labeled dataset IO
//!
//! Datasets are CSV files with the header
//! `bandwidth,latency,packet_loss,resolution,bitrate,quality_score`.
//! Empty cells and NA tokens (`NA`, `NaN`, `null`, ...) are forward-filled
//! from the previous row.

use crate::error::{QoeError, Result};
use crate::models::{FeatureRecord, Sample};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cell values read as missing, in addition to empty cells
const MISSING_TOKENS: [&str; 19] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "",
];

/// Raw CSV row; every cell may be empty
#[derive(Debug, Default, Deserialize)]
struct CsvRow {
    bandwidth: Option<String>,
    latency: Option<String>,
    packet_loss: Option<String>,
    resolution: Option<String>,
    bitrate: Option<String>,
    quality_score: Option<String>,
}

#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    bandwidth: f64,
    latency: f64,
    packet_loss: f64,
    resolution: &'a str,
    bitrate: f64,
    quality_score: f64,
}

/// Load a labeled dataset from CSV
pub fn load_csv(path: &Path) -> Result<Vec<Sample>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        QoeError::DatasetLoad(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let mut samples: Vec<Sample> = Vec::new();
    for (idx, result) in reader.deserialize::<CsvRow>().enumerate() {
        // header is line 1
        let line = idx + 2;
        let row = result.map_err(|e| {
            QoeError::DatasetLoad(format!("{} line {}: {}", path.display(), line, e))
        })?;
        let sample = forward_fill(row, samples.last()).map_err(|message| {
            QoeError::DatasetLoad(format!("{} line {}: {}", path.display(), line, message))
        })?;
        samples.push(sample);
    }

    if samples.is_empty() {
        return Err(QoeError::DatasetLoad(format!(
            "{} contains no rows",
            path.display()
        )));
    }
    Ok(samples)
}

/// Fill missing cells from the previous sample
fn forward_fill(row: CsvRow, previous: Option<&Sample>) -> std::result::Result<Sample, String> {
    let resolution = match present(row.resolution) {
        Some(value) => value,
        None => previous
            .map(|p| p.record.resolution.clone())
            .ok_or_else(|| unfillable("resolution"))?,
    };
    let record = FeatureRecord {
        bandwidth: fill(row.bandwidth, previous.map(|p| p.record.bandwidth), "bandwidth")?,
        latency: fill(row.latency, previous.map(|p| p.record.latency), "latency")?,
        packet_loss: fill(
            row.packet_loss,
            previous.map(|p| p.record.packet_loss),
            "packet_loss",
        )?,
        resolution,
        bitrate: fill(row.bitrate, previous.map(|p| p.record.bitrate), "bitrate")?,
    };
    let quality_score = fill(
        row.quality_score,
        previous.map(|p| p.quality_score),
        "quality_score",
    )?;
    Ok(Sample {
        record,
        quality_score,
    })
}

/// Trimmed cell text, or `None` for empty cells and missing-value tokens
fn present(cell: Option<String>) -> Option<String> {
    cell.map(|c| c.trim().to_string())
        .filter(|c| !MISSING_TOKENS.contains(&c.as_str()))
}

fn fill(
    cell: Option<String>,
    previous: Option<f64>,
    column: &'static str,
) -> std::result::Result<f64, String> {
    let Some(text) = present(cell) else {
        return previous.ok_or_else(|| unfillable(column));
    };
    let value: f64 = text
        .parse()
        .map_err(|_| format!("{column} value {text:?} is not a number"))?;
    if !value.is_finite() {
        return Err(format!("{column} value {text:?} is not finite"));
    }
    Ok(value)
}

fn unfillable(column: &str) -> String {
    format!("missing {column} with no earlier value to carry forward")
}

/// Write a labeled dataset as CSV
pub fn write_csv(path: &Path, samples: &[Sample]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| QoeError::io(parent, e))?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        QoeError::DatasetLoad(format!("Failed to create {}: {}", path.display(), e))
    })?;
    for sample in samples {
        writer
            .serialize(CsvRecord {
                bandwidth: sample.record.bandwidth,
                latency: sample.record.latency,
                packet_loss: sample.record.packet_loss,
                resolution: &sample.record.resolution,
                bitrate: sample.record.bitrate,
                quality_score: sample.quality_score,
            })
            .map_err(|e| QoeError::DatasetLoad(format!("Failed to write row: {e}")))?;
    }
    writer.flush().map_err(|e| QoeError::io(path, e))?;
    Ok(())
}

/// Seeded shuffle split into (train, test)
pub fn train_test_split(
    samples: &[Sample],
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<Sample>, Vec<Sample>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(QoeError::TrainingFit(format!(
            "Test fraction must be in (0, 1), got {test_fraction}"
        )));
    }
    let n_test = (samples.len() as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= samples.len() {
        return Err(QoeError::TrainingFit(format!(
            "Cannot split {} samples with test fraction {}",
            samples.len(),
            test_fraction
        )));
    }

    let mut indices: Vec<usize> = (0..samples.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices[..n_test].iter().map(|&i| samples[i].clone()).collect();
    let train = indices[n_test..].iter().map(|&i| samples[i].clone()).collect();
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "bandwidth,latency,packet_loss,resolution,bitrate,quality_score\n";

    #[test]
    fn test_load_simple_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(
            &path,
            format!("{HEADER}50,100,1,1080p,5000,3.5\n10,300,4,480p,800,1.9\n"),
        )
        .unwrap();

        let samples = load_csv(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(
            samples[0].record,
            FeatureRecord::new(50.0, 100.0, 1.0, "1080p", 5000.0)
        );
        assert_eq!(samples[1].quality_score, 1.9);
    }

    #[test]
    fn test_missing_cells_forward_filled() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(
            &path,
            format!("{HEADER}50,100,1,1080p,5000,3.5\n,200,,,6000,\n"),
        )
        .unwrap();

        let samples = load_csv(&path).unwrap();
        assert_eq!(
            samples[1].record,
            FeatureRecord::new(50.0, 200.0, 1.0, "1080p", 6000.0)
        );
        assert_eq!(samples[1].quality_score, 3.5);
    }

    #[test]
    fn test_leading_missing_cell_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, format!("{HEADER},100,1,1080p,5000,3.5\n")).unwrap();

        let err = load_csv(&path).unwrap_err();
        assert!(matches!(err, QoeError::DatasetLoad(_)));
        assert!(err.to_string().contains("bandwidth"));
    }

    #[test]
    fn test_missing_value_tokens_forward_filled() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(
            &path,
            format!("{HEADER}50,100,1,1080p,5000,3.5\nNA,200,nan,N/A,6000,NaN\n"),
        )
        .unwrap();

        let samples = load_csv(&path).unwrap();
        assert_eq!(
            samples[1].record,
            FeatureRecord::new(50.0, 200.0, 1.0, "1080p", 6000.0)
        );
        assert_eq!(samples[1].quality_score, 3.5);
    }

    #[test]
    fn test_leading_nan_label_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, format!("{HEADER}50,100,1,1080p,5000,NaN\n")).unwrap();

        let err = load_csv(&path).unwrap_err();
        assert!(matches!(err, QoeError::DatasetLoad(_)));
        assert!(err.to_string().contains("quality_score"));
    }

    #[test]
    fn test_infinite_label_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, format!("{HEADER}50,100,1,1080p,5000,inf\n")).unwrap();
        assert!(matches!(load_csv(&path), Err(QoeError::DatasetLoad(_))));
    }

    #[test]
    fn test_unparseable_cell_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, format!("{HEADER}fast,100,1,1080p,5000,3.5\n")).unwrap();
        assert!(matches!(load_csv(&path), Err(QoeError::DatasetLoad(_))));
    }

    #[test]
    fn test_empty_and_absent_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, HEADER).unwrap();
        assert!(matches!(load_csv(&path), Err(QoeError::DatasetLoad(_))));
        assert!(matches!(
            load_csv(&dir.path().join("absent.csv")),
            Err(QoeError::DatasetLoad(_))
        ));
    }

    #[test]
    fn test_write_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("data.csv");
        let samples = vec![Sample {
            record: FeatureRecord::new(12.5, 40.0, 0.25, "4K", 9000.0),
            quality_score: 4.2,
        }];
        write_csv(&path, &samples).unwrap();
        assert_eq!(load_csv(&path).unwrap(), samples);
    }

    #[test]
    fn test_split_sizes_and_determinism() {
        let samples: Vec<Sample> = (0..10)
            .map(|i| Sample {
                record: FeatureRecord::new(i as f64, 1.0, 1.0, "720p", 1.0),
                quality_score: 1.0,
            })
            .collect();
        let (train, test) = train_test_split(&samples, 0.2, 42).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);

        let (train_again, _) = train_test_split(&samples, 0.2, 42).unwrap();
        assert_eq!(train, train_again);

        assert!(train_test_split(&samples, 0.0, 42).is_err());
        assert!(train_test_split(&samples, 1.0, 42).is_err());
    }
}
