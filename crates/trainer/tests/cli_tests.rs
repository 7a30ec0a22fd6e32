//! Trainer CLI integration tests

use qoe_lib::{ArtifactBundle, BundlePredictor, PredictorConfig};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run the trainer in `dir` with a small grid
fn train(dir: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_qoe-train"))
        .current_dir(dir)
        .args([
            "--samples",
            "150",
            "--cv-folds",
            "3",
            "--n-estimators",
            "20,40",
            "--max-depth",
            "3",
            "--learning-rate",
            "0.1",
            "-o",
            "bundle",
        ])
        .args(extra)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_trains_bundle_from_synthetic_data() {
    let dir = TempDir::new().unwrap();
    let output = train(dir.path(), &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    assert!(stdout.contains("Synthesized 150 samples"));
    assert!(stdout.contains("RMSE"));
    assert!(dir.path().join("video_streaming_data.csv").exists());

    let bundle = ArtifactBundle::load(&dir.path().join("bundle")).unwrap();
    assert!(stdout.contains(bundle.bundle_id()));

    let predictor = BundlePredictor::load(PredictorConfig::new(dir.path().join("bundle"))).unwrap();
    let score = predictor
        .predict_values(50.0, 100.0, 1.0, "1080p", 5000.0)
        .unwrap();
    assert!((1.0..=5.0).contains(&score));
}

#[test]
fn test_json_report_and_saved_dataset_reuse() {
    let dir = TempDir::new().unwrap();
    assert!(train(dir.path(), &[]).status.success());

    let output = train(dir.path(), &["--format", "json"]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(report["source"]["file"].is_string());
    assert_eq!(report["samples"], 150);
    assert_eq!(report["cv_results"].as_array().unwrap().len(), 2);
    assert_eq!(report["bundle_id"].as_str().unwrap().len(), 16);
}

#[test]
fn test_config_file_and_env_layers() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("qoe-train.toml"),
        "save_synthetic = false\nseed = 3\n",
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_qoe-train"))
        .current_dir(dir.path())
        .args(["--cv-folds", "3", "--n-estimators", "20", "--max-depth", "3"])
        .args(["--learning-rate", "0.1", "--format", "json"])
        .env("QOE_TRAIN__SYNTHETIC_SAMPLES", "120")
        .env("QOE_TRAIN__ARTIFACT_DIR", "from-env")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["samples"], 120);
    assert_eq!(report["source"]["synthetic"]["seed"], 3);
    assert!(report["source"]["synthetic"]["saved_to"].is_null());
    assert!(!dir.path().join("video_streaming_data.csv").exists());
    assert!(ArtifactBundle::load(&dir.path().join("from-env")).is_ok());
}

#[test]
fn test_invalid_configuration_fails() {
    let dir = TempDir::new().unwrap();
    let output = train(dir.path(), &["--test-fraction", "1.5"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("test_fraction"));
    assert!(!dir.path().join("bundle").exists());
}

#[test]
fn test_unreadable_dataset_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("video_streaming_data.csv"),
        "bandwidth,latency,packet_loss,resolution,bitrate,quality_score\nnope,1,1,4K,1,1\n",
    )
    .unwrap();

    let output = train(dir.path(), &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Training failed"));
    assert!(!dir.path().join("bundle").exists());
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_qoe-train"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("--n-estimators"));
    assert!(stdout.contains("--config"));
}
