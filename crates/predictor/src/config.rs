//! Predictor configuration from command-line flags

use crate::Cli;
use qoe_lib::{PredictorConfig, QoeError, Result};
use std::path::PathBuf;

/// Build the explicit predictor settings for this invocation
pub fn predictor_config(cli: &Cli) -> Result<PredictorConfig> {
    let artifact_dir = match &cli.artifacts {
        Some(dir) => dir.clone(),
        None => default_artifact_dir()?,
    };
    Ok(PredictorConfig::new(artifact_dir).verbose(cli.verbose))
}

/// Directory containing the running executable
fn default_artifact_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(|source| QoeError::Io {
        path: PathBuf::from("<current executable>"),
        source,
    })?;
    Ok(exe
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".")))
}
