//! Versioned artifact bundle persistence
//!
//! A bundle is three colocated JSON files (encoder, scaler, model) produced
//! by one training run. Each file wraps its payload in a header carrying the
//! payload's SHA256 checksum and the bundle id, which is derived from all
//! three checksums. Loading verifies every file and the cross-file layout
//! before anything is handed to the predictor, so a bundle assembled from
//! different runs is rejected instead of silently mispredicting.

use crate::error::{QoeError, Result};
use crate::features::{CategoryEncoder, FeaturePipeline, MinMaxScaler};
use crate::predictor::QualityModel;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Current on-disk format version
pub const FORMAT_VERSION: u32 = 1;

pub const ENCODER_FILE: &str = "encoder.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "model.json";

/// Length of the hex bundle id
const BUNDLE_ID_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Encoder,
    Scaler,
    Model,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Encoder,
        ArtifactKind::Scaler,
        ArtifactKind::Model,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::Encoder => ENCODER_FILE,
            ArtifactKind::Scaler => SCALER_FILE,
            ArtifactKind::Model => MODEL_FILE,
        }
    }
}

/// Metadata stored in front of every artifact payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    pub format_version: u32,
    pub kind: ArtifactKind,
    pub bundle_id: String,
    pub created_at: DateTime<Utc>,
    /// Hex SHA256 of the payload's JSON bytes
    pub checksum: String,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    header: ArtifactHeader,
    payload: Box<RawValue>,
}

/// Serialized payload with its checksum
struct Payload {
    kind: ArtifactKind,
    json: String,
    checksum: String,
}

impl Payload {
    fn encode<T: Serialize>(kind: ArtifactKind, value: &T) -> Result<Self> {
        let json = serde_json::to_string(value)?;
        let checksum = compute_checksum(json.as_bytes());
        Ok(Self {
            kind,
            json,
            checksum,
        })
    }
}

/// Encoder, scaler and model from a single training run
#[derive(Debug)]
pub struct ArtifactBundle {
    pipeline: FeaturePipeline,
    model: QualityModel,
    bundle_id: String,
    created_at: DateTime<Utc>,
}

impl ArtifactBundle {
    /// Assemble a bundle from freshly fitted components
    pub fn new(pipeline: FeaturePipeline, model: QualityModel) -> Result<Self> {
        check_model_layout(&pipeline, &model)?;
        let payloads = encode_payloads(&pipeline, &model)?;
        let bundle_id = derive_bundle_id(&payloads);
        Ok(Self {
            pipeline,
            model,
            bundle_id,
            created_at: Utc::now(),
        })
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    pub fn model(&self) -> &QualityModel {
        &self.model
    }

    pub fn bundle_id(&self) -> &str {
        &self.bundle_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Paths of the three artifact files inside `dir`
    pub fn artifact_paths(dir: &Path) -> [PathBuf; 3] {
        ArtifactKind::ALL.map(|kind| dir.join(kind.file_name()))
    }

    /// Write all three artifacts, replacing any previous bundle in `dir`
    pub fn save(&self, dir: &Path) -> Result<[PathBuf; 3]> {
        fs::create_dir_all(dir).map_err(|e| QoeError::io(dir, e))?;

        let payloads = encode_payloads(&self.pipeline, &self.model)?;
        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(payloads.len());
        for payload in &payloads {
            let path = dir.join(payload.kind.file_name());
            let temp_path = path.with_extension("json.tmp");
            if let Err(e) = self.write_envelope(&temp_path, payload) {
                discard(&staged);
                discard_file(&temp_path);
                return Err(e);
            }
            staged.push((temp_path, path));
        }

        // Rename only once every component is safely on disk
        for (i, (temp_path, path)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(temp_path, path) {
                discard(&staged[i..]);
                return Err(QoeError::io(path, e));
            }
        }

        info!(
            bundle_id = %self.bundle_id,
            dir = %dir.display(),
            "Artifact bundle saved"
        );
        Ok(Self::artifact_paths(dir))
    }

    fn write_envelope(&self, temp_path: &Path, payload: &Payload) -> Result<()> {
        let envelope = Envelope {
            header: ArtifactHeader {
                format_version: FORMAT_VERSION,
                kind: payload.kind,
                bundle_id: self.bundle_id.clone(),
                created_at: self.created_at,
                checksum: payload.checksum.clone(),
            },
            payload: RawValue::from_string(payload.json.clone())?,
        };
        let bytes = serde_json::to_vec(&envelope)?;

        let mut file = File::create(temp_path).map_err(|e| QoeError::io(temp_path, e))?;
        file.write_all(&bytes)
            .map_err(|e| QoeError::io(temp_path, e))?;
        file.sync_all().map_err(|e| QoeError::io(temp_path, e))?;
        Ok(())
    }

    /// Load and verify a complete bundle. Fails without partial results.
    pub fn load(dir: &Path) -> Result<Self> {
        let paths = Self::artifact_paths(dir);
        if let Some(missing) = paths.iter().find(|p| !p.exists()) {
            return Err(QoeError::MissingArtifact {
                path: missing.clone(),
            });
        }

        let (encoder_header, encoder): (_, CategoryEncoder) =
            read_artifact(&paths[0], ArtifactKind::Encoder)?;
        let (scaler_header, scaler): (_, MinMaxScaler) =
            read_artifact(&paths[1], ArtifactKind::Scaler)?;
        let (model_header, model): (_, QualityModel) =
            read_artifact(&paths[2], ArtifactKind::Model)?;

        let expected_id = bundle_id_from_checksums([
            encoder_header.checksum.as_str(),
            scaler_header.checksum.as_str(),
            model_header.checksum.as_str(),
        ]);
        for header in [&encoder_header, &scaler_header, &model_header] {
            if header.bundle_id != expected_id {
                return Err(QoeError::ArtifactMismatch(format!(
                    "{} belongs to bundle {}, expected {}; re-run training to produce a complete bundle",
                    header.kind.file_name(),
                    header.bundle_id,
                    expected_id
                )));
            }
        }

        let pipeline = FeaturePipeline::from_parts(encoder, scaler)?;
        check_model_layout(&pipeline, &model)?;

        debug!(
            bundle_id = %expected_id,
            columns = pipeline.width(),
            categories = ?pipeline.encoder().categories(),
            "Artifact bundle verified"
        );

        Ok(Self {
            pipeline,
            model,
            bundle_id: expected_id,
            created_at: encoder_header.created_at,
        })
    }
}

fn encode_payloads(pipeline: &FeaturePipeline, model: &QualityModel) -> Result<[Payload; 3]> {
    Ok([
        Payload::encode(ArtifactKind::Encoder, pipeline.encoder())?,
        Payload::encode(ArtifactKind::Scaler, pipeline.scaler())?,
        Payload::encode(ArtifactKind::Model, model)?,
    ])
}

fn check_model_layout(pipeline: &FeaturePipeline, model: &QualityModel) -> Result<()> {
    let columns = pipeline.columns();
    if model.feature_names() != columns.as_slice() {
        return Err(QoeError::ArtifactMismatch(format!(
            "Model was fitted on columns {:?} but the pipeline produces {:?}",
            model.feature_names(),
            columns
        )));
    }
    Ok(())
}

fn read_artifact<T: DeserializeOwned>(
    path: &Path,
    kind: ArtifactKind,
) -> Result<(ArtifactHeader, T)> {
    let bytes = fs::read(path).map_err(|e| QoeError::io(path, e))?;
    let envelope: Envelope = serde_json::from_slice(&bytes).map_err(|e| {
        QoeError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    let header = envelope.header;

    if header.kind != kind {
        return Err(QoeError::ArtifactMismatch(format!(
            "{} contains a {:?} artifact, expected {:?}",
            path.display(),
            header.kind,
            kind
        )));
    }
    if header.format_version != FORMAT_VERSION {
        return Err(QoeError::ArtifactMismatch(format!(
            "{} has format version {}, expected {}",
            path.display(),
            header.format_version,
            FORMAT_VERSION
        )));
    }
    let computed = compute_checksum(envelope.payload.get().as_bytes());
    if computed != header.checksum {
        return Err(QoeError::ArtifactMismatch(format!(
            "Checksum mismatch in {}: expected {}, got {}",
            path.display(),
            header.checksum,
            computed
        )));
    }

    let value = serde_json::from_str(envelope.payload.get()).map_err(|e| {
        QoeError::Serialization(format!("Invalid payload in {}: {}", path.display(), e))
    })?;
    Ok((header, value))
}

fn derive_bundle_id(payloads: &[Payload; 3]) -> String {
    bundle_id_from_checksums([
        payloads[0].checksum.as_str(),
        payloads[1].checksum.as_str(),
        payloads[2].checksum.as_str(),
    ])
}

fn bundle_id_from_checksums(checksums: [&str; 3]) -> String {
    let mut hasher = Sha256::new();
    for checksum in checksums {
        hasher.update(checksum.as_bytes());
    }
    let mut id = hex::encode(hasher.finalize());
    id.truncate(BUNDLE_ID_LEN);
    id
}

fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (temp_path, _) in staged {
        discard_file(temp_path);
    }
}

fn discard_file(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove temp artifact");
        }
    }
}
