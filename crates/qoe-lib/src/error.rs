//! Error taxonomy shared by the trainer and the predictor

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QoeError>;

#[derive(Debug, Error)]
pub enum QoeError {
    #[error("File not found: {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("Expected {expected} arguments, got {got}")]
    ArgumentCount { expected: usize, got: usize },

    #[error("Could not parse {field} from {value:?}")]
    ArgumentParse { field: &'static str, value: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Transform(String),

    #[error("{0}")]
    ArtifactMismatch(String),

    #[error("{0}")]
    ModelInference(String),

    #[error("{0}")]
    DatasetLoad(String),

    #[error("{0}")]
    TrainingFit(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Serialization(String),
}

impl QoeError {
    /// Stable class name used as the prefix of one-line diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            QoeError::MissingArtifact { .. } => "MissingArtifact",
            QoeError::ArgumentCount { .. } => "ArgumentCountError",
            QoeError::ArgumentParse { .. } => "ArgumentParseError",
            QoeError::Validation(_) => "ValidationError",
            QoeError::Transform(_) => "TransformError",
            QoeError::ArtifactMismatch(_) => "ArtifactMismatch",
            QoeError::ModelInference(_) => "ModelInferenceError",
            QoeError::DatasetLoad(_) => "DatasetLoadError",
            QoeError::TrainingFit(_) => "TrainingFitError",
            QoeError::Io { .. } => "IoError",
            QoeError::Serialization(_) => "SerializationError",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        QoeError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for QoeError {
    fn from(err: serde_json::Error) -> Self {
        QoeError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let err = QoeError::MissingArtifact {
            path: PathBuf::from("/tmp/model.json"),
        };
        assert_eq!(err.kind(), "MissingArtifact");
        assert!(err.to_string().contains("model.json"));

        let err = QoeError::ArgumentCount { expected: 5, got: 3 };
        assert_eq!(err.kind(), "ArgumentCountError");
        assert_eq!(err.to_string(), "Expected 5 arguments, got 3");
    }

    #[test]
    fn test_parse_error_message() {
        let err = QoeError::ArgumentParse {
            field: "latency",
            value: "fast".to_string(),
        };
        assert_eq!(err.to_string(), "Could not parse latency from \"fast\"");
    }
}
