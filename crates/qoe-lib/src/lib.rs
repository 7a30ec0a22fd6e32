//! Library for video streaming quality prediction
//!
//! This crate provides the core functionality for:
//! - Encoding raw streaming measurements into the model's feature layout
//! - Gradient-boosted quality score inference
//! - Versioned artifact bundle persistence
//! - Dataset loading, synthesis and model training
//! - Structured logging

pub mod bundle;
pub mod dataset;
pub mod error;
pub mod features;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod synthetic;
pub mod training;

pub use bundle::{ArtifactBundle, ENCODER_FILE, MODEL_FILE, SCALER_FILE};
pub use error::{QoeError, Result};
pub use features::{CategoryEncoder, FeaturePipeline, MinMaxScaler};
pub use models::*;
pub use observability::{init_tracing, LogSettings, StructuredLogger};
pub use predictor::{BundlePredictor, PredictorConfig, QualityModel, ScorePredictor};
pub use training::{DataSource, ParamGrid, Trainer, TrainingConfig, TrainingReport};
