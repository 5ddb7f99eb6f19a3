//! tamiz-common: Shared types, errors, and configuration used across all Tamiz crates.

pub mod error;
pub mod entities;
pub mod config;

// Re-export commonly used types
pub use entities::{
    ClassProbabilities, Diagnosis, LabelIndexMap, PredictionResult, RawRecord, RawValue,
    Recommendation, RecommendationSource,
};
pub use error::{ArtifactLoadError, ConfigError, PipelineError};
pub use config::Config;
