use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

/// Message returned to callers for every failure that is not a validation error.
pub const OPAQUE_INFERENCE_FAILURE: &str = "Internal inference error";

/// Errors raised while turning a raw record into a prediction.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Missing required columns: {}", join_names(missing))]
    MissingColumns { missing: BTreeSet<String> },

    /// The imputer's fitted column set disagrees with the feature-engineering output.
    #[error("Feature columns do not match the fitted imputer: {0}")]
    ColumnMismatch(String),

    #[error("Classifier invocation failed: {0}")]
    ClassifierInvocation(String),

    #[error("Classifier returned a malformed prediction: {0}")]
    MalformedPrediction(String),
}

impl PipelineError {
    /// Only caller-supplied data problems are reported verbatim.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, PipelineError::MissingColumns { .. })
    }

    /// Text safe to hand back to the calling layer.
    pub fn public_message(&self) -> String {
        if self.is_user_facing() {
            self.to_string()
        } else {
            OPAQUE_INFERENCE_FAILURE.to_string()
        }
    }
}

fn join_names(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Fatal start-up failure: the service must not serve requests.
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("Failed to read artifact {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse artifact {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact '{artifact}': {reason}")]
    Invalid { artifact: &'static str, reason: String },
}

impl ArtifactLoadError {
    pub fn invalid(artifact: &'static str, reason: impl Into<String>) -> Self {
        ArtifactLoadError::Invalid { artifact, reason: reason.into() }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid config value [{section}] {key}: {reason}")]
    Invalid { section: &'static str, key: &'static str, reason: String },
}
