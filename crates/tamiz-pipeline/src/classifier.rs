//! Classifier trait, the shipped logistic-regression model, and the adapter
//! that turns a model call into a validated raw prediction.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tamiz_common::{ArtifactLoadError, PipelineError};
use thiserror::Error;

use crate::features::SelectedFeatureVector;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("expected {expected} features, got {found}")]
    FeatureCount { expected: usize, found: usize },
    #[error("model evaluation failed: {0}")]
    Evaluation(String),
}

// ── Output ────────────────────────────────────────────────────────────────────

/// Raw label plus the probability vector in the model's internal class order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    pub label: u8,
    pub probabilities: Vec<f64>,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

/// An opaque, pre-trained binary classifier. Must be side-effect free.
pub trait Classifier: Send + Sync + fmt::Debug {
    fn kind(&self) -> &str;

    /// Internal class ordering; `probabilities[i]` belongs to `classes()[i]`.
    fn classes(&self) -> &[u8];

    fn n_features(&self) -> usize;

    /// Feature names the model was fitted on, when the artifact records them.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    fn predict(&self, features: &[f64]) -> Result<RawPrediction, ClassifierError>;
}

// ── Logistic regression ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Binary logistic regression, optionally preceded by standardisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// `classes[1]` is the positive class of the decision function.
    #[serde(default = "default_classes")]
    pub classes: [u8; 2],
}

fn default_classes() -> [u8; 2] { [0, 1] }

impl LogisticRegression {
    pub fn validate(&self) -> Result<(), ArtifactLoadError> {
        let n = self.feature_names.len();
        if n == 0 || self.coefficients.len() != n {
            return Err(ArtifactLoadError::invalid(
                "final_model",
                format!("{} coefficients for {} features", self.coefficients.len(), n),
            ));
        }
        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != n || scaler.scale.len() != n {
                return Err(ArtifactLoadError::invalid("final_model", "scaler length mismatch"));
            }
            if scaler.mean.iter().chain(&scaler.scale).any(|v| !v.is_finite()) {
                return Err(ArtifactLoadError::invalid("final_model", "scaler has non-finite values"));
            }
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ArtifactLoadError::invalid("final_model", "non-finite coefficients"));
        }
        if self.classes[0] == self.classes[1] {
            return Err(ArtifactLoadError::invalid("final_model", "classes must be distinct"));
        }
        Ok(())
    }

    fn decision_value(&self, features: &[f64]) -> f64 {
        let mut z = self.intercept;
        for (i, (&x, &w)) in features.iter().zip(&self.coefficients).enumerate() {
            let x = match &self.scaler {
                // Zero-variance columns keep a unit scale.
                Some(s) => (x - s.mean[i]) / if s.scale[i] == 0.0 { 1.0 } else { s.scale[i] },
                None => x,
            };
            z += w * x;
        }
        z
    }
}

fn sigmoid(z: f64) -> f64 {
    let z = z.clamp(-700.0, 700.0);
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for LogisticRegression {
    fn kind(&self) -> &str {
        "logistic_regression"
    }

    fn classes(&self) -> &[u8] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.feature_names)
    }

    fn predict(&self, features: &[f64]) -> Result<RawPrediction, ClassifierError> {
        if features.len() != self.n_features() {
            return Err(ClassifierError::FeatureCount {
                expected: self.n_features(),
                found: features.len(),
            });
        }
        let z = self.decision_value(features);
        // ±inf saturates in the sigmoid.
        if z.is_nan() {
            return Err(ClassifierError::Evaluation("decision value is NaN".to_string()));
        }
        let positive = sigmoid(z);
        let probabilities = vec![1.0 - positive, positive];
        // Ties go to the first class.
        let label = if positive > 0.5 { self.classes[1] } else { self.classes[0] };
        Ok(RawPrediction { label, probabilities })
    }
}

// ── Artifact ──────────────────────────────────────────────────────────────────

/// On-disk classifier artifact, tagged by model kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LogisticRegression(LogisticRegression),
}

impl ModelArtifact {
    pub fn into_classifier(self) -> Result<Arc<dyn Classifier>, ArtifactLoadError> {
        match self {
            ModelArtifact::LogisticRegression(model) => {
                model.validate()?;
                Ok(Arc::new(model))
            }
        }
    }
}

// ── Adapter ───────────────────────────────────────────────────────────────────

const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Invoke the classifier once, no retries, and check its output shape.
pub fn classify(
    classifier: &dyn Classifier,
    selected: &SelectedFeatureVector,
) -> Result<RawPrediction, PipelineError> {
    let raw = classifier
        .predict(selected.values())
        .map_err(|e| PipelineError::ClassifierInvocation(e.to_string()))?;

    let classes = classifier.classes();
    if raw.probabilities.len() != classes.len() {
        return Err(PipelineError::MalformedPrediction(format!(
            "{} probabilities for {} classes",
            raw.probabilities.len(),
            classes.len()
        )));
    }
    if raw.probabilities.iter().any(|p| !p.is_finite() || *p < 0.0 || *p > 1.0) {
        return Err(PipelineError::MalformedPrediction("probability outside [0, 1]".to_string()));
    }
    let total: f64 = raw.probabilities.iter().sum();
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(PipelineError::MalformedPrediction(format!("probabilities sum to {total}")));
    }
    if !classes.contains(&raw.label) {
        return Err(PipelineError::MalformedPrediction(format!("unknown label {}", raw.label)));
    }

    Ok(raw)
}
