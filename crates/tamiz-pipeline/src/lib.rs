//! tamiz-pipeline: Deterministic inference core.
//!
//! raw record → normalizer → feature engineering → imputer → selector →
//! classifier adapter → result formatter. Every stage is a pure function of
//! its input plus the immutable [`ModelContext`] loaded once at start-up.

pub mod features;
pub mod normalizer;
pub mod engineering;
pub mod imputer;
pub mod selector;
pub mod classifier;
pub mod formatter;
pub mod artifacts;
pub mod pipeline;
pub mod dataset;

pub use artifacts::{ModelContext, ModelParts};
pub use classifier::{Classifier, ClassifierError, LogisticRegression, RawPrediction};
pub use features::FeatureVector;
pub use pipeline::{predict, predict_traced, PipelineTrace};
