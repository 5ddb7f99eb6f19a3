//! tamiz-llm: Generative-text backends and the recommendation generator.
//!
//! The generator turns a `PredictionResult` into patient-facing guidance,
//! either through a constrained call to a generative backend or through a
//! fixed template when that call is unavailable or fails.

pub mod backend;
pub mod prompt;
pub mod fallback;
pub mod recommendation;
pub mod audit;

pub use backend::{LlmBackend, LlmError};
pub use recommendation::{truncate_with_ellipsis, RecommendationGenerator};
