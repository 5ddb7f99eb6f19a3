//! Shared application state for the web server.

use std::sync::Arc;

use tamiz_llm::RecommendationGenerator;
use tamiz_pipeline::dataset::ReferenceDataset;
use tamiz_pipeline::ModelContext;

/// Shared state injected into every Axum handler. Read-only after start-up.
pub struct AppState {
    pub model: ModelContext,
    pub generator: RecommendationGenerator,
    /// Sample rows for demo lookups; `None` when no dataset is configured.
    pub dataset: Option<ReferenceDataset>,
    /// Absent input columns default to 0.0 before the pipeline runs.
    pub fill_missing_with_zero: bool,
}

impl AppState {
    pub fn new(model: ModelContext, generator: RecommendationGenerator) -> Self {
        Self { model, generator, dataset: None, fill_missing_with_zero: true }
    }

    pub fn with_dataset(mut self, dataset: ReferenceDataset) -> Self {
        self.dataset = Some(dataset);
        self
    }

    pub fn with_fill_missing_with_zero(mut self, enabled: bool) -> Self {
        self.fill_missing_with_zero = enabled;
        self
    }
}

pub type SharedState = Arc<AppState>;
