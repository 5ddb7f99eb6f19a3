//! Audit records for generated recommendations.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tamiz_common::Diagnosis;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationAudit {
    pub id: Uuid,
    pub model: String,
    pub backend: String,
    pub diagnosis: Diagnosis,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    /// SHA-256 of the text actually returned, after truncation.
    pub output_hash: String,
    pub latency_ms: u64,
    pub called_at: chrono::DateTime<Utc>,
}

impl RecommendationAudit {
    pub fn new(
        model: String,
        backend: String,
        diagnosis: Diagnosis,
        prompt_tokens: u32,
        completion_tokens: u32,
        output: &str,
        latency_ms: u64,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(output.as_bytes());
        let output_hash = format!("{:x}", hasher.finalize());

        Self {
            id: Uuid::new_v4(),
            model,
            backend,
            diagnosis,
            prompt_tokens,
            completion_tokens,
            output_hash,
            latency_ms,
            called_at: Utc::now(),
        }
    }

    pub fn log(&self) {
        tracing::info!(
            audit_id = %self.id,
            model = %self.model,
            backend = %self.backend,
            diagnosis = %self.diagnosis,
            latency_ms = self.latency_ms,
            completion_tokens = self.completion_tokens,
            output_sha256 = %self.output_hash,
            "Recommendation generated"
        );
    }
}
