//! Two-path recommendation generator.
//!
//! Generated path: one bounded call to the configured backend, no retry.
//! Fallback path: diagnosis-keyed template. Any failure of the generated path
//! (network, quota, timeout, empty text) downgrades to the fallback; callers
//! always receive a [`Recommendation`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use tamiz_common::config::{LlmConfig, RecommendationConfig};
use tamiz_common::{Diagnosis, PredictionResult, Recommendation};
use tracing::{debug, warn};

use crate::audit::RecommendationAudit;
use crate::backend::{self, LlmBackend, LlmError};
use crate::fallback::FallbackTemplates;
use crate::prompt::build_request;

/// Keep at most `max_chars` characters, ending in `ellipsis` when cut.
///
/// A budget no longer than the ellipsis itself yields only the first
/// `max_chars` characters of the marker; configuration loading rejects such
/// budgets.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize, ellipsis: &str) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let marker_len = ellipsis.chars().count();
    if marker_len >= max_chars {
        return ellipsis.chars().take(max_chars).collect();
    }
    let kept: String = text.chars().take(max_chars - marker_len).collect();
    format!("{}{}", kept.trim_end(), ellipsis)
}

pub struct RecommendationGenerator {
    backend: Option<Arc<dyn LlmBackend>>,
    templates: FallbackTemplates,
    timeout: Duration,
    max_chars: usize,
    ellipsis: String,
    max_output_tokens: u32,
    temperature: f32,
}

impl RecommendationGenerator {
    pub fn new(
        backend: Option<Arc<dyn LlmBackend>>,
        llm: &LlmConfig,
        recommendation: &RecommendationConfig,
    ) -> Self {
        Self {
            backend,
            templates: FallbackTemplates::from_config(recommendation),
            timeout: Duration::from_secs(llm.timeout_secs),
            max_chars: recommendation.max_chars,
            ellipsis: recommendation.ellipsis.clone(),
            max_output_tokens: llm.max_output_tokens,
            temperature: llm.temperature,
        }
    }

    /// Backend chosen from `llm`; fallback-only when no credential is configured.
    pub fn from_config(llm: &LlmConfig, recommendation: &RecommendationConfig) -> Self {
        Self::new(backend::from_config(llm), llm, recommendation)
    }

    pub fn fallback_only(recommendation: &RecommendationConfig) -> Self {
        Self::new(None, &LlmConfig::default(), recommendation)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_generative(&self) -> bool {
        self.backend.is_some()
    }

    pub fn model_id(&self) -> Option<&str> {
        self.backend.as_deref().map(|b| b.model_id())
    }

    /// Never fails; see the module docs for the path selection.
    pub async fn recommend(&self, result: &PredictionResult) -> Recommendation {
        let Some(backend) = &self.backend else {
            debug!("No generative credential configured, using fallback");
            return self.fallback(Some(result.diagnosis));
        };

        match self.generate(backend.as_ref(), result).await {
            Ok(text) => Recommendation::generated(text),
            Err(e) => {
                warn!(error = %e, model = backend.model_id(), "Recommendation service failed, using fallback");
                self.fallback(Some(result.diagnosis))
            }
        }
    }

    pub fn fallback(&self, diagnosis: Option<Diagnosis>) -> Recommendation {
        let text = self.templates.text_for(diagnosis);
        Recommendation::fallback(truncate_with_ellipsis(text, self.max_chars, &self.ellipsis))
    }

    async fn generate(&self, backend: &dyn LlmBackend, result: &PredictionResult) -> Result<String, LlmError> {
        let ceiling = u32::try_from(backend.max_output_tokens()).unwrap_or(u32::MAX);
        let req = build_request(result, self.max_output_tokens.min(ceiling), self.temperature);
        let started = Instant::now();

        let resp = tokio::time::timeout(self.timeout, backend.complete(req))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))??;

        let raw = resp.content.trim();
        if raw.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        let text = truncate_with_ellipsis(raw, self.max_chars, &self.ellipsis);

        RecommendationAudit::new(
            resp.model,
            backend.backend_name().to_string(),
            result.diagnosis,
            resp.prompt_tokens,
            resp.completion_tokens,
            &text,
            started.elapsed().as_millis() as u64,
        )
        .log();

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use tamiz_common::{ClassProbabilities, RecommendationSource};

    use crate::backend::{GeminiBackend, LlmRequest, LlmResponse};
    use crate::fallback::{BENIGN_TEMPLATE, MALIGNANT_TEMPLATE};

    enum Script {
        Reply(String),
        Fail,
        Hang,
    }

    struct ScriptedBackend(Script);

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
            match &self.0 {
                Script::Reply(text) => Ok(LlmResponse {
                    content: text.clone(),
                    model: req.model.unwrap_or_else(|| "scripted".to_string()),
                    prompt_tokens: 10,
                    completion_tokens: 20,
                }),
                Script::Fail => Err(LlmError::ApiError { status: 429, message: "quota".to_string() }),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(LlmError::EmptyResponse)
                }
            }
        }

        fn model_id(&self) -> &str { "scripted" }
        fn backend_name(&self) -> &str { "scripted" }
        fn max_output_tokens(&self) -> usize { 1024 }
    }

    fn result(diagnosis: Diagnosis) -> PredictionResult {
        PredictionResult {
            diagnosis,
            probabilities: ClassProbabilities { benigno: 0.3, maligno: 0.7 },
            confidence: 70.0,
        }
    }

    fn generator(script: Script) -> RecommendationGenerator {
        RecommendationGenerator::new(
            Some(Arc::new(ScriptedBackend(script))),
            &LlmConfig::default(),
            &RecommendationConfig::default(),
        )
        .with_timeout(Duration::from_millis(100))
    }

    #[tokio::test]
    async fn test_generated_text_is_tagged() {
        let rec = generator(Script::Reply("  Mantenga sus controles.  ".into()))
            .recommend(&result(Diagnosis::Maligno))
            .await;
        assert_eq!(rec.source, RecommendationSource::Generated);
        assert_eq!(rec.text, "Mantenga sus controles.");
    }

    #[tokio::test]
    async fn test_long_text_truncated_with_ellipsis() {
        let rec = generator(Script::Reply("a".repeat(2_000)))
            .recommend(&result(Diagnosis::Benigno))
            .await;
        assert_eq!(rec.text.chars().count(), 500);
        assert!(rec.text.ends_with("..."));
    }

    #[tokio::test]
    async fn test_service_error_falls_back() {
        let rec = generator(Script::Fail).recommend(&result(Diagnosis::Maligno)).await;
        assert!(rec.is_fallback());
        assert_eq!(rec.text, MALIGNANT_TEMPLATE);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let rec = generator(Script::Hang).recommend(&result(Diagnosis::Benigno)).await;
        assert!(rec.is_fallback());
        assert_eq!(rec.text, BENIGN_TEMPLATE);
    }

    #[tokio::test]
    async fn test_empty_reply_falls_back() {
        let rec = generator(Script::Reply("   ".into())).recommend(&result(Diagnosis::Benigno)).await;
        assert!(rec.is_fallback());
    }

    #[tokio::test]
    async fn test_unreachable_service_falls_back() {
        let backend = GeminiBackend::new("AIza-test", "gemini-1.5-flash").with_base_url("http://127.0.0.1:9");
        let gen = RecommendationGenerator::new(
            Some(Arc::new(backend)),
            &LlmConfig::default(),
            &RecommendationConfig::default(),
        )
        .with_timeout(Duration::from_secs(2));

        let rec = gen.recommend(&result(Diagnosis::Maligno)).await;
        assert!(rec.is_fallback());
        assert_eq!(rec.text, MALIGNANT_TEMPLATE);
    }

    #[tokio::test]
    async fn test_no_credential_is_always_fallback() {
        let gen = RecommendationGenerator::from_config(&LlmConfig::default(), &RecommendationConfig::default());
        assert!(!gen.is_generative());
        for diagnosis in [Diagnosis::Benigno, Diagnosis::Maligno] {
            let rec = gen.recommend(&result(diagnosis)).await;
            assert_eq!(rec, gen.fallback(Some(diagnosis)));
            assert!(rec.is_fallback());
        }
    }

    #[test]
    fn test_truncation_rules() {
        assert_eq!(truncate_with_ellipsis("corto", 10, "..."), "corto");
        assert_eq!(truncate_with_ellipsis("exactamente", 11, "..."), "exactamente");
        assert_eq!(truncate_with_ellipsis("áéíóú áéíóú", 8, "..."), "áéíóú...");
        assert_eq!(truncate_with_ellipsis("abcdef", 2, "..."), "..");
    }

    #[test]
    fn test_fallback_respects_small_budget() {
        let config = RecommendationConfig { max_chars: 40, ..RecommendationConfig::default() };
        let rec = RecommendationGenerator::fallback_only(&config).fallback(Some(Diagnosis::Benigno));
        assert!(rec.text.chars().count() <= 40);
        assert!(rec.text.ends_with("..."));
    }
}
