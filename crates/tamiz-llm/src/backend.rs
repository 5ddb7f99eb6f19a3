//! Generative-text backend trait and concrete implementations.
//!
//! Backends:
//!   GeminiBackend           : Google Gemini API (gemini-1.5-flash, pro, …)
//!   OpenAiCompatibleBackend : any OpenAI-compatible chat endpoint (Ollama,
//!                             LMStudio, vLLM, OpenRouter, …)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tamiz_common::config::{LlmConfig, LlmProvider};
use thiserror::Error;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

// ── Error ─────────────────────────────────────────────────────────────────────

/// Any failure of the generative-text call. Never reaches the caller of the
/// recommendation generator; it only decides that the fallback is used.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
    #[error("No response within {0:?}")]
    Timeout(Duration),
    #[error("Backend returned no text")]
    EmptyResponse,
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,   // "system" | "user" | "assistant"
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError>;
    fn model_id(&self) -> &str;
    fn backend_name(&self) -> &str;
    fn max_output_tokens(&self) -> usize;
}

/// Build the configured backend, or `None` when no usable credential is set.
pub fn from_config(config: &LlmConfig) -> Option<Arc<dyn LlmBackend>> {
    let key = config.credential()?;
    let backend: Arc<dyn LlmBackend> = match config.provider {
        LlmProvider::Gemini => {
            let mut b = GeminiBackend::new(key, &config.model);
            if let Some(url) = &config.base_url {
                b = b.with_base_url(url);
            }
            Arc::new(b)
        }
        LlmProvider::OpenaiCompatible => {
            let url = config.base_url.as_deref().unwrap_or("http://localhost:11434");
            Arc::new(OpenAiCompatibleBackend::new(url, &config.model, Some(key.to_string())))
        }
    };
    Some(backend)
}

// ── Helper: parse OpenAI-style response ──────────────────────────────────────

fn parse_openai_response(json: &serde_json::Value, fallback_model: &str) -> LlmResponse {
    LlmResponse {
        content: json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string(),
        model: json["model"]
            .as_str()
            .unwrap_or(fallback_model)
            .to_string(),
        prompt_tokens:     json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        completion_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    }
}

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = resp.status().as_u16();
    let body: serde_json::Value = resp.json().await?;
    if status >= 400 {
        let msg = body["error"]["message"]
            .as_str()
            .or_else(|| body["message"].as_str())
            .unwrap_or("unknown API error")
            .to_string();
        return Err(LlmError::ApiError { status, message: msg });
    }
    Ok(body)
}

// ── 1. Google Gemini ──────────────────────────────────────────────────────────

pub struct GeminiBackend {
    pub model: String,
    pub base_url: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_body(req: &LlmRequest) -> serde_json::Value {
        // System message → systemInstruction
        let system_text = req.messages.iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.clone());

        let contents: Vec<serde_json::Value> = req.messages.iter()
            .filter(|m| m.role != "system")
            .map(|m| {
                let role = if m.role == "assistant" { "model" } else { "user" };
                serde_json::json!({
                    "role": role,
                    "parts": [{ "text": m.content }]
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": req.max_tokens.unwrap_or(1024),
                "temperature":     req.temperature.unwrap_or(0.4),
            }
        });
        if let Some(sys) = system_text {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": sys }]
            });
        }
        body
    }

    fn parse_response(json: &serde_json::Value, model: &str) -> LlmResponse {
        // Candidates may split text across several parts.
        let content = json["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts.iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        LlmResponse {
            content,
            model: model.to_string(),
            prompt_tokens:     json["usageMetadata"]["promptTokenCount"].as_u64().unwrap_or(0) as u32,
            completion_tokens: json["usageMetadata"]["candidatesTokenCount"].as_u64().unwrap_or(0) as u32,
        }
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let model = req.model.as_deref().unwrap_or(&self.model);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        );

        let resp = self.client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&Self::request_body(&req))
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        Ok(Self::parse_response(&json, model))
    }

    fn model_id(&self) -> &str { &self.model }
    fn backend_name(&self) -> &str { "gemini" }
    fn max_output_tokens(&self) -> usize { 8_192 }
}

// ── 2. OpenAI-Compatible (Ollama, LMStudio, vLLM, OpenRouter, …) ─────────────

pub struct OpenAiCompatibleBackend {
    pub base_url: String,
    pub model: String,
    api_key: Option<SecretString>,
    client: reqwest::Client,
}

impl OpenAiCompatibleBackend {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.map(SecretString::from),
            client: reqwest::Client::new(),
        }
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(k) => req.bearer_auth(k.expose_secret()),
            None    => req,
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model":       req.model.as_deref().unwrap_or(&self.model),
            "messages":    req.messages,
            "max_tokens":  req.max_tokens.unwrap_or(1024),
            "temperature": req.temperature.unwrap_or(0.4),
        });
        let resp = self.auth(self.client.post(&url)).json(&body).send().await?;
        let json = check_response_status(resp).await?;
        Ok(parse_openai_response(&json, &self.model))
    }

    fn model_id(&self) -> &str { &self.model }
    fn backend_name(&self) -> &str { "openai_compatible" }
    fn max_output_tokens(&self) -> usize { 8_192 }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_backend_defaults() {
        let b = GeminiBackend::new("AIza-test", "gemini-1.5-flash");
        assert_eq!(b.model_id(), "gemini-1.5-flash");
        assert_eq!(b.backend_name(), "gemini");
        assert_eq!(b.base_url, GEMINI_BASE_URL);
    }

    #[test]
    fn test_gemini_body_moves_system_prompt() {
        let req = LlmRequest {
            messages: vec![Message::system("reglas"), Message::user("hola")],
            model: None,
            max_tokens: Some(256),
            temperature: Some(0.2),
        };
        let body = GeminiBackend::request_body(&req);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "reglas");
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
    }

    #[test]
    fn test_gemini_response_joins_parts() {
        let json = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hola " }, { "text": "mundo" }] } }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 3 }
        });
        let resp = GeminiBackend::parse_response(&json, "gemini-1.5-flash");
        assert_eq!(resp.content, "Hola mundo");
        assert_eq!(resp.prompt_tokens, 12);
        assert_eq!(resp.completion_tokens, 3);
    }

    #[test]
    fn test_gemini_blocked_response_is_empty() {
        let json = serde_json::json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert_eq!(GeminiBackend::parse_response(&json, "m").content, "");
    }

    #[test]
    fn test_openai_compatible_with_no_key() {
        let b = OpenAiCompatibleBackend::new("http://localhost:1234", "local-model", None);
        assert_eq!(b.model_id(), "local-model");
        assert_eq!(b.backend_name(), "openai_compatible");
    }

    #[test]
    fn test_from_config_requires_credential() {
        let mut config = LlmConfig::default();
        assert!(from_config(&config).is_none());

        config.api_key = Some(SecretString::from("tu_api_key_aqui".to_string()));
        assert!(from_config(&config).is_none());

        config.api_key = Some(SecretString::from("AIza-real".to_string()));
        let backend = from_config(&config).unwrap();
        assert_eq!(backend.backend_name(), "gemini");
        assert_eq!(backend.model_id(), "gemini-1.5-flash");

        config.provider = LlmProvider::OpenaiCompatible;
        assert_eq!(from_config(&config).unwrap().backend_name(), "openai_compatible");
    }
}
