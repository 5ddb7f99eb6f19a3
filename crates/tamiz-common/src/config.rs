//! Service configuration.
//!
//! Read from `tamiz.toml` (or the path in `TAMIZ_CONFIG`). Every field has a
//! default, so a missing file still yields a runnable configuration; a few
//! environment variables (the ones the old `.env` bootstrap wrote) override
//! the file.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::ConfigError;

/// Value the bootstrap `.env` template ships with; never a real credential.
pub const PLACEHOLDER_API_KEY: &str = "tu_api_key_aqui";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub recommendation: RecommendationConfig,
    #[serde(default)]
    pub web: WebConfig,
}

// ── Artifacts ─────────────────────────────────────────────────────────────────

/// Location of the trained artifact bundle, one JSON file per artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    #[serde(default = "default_artifacts_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_rename_map_file")]
    pub rename_map: String,
    #[serde(default = "default_drop_columns_file")]
    pub drop_columns: String,
    #[serde(default = "default_label_map_file")]
    pub label_map: String,
    #[serde(default = "default_transformer_file")]
    pub transformer: String,
    #[serde(default = "default_imputer_file")]
    pub imputer: String,
    #[serde(default = "default_selected_features_file")]
    pub selected_features: String,
    #[serde(default = "default_model_file")]
    pub model: String,
}

fn default_artifacts_dir()          -> PathBuf { PathBuf::from("./artifacts") }
fn default_rename_map_file()        -> String { "renombrar_columnas.json".to_string() }
fn default_drop_columns_file()      -> String { "columnas_a_eliminar.json".to_string() }
fn default_label_map_file()         -> String { "target_encoder.json".to_string() }
fn default_transformer_file()       -> String { "feature_engineering_transformer.json".to_string() }
fn default_imputer_file()           -> String { "imputer.json".to_string() }
fn default_selected_features_file() -> String { "selected_features.json".to_string() }
fn default_model_file()             -> String { "final_model.json".to_string() }

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: default_artifacts_dir(),
            rename_map: default_rename_map_file(),
            drop_columns: default_drop_columns_file(),
            label_map: default_label_map_file(),
            transformer: default_transformer_file(),
            imputer: default_imputer_file(),
            selected_features: default_selected_features_file(),
            model: default_model_file(),
        }
    }
}

impl ArtifactsConfig {
    /// Same file names, rooted at another directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), ..Self::default() }
    }

    pub fn path_of(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

// ── Reference dataset ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    /// Semicolon-delimited sample data; demo lookups are disabled when unset.
    pub path: Option<PathBuf>,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_id_column() -> String { "id_paciente".to_string() }
fn default_delimiter() -> char   { ';' }

impl Default for DatasetConfig {
    fn default() -> Self {
        Self { path: None, id_column: default_id_column(), delimiter: default_delimiter() }
    }
}

// ── Generative-text service ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[default]
    Gemini,
    OpenaiCompatible,
}

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Overrides the provider's public endpoint.
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_llm_model()         -> String { "gemini-1.5-flash".to_string() }
fn default_timeout_secs()      -> u64    { 15 }
fn default_max_output_tokens() -> u32    { 512 }
fn default_temperature()       -> f32    { 0.4 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: default_llm_model(),
            base_url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl LlmConfig {
    /// The credential, if one is really configured.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret().trim())
            .filter(|k| !k.is_empty() && *k != PLACEHOLDER_API_KEY)
    }

    pub fn is_configured(&self) -> bool {
        self.credential().is_some()
    }
}

// ── Recommendation ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationConfig {
    /// Character budget for generated text, ellipsis included.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_ellipsis")]
    pub ellipsis: String,
    /// Fallback template overrides.
    pub benign_template: Option<String>,
    pub malignant_template: Option<String>,
    pub generic_template: Option<String>,
}

fn default_max_chars() -> usize  { 500 }
fn default_ellipsis()  -> String { "...".to_string() }

impl RecommendationConfig {
    /// The budget must leave room for at least one character before the ellipsis.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let marker = self.ellipsis.chars().count();
        if self.max_chars <= marker {
            return Err(ConfigError::Invalid {
                section: "recommendation",
                key: "max_chars",
                reason: format!("{} does not exceed the ellipsis length {marker}", self.max_chars),
            });
        }
        Ok(())
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            ellipsis: default_ellipsis(),
            benign_template: None,
            malignant_template: None,
            generic_template: None,
        }
    }
}

// ── Web ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Absent input columns default to 0.0 before the pipeline runs.
    #[serde(default = "bool_true")]
    pub fill_missing_with_zero: bool,
}

fn default_bind() -> String { "0.0.0.0:3000".to_string() }
fn bool_true()    -> bool   { true }

impl Default for WebConfig {
    fn default() -> Self {
        Self { bind: default_bind(), fill_missing_with_zero: true }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl Config {
    /// Load configuration from tamiz.toml.
    /// Checks TAMIZ_CONFIG env var first, then current directory, then applies
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("TAMIZ_CONFIG").unwrap_or_else(|_| "tamiz.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            Self::from_path(&path)?
        } else {
            tracing::warn!("Config file not found: {path}; using defaults");
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.recommendation.validate()?;
        Ok(config)
    }

    /// `GEMINI_API_KEY`, `MODEL_NAME` and `TAMIZ_BIND` win over the file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(SecretString::from(key));
        }
        if let Some(model) = lookup("MODEL_NAME").filter(|m| !m.trim().is_empty()) {
            self.llm.model = model;
        }
        if let Some(bind) = lookup("TAMIZ_BIND").filter(|b| !b.trim().is_empty()) {
            self.web.bind = bind;
        }
    }
}
