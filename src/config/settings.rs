//! Configuration settings for Pantry.
//!
//! Settings are resolved once at startup: built-in defaults, then the TOML
//! config file (if present), then environment variables. The resulting value
//! is passed by reference into each component and never mutated afterwards.

use crate::error::{PantryError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub store: StoreSettings,
    pub generator: GeneratorSettings,
    pub dataset: DatasetSettings,
    pub rag: RagSettings,
    pub retry: RetrySettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Timeout applied to every remote request, in seconds.
    pub request_timeout_secs: u64,
    /// Log level used when no `-v` flag or `RUST_LOG` is given.
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: crate::http::DEFAULT_TIMEOUT_SECS,
            log_level: "warn".to_string(),
        }
    }
}

/// Vector store backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreProvider {
    /// Hosted Upstash Vector index (server-side embedding).
    #[default]
    Upstash,
    /// Process-local store with lexical scoring. Nothing survives the process.
    Memory,
}

impl std::str::FromStr for StoreProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upstash" => Ok(StoreProvider::Upstash),
            "memory" => Ok(StoreProvider::Memory),
            _ => Err(format!("Unknown vector store provider: {}", s)),
        }
    }
}

impl std::fmt::Display for StoreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreProvider::Upstash => write!(f, "upstash"),
            StoreProvider::Memory => write!(f, "memory"),
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub provider: StoreProvider,
    /// REST endpoint of the index.
    pub url: Option<String>,
    /// Bearer token. Never written back to the config file.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Namespace holding the food vectors. Empty means the default partition.
    pub namespace: String,
    /// Records per upsert request.
    pub batch_size: usize,
    /// Pause between upsert batches, in milliseconds.
    pub batch_pause_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            provider: StoreProvider::Upstash,
            url: None,
            token: None,
            namespace: "foods".to_string(),
            batch_size: 50,
            batch_pause_ms: 500,
        }
    }
}

/// Which text generator answers questions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorProvider {
    /// Groq if an API key is configured, otherwise templated summaries.
    #[default]
    Auto,
    /// OpenAI-compatible chat endpoint (Groq by default).
    Groq,
    /// Local Ollama server.
    Ollama,
    /// No LLM; answers are templated summaries of the retrieved text.
    None,
}

impl std::str::FromStr for GeneratorProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(GeneratorProvider::Auto),
            "groq" | "openai" => Ok(GeneratorProvider::Groq),
            "ollama" | "local" => Ok(GeneratorProvider::Ollama),
            "none" | "off" => Ok(GeneratorProvider::None),
            _ => Err(format!("Unknown generator provider: {}", s)),
        }
    }
}

impl std::fmt::Display for GeneratorProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorProvider::Auto => write!(f, "auto"),
            GeneratorProvider::Groq => write!(f, "groq"),
            GeneratorProvider::Ollama => write!(f, "ollama"),
            GeneratorProvider::None => write!(f, "none"),
        }
    }
}

/// Text generator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub provider: GeneratorProvider,
    /// Chat model for the OpenAI-compatible endpoint.
    pub model: String,
    /// Base URL of the OpenAI-compatible endpoint.
    pub api_base: String,
    /// API key. Never written back to the config file.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Ollama server address.
    pub ollama_host: String,
    /// Model served by Ollama.
    pub ollama_model: String,
    pub temperature: f32,
    /// Output token budget per answer.
    pub max_tokens: u32,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            provider: GeneratorProvider::Auto,
            model: "llama-3.1-8b-instant".to_string(),
            api_base: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            ollama_host: "http://localhost:11434".to_string(),
            ollama_model: "llama3.2".to_string(),
            temperature: 0.7,
            max_tokens: 500,
        }
    }
}

impl GeneratorSettings {
    /// Resolve `Auto` into a concrete provider.
    pub fn effective_provider(&self) -> GeneratorProvider {
        match self.provider {
            GeneratorProvider::Auto if self.has_api_key() => GeneratorProvider::Groq,
            GeneratorProvider::Auto => GeneratorProvider::None,
            other => other,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSettings {
    /// Path to the JSON array of food records.
    pub path: String,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            path: "foods.json".to_string(),
        }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Number of matches retrieved per question.
    pub top_k: usize,
    /// Append region/type/cultural lines to each context entry.
    pub include_metadata: bool,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            include_metadata: true,
        }
    }
}

/// Retry settings for remote calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Attempts per remote call, including the first.
    pub max_attempts: u32,
    /// Retry `n` waits `backoff_base^n` seconds.
    pub backoff_base: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: 2.0,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file and the process environment.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path (or the default location), then the environment.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let mut settings = Self::load_file(path)?;
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Load only the config file, without the environment overlay.
    pub fn load_file(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else if path.is_some() {
            Err(PantryError::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )))
        } else {
            Ok(Settings::default())
        }
    }

    /// Overlay values from environment variables looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("UPSTASH_VECTOR_REST_URL") {
            self.store.url = Some(v);
        }
        if let Some(v) = get("UPSTASH_VECTOR_REST_TOKEN") {
            self.store.token = Some(v);
        }
        if let Some(v) = lookup("FOODS_NAMESPACE") {
            self.store.namespace = v.trim().to_string();
        }
        if let Some(v) = get("VECTOR_STORE_PROVIDER") {
            self.store.provider = v.parse().map_err(PantryError::Config)?;
        }
        if let Some(v) = get("GROQ_API_KEY") {
            self.generator.api_key = Some(v);
        }
        if let Some(v) = get("LLM_PROVIDER") {
            self.generator.provider = v.parse().map_err(PantryError::Config)?;
        }
        if let Some(v) = get("LLM_MODEL") {
            self.generator.model = v;
        }
        if let Some(v) = get("OLLAMA_HOST") {
            self.generator.ollama_host = v;
        }
        if let Some(v) = get("OLLAMA_MODEL") {
            self.generator.ollama_model = v;
        }
        if let Some(v) = get("REQUEST_TIMEOUT_SECS") {
            self.general.request_timeout_secs = parse_number("REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("JSON_FILE") {
            self.dataset.path = v;
        }
        if let Some(v) = get("MAX_RESULTS") {
            self.rag.top_k = parse_number("MAX_RESULTS", &v)?;
        }
        if let Some(v) = get("RETRY_MAX_ATTEMPTS") {
            self.retry.max_attempts = parse_number("RETRY_MAX_ATTEMPTS", &v)?;
        }
        if let Some(v) = get("RETRY_BACKOFF_BASE") {
            self.retry.backoff_base = parse_number("RETRY_BACKOFF_BASE", &v)?;
        }

        Ok(())
    }

    /// Check the settings needed to talk to remote services.
    ///
    /// Missing credentials are fatal at startup, never retried.
    pub fn validate(&self) -> Result<()> {
        if self.rag.top_k == 0 {
            return Err(PantryError::Config("rag.top_k must be at least 1".to_string()));
        }
        if !(1..=1000).contains(&self.store.batch_size) {
            return Err(PantryError::Config(format!(
                "store.batch_size must be between 1 and 1000, got {}",
                self.store.batch_size
            )));
        }
        if !(self.retry.backoff_base.is_finite() && self.retry.backoff_base >= 0.0) {
            return Err(PantryError::Config(
                "retry.backoff_base must be a non-negative number".to_string(),
            ));
        }

        if self.store.provider == StoreProvider::Upstash {
            let url = self.store.url.as_deref().ok_or_else(|| {
                PantryError::Config(
                    "UPSTASH_VECTOR_REST_URL is not set. Export it or set store.url in the config file."
                        .to_string(),
                )
            })?;
            url::Url::parse(url).map_err(|e| {
                PantryError::Config(format!("Invalid vector store URL '{}': {}", url, e))
            })?;
            if !self.store.token.as_ref().is_some_and(|t| !t.trim().is_empty()) {
                return Err(PantryError::Config(
                    "UPSTASH_VECTOR_REST_TOKEN is not set. Export it before running pantry."
                        .to_string(),
                ));
            }
        }

        match self.generator.provider {
            GeneratorProvider::Groq if !self.generator.has_api_key() => {
                return Err(PantryError::Config(
                    "GROQ_API_KEY is not set but the groq generator was requested.".to_string(),
                ));
            }
            GeneratorProvider::Ollama => {
                url::Url::parse(&self.generator.ollama_host).map_err(|e| {
                    PantryError::Config(format!(
                        "Invalid Ollama host '{}': {}",
                        self.generator.ollama_host, e
                    ))
                })?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pantry")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded dataset path.
    pub fn dataset_path(&self) -> PathBuf {
        Self::expand_path(&self.dataset.path)
    }

    /// Request timeout for remote clients.
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.general.request_timeout_secs)
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| PantryError::Config(format!("{} has invalid value '{}': {}", key, value, e)))
}
