//! Configuration loading, validation, and management for Brewline.
//!
//! Loads configuration from `~/.brewline/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.brewline/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Completion model
    #[serde(default = "default_model")]
    pub model: String,

    /// Completion service settings
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Conversation memory settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Chat input limits
    #[serde(default)]
    pub chat: ChatConfig,

    /// Knowledge store (RAG) settings
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// PII masking settings
    #[serde(default)]
    pub privacy: PrivacyConfig,

    /// Assistant persona settings
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_model() -> String {
    "openai/gpt-oss-120b".into()
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("completion", &self.completion)
            .field("memory", &self.memory)
            .field("chat", &self.chat)
            .field("knowledge", &self.knowledge)
            .field("privacy", &self.privacy)
            .field("persona", &self.persona)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// OpenAI-compatible base URL
    #[serde(default = "default_completion_url")]
    pub base_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-attempt connect/response timeout
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,

    /// Extra attempts after a transient failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_completion_url() -> String {
    "https://api.groq.com/openai/v1".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    512
}
fn default_completion_timeout() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    2
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_completion_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_completion_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Exchanges kept per session; the history cap is twice this
    #[serde(default = "default_memory_length")]
    pub memory_length: usize,

    /// Session label used when a request names none
    #[serde(default = "default_session")]
    pub default_session: String,
}

fn default_memory_length() -> usize {
    10
}
fn default_session() -> String {
    "default".into()
}

impl MemoryConfig {
    /// Maximum turns stored per session (user + assistant pairs).
    pub fn history_cap(&self) -> usize {
        self.memory_length * 2
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            memory_length: default_memory_length(),
            default_session: default_session(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

fn default_max_message_chars() -> usize {
    2000
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_chars: default_max_message_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// JSONL file holding embedded passages
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// OpenAI-compatible embeddings endpoint
    #[serde(default = "default_embedding_url")]
    pub embedding_url: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Passages returned per search
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Customer profile documents for the indexer
    #[serde(default = "default_customer_dir")]
    pub customer_data_dir: PathBuf,

    /// Business information documents for the indexer
    #[serde(default = "default_business_dir")]
    pub business_data_dir: PathBuf,
}

fn default_store_path() -> PathBuf {
    AppConfig::config_dir().join("knowledge").join("passages.jsonl")
}
fn default_embedding_url() -> String {
    "http://localhost:11434/v1".into()
}
fn default_embedding_model() -> String {
    "llama3.1".into()
}
fn default_top_k() -> usize {
    3
}
fn default_customer_dir() -> PathBuf {
    PathBuf::from("./data/customers")
}
fn default_business_dir() -> PathBuf {
    PathBuf::from("./data/business_info")
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            store_path: default_store_path(),
            embedding_url: default_embedding_url(),
            embedding_model: default_embedding_model(),
            top_k: default_top_k(),
            customer_data_dir: default_customer_dir(),
            business_data_dir: default_business_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivacyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// "presidio" (HTTP analyzer/anonymizer) or "pattern" (local regex)
    #[serde(default = "default_privacy_engine")]
    pub engine: String,

    #[serde(default = "default_analyzer_url")]
    pub analyzer_url: String,

    #[serde(default = "default_anonymizer_url")]
    pub anonymizer_url: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_privacy_timeout")]
    pub timeout_secs: u64,
}

fn default_privacy_engine() -> String {
    "pattern".into()
}
fn default_analyzer_url() -> String {
    "http://localhost:5002".into()
}
fn default_anonymizer_url() -> String {
    "http://localhost:5001".into()
}
fn default_language() -> String {
    "en".into()
}
fn default_privacy_timeout() -> u64 {
    5
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            engine: default_privacy_engine(),
            analyzer_url: default_analyzer_url(),
            anonymizer_url: default_anonymizer_url(),
            language: default_language(),
            timeout_secs: default_privacy_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Replace the built-in persona text entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.brewline/config.toml).
    ///
    /// Also checks environment variables:
    /// - `BREWLINE_API_KEY` (highest priority), then `GROQ_API_KEY`
    /// - `BREWLINE_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("BREWLINE_API_KEY")
                .ok()
                .or_else(|| std::env::var("GROQ_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("BREWLINE_MODEL") {
            config.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".brewline")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.completion.temperature < 0.0 || self.completion.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "completion.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.memory.memory_length == 0 {
            return Err(ConfigError::ValidationError(
                "memory.memory_length must be at least 1".into(),
            ));
        }

        if self.chat.max_message_chars == 0 {
            return Err(ConfigError::ValidationError(
                "chat.max_message_chars must be at least 1".into(),
            ));
        }

        if self.knowledge.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "knowledge.top_k must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            completion: CompletionConfig::default(),
            memory: MemoryConfig::default(),
            chat: ChatConfig::default(),
            knowledge: KnowledgeConfig::default(),
            privacy: PrivacyConfig::default(),
            persona: PersonaConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
