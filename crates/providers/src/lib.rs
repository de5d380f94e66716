//! Completion and embedding providers for Brewline.
//!
//! All providers implement the `brewline_core::Provider` trait. The
//! [`CompletionClient`] wraps one of them with timeout and retry handling.

pub mod completion;
pub mod openai_compat;

pub use completion::CompletionClient;
pub use openai_compat::OpenAiCompatProvider;

use brewline_config::AppConfig;
use brewline_core::error::ProviderError;
use brewline_core::provider::Provider;
use std::sync::Arc;
use std::time::Duration;

/// Build the chat completion provider from configuration.
///
/// Fails with `NotConfigured` when no API key is available.
pub fn build_completion_provider(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        ProviderError::NotConfigured(
            "No API key set. Use BREWLINE_API_KEY, GROQ_API_KEY or api_key in config.toml".into(),
        )
    })?;

    let provider = OpenAiCompatProvider::new(
        provider_name(&config.completion.base_url),
        &config.completion.base_url,
        api_key,
        Duration::from_secs(config.completion.timeout_secs),
    )?;
    Ok(Arc::new(provider))
}

/// Build the embedding provider used by the knowledge store.
pub fn build_embedding_provider(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let provider = OpenAiCompatProvider::ollama(
        Some(&config.knowledge.embedding_url),
        Duration::from_secs(config.completion.timeout_secs),
    )?;
    Ok(Arc::new(provider))
}

/// Build a ready-to-use completion client from configuration.
pub fn build_completion_client(config: &AppConfig) -> Result<CompletionClient, ProviderError> {
    let provider = build_completion_provider(config)?;
    Ok(CompletionClient::from_config(provider, config))
}

/// Derive a short provider name from a well-known base URL.
fn provider_name(base_url: &str) -> &'static str {
    if base_url.contains("groq.com") {
        "groq"
    } else if base_url.contains("openai.com") {
        "openai"
    } else if base_url.contains("openrouter.ai") {
        "openrouter"
    } else if base_url.contains("localhost:11434") {
        "ollama"
    } else {
        "custom"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_name_from_url() {
        assert_eq!(provider_name("https://api.groq.com/openai/v1"), "groq");
        assert_eq!(provider_name("http://localhost:11434/v1"), "ollama");
        assert_eq!(provider_name("https://llm.internal/v1"), "custom");
    }

    #[test]
    fn missing_api_key_is_not_configured() {
        let config = AppConfig::default();
        match build_completion_provider(&config) {
            Err(ProviderError::NotConfigured(_)) => {}
            Err(other) => panic!("Expected NotConfigured, got: {other:?}"),
            Ok(_) => panic!("Expected an error without an API key"),
        }
    }

    #[test]
    fn builds_client_with_configured_model() {
        let mut config = AppConfig::default();
        config.api_key = Some("gsk-test".into());
        let client = build_completion_client(&config).unwrap();
        assert_eq!(client.model(), config.model);
        assert_eq!(client.provider_name(), "groq");
    }

    #[test]
    fn embedding_provider_uses_knowledge_url() {
        let config = AppConfig::default();
        let provider = build_embedding_provider(&config).unwrap();
        assert_eq!(provider.name(), "ollama");
    }
}
