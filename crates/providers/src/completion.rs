//! Completion client: one reply per turn, with a per-attempt timeout and
//! bounded retries on transient failures.
//!
//! Either a full reply text is returned or an error. Partial output from a
//! failed attempt is never surfaced.

use brewline_config::AppConfig;
use brewline_core::error::ProviderError;
use brewline_core::message::Message;
use brewline_core::provider::ProviderRequest;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sends (instructions, prior history, current input) to a provider and
/// returns the reply text.
pub struct CompletionClient {
    provider: Arc<dyn brewline_core::Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
    max_retries: u32,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn brewline_core::Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }

    /// Build a client using the model and completion settings from config.
    pub fn from_config(provider: Arc<dyn brewline_core::Provider>, config: &AppConfig) -> Self {
        Self::new(provider, config.model.clone())
            .with_temperature(config.completion.temperature)
            .with_max_tokens(config.completion.max_tokens)
            .with_timeout(Duration::from_secs(config.completion.timeout_secs))
            .with_max_retries(config.completion.max_retries)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Generate the assistant reply for one turn.
    ///
    /// The request is `[system instructions] + history + [user input]`.
    pub async fn complete(
        &self,
        instructions: &str,
        history: &[Message],
        user_input: &str,
    ) -> Result<String, ProviderError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(instructions));
        messages.extend(history.iter().cloned());
        messages.push(Message::user(user_input));

        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let attempts = self.max_retries + 1;
        let mut last_error = ProviderError::NotConfigured("No completion attempt made".into());

        for attempt in 1..=attempts {
            debug!(
                provider = %self.provider.name(),
                attempt,
                total = attempts,
                history_turns = history.len(),
                "Requesting completion"
            );

            match tokio::time::timeout(self.timeout, self.provider.complete(request.clone())).await
            {
                Ok(Ok(response)) => {
                    if let Some(usage) = &response.usage {
                        debug!(
                            prompt_tokens = usage.prompt_tokens,
                            completion_tokens = usage.completion_tokens,
                            "Completion usage"
                        );
                    }
                    if attempt > 1 {
                        info!(attempt, "Completion succeeded after retry");
                    }
                    return Ok(response.message.content);
                }
                Ok(Err(e)) => {
                    warn!(
                        provider = %self.provider.name(),
                        attempt,
                        error = %e,
                        "Completion attempt failed"
                    );
                    let retryable = e.is_retryable();
                    last_error = e;
                    if !retryable {
                        break;
                    }
                }
                Err(_) => {
                    warn!(
                        provider = %self.provider.name(),
                        attempt,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Completion attempt timed out"
                    );
                    last_error = ProviderError::Timeout(format!(
                        "Provider '{}' timed out after {}ms",
                        self.provider.name(),
                        self.timeout.as_millis()
                    ));
                }
            }

            if attempt < attempts {
                if let ProviderError::RateLimited { retry_after_secs } = &last_error {
                    let wait = Duration::from_secs(*retry_after_secs).min(self.timeout);
                    tokio::time::sleep(wait).await;
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use brewline_core::message::Role;
    use brewline_core::provider::ProviderResponse;
    use std::sync::Mutex;

    /// Fails with the given errors in order, then succeeds.
    struct FlakyProvider {
        failures: Mutex<Vec<ProviderError>>,
        call_count: Mutex<usize>,
        last_request: Mutex<Option<ProviderRequest>>,
    }

    impl FlakyProvider {
        fn new(failures: Vec<ProviderError>) -> Self {
            Self {
                failures: Mutex::new(failures),
                call_count: Mutex::new(0),
                last_request: Mutex::new(None),
            }
        }

        fn calls(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl brewline_core::Provider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            *self.last_request.lock().unwrap() = Some(request);
            let mut failures = self.failures.lock().unwrap();
            if failures.is_empty() {
                Ok(ProviderResponse {
                    message: Message::assistant("Sure thing!"),
                    usage: None,
                    model: "test-model".into(),
                })
            } else {
                Err(failures.remove(0))
            }
        }
    }

    /// A provider that never answers.
    struct HangingProvider {
        call_count: Mutex<usize>,
    }

    #[async_trait]
    impl brewline_core::Provider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    #[tokio::test]
    async fn request_is_instructions_history_then_input() {
        let provider = Arc::new(FlakyProvider::new(vec![]));
        let client = CompletionClient::new(provider.clone(), "m");
        let history = vec![Message::user("hi"), Message::assistant("hey!")];

        let reply = client
            .complete("be brief", &history, "my usual?")
            .await
            .unwrap();
        assert_eq!(reply, "Sure thing!");

        let request = provider.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.model, "m");
        let roles: Vec<Role> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(request.messages[0].content, "be brief");
        assert_eq!(request.messages[3].content, "my usual?");
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let provider = Arc::new(FlakyProvider::new(vec![ProviderError::ApiError {
            status_code: 503,
            message: "overloaded".into(),
        }]));
        let client = CompletionClient::new(provider.clone(), "m").with_max_retries(2);

        let reply = client.complete("x", &[], "hello").await.unwrap();
        assert_eq!(reply, "Sure thing!");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn auth_failure_is_not_retried() {
        let provider = Arc::new(FlakyProvider::new(vec![
            ProviderError::AuthenticationFailed("bad key".into()),
        ]));
        let client = CompletionClient::new(provider.clone(), "m").with_max_retries(3);

        let err = client.complete("x", &[], "hello").await.unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed(_)));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let provider = Arc::new(FlakyProvider::new(vec![
            ProviderError::Network("refused".into()),
            ProviderError::Network("refused".into()),
            ProviderError::Network("refused".into()),
        ]));
        let client = CompletionClient::new(provider.clone(), "m").with_max_retries(1);

        let err = client.complete("x", &[], "hello").await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn hanging_provider_times_out() {
        let provider = Arc::new(HangingProvider {
            call_count: Mutex::new(0),
        });
        let client = CompletionClient::new(provider.clone(), "m")
            .with_timeout(Duration::from_millis(30))
            .with_max_retries(1);

        let err = client.complete("x", &[], "hello").await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
        assert_eq!(*provider.call_count.lock().unwrap(), 2);
    }

    #[test]
    fn from_config_reads_completion_settings() {
        let mut config = AppConfig::default();
        config.model = "openai/gpt-oss-120b".into();
        config.completion.max_retries = 4;
        let provider = Arc::new(FlakyProvider::new(vec![]));
        let client = CompletionClient::from_config(provider, &config);
        assert_eq!(client.model(), "openai/gpt-oss-120b");
        assert_eq!(client.max_retries, 4);
        assert_eq!(client.max_tokens, Some(config.completion.max_tokens));
    }
}
