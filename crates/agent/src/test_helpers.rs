//! Shared test doubles for orchestrator tests.

use async_trait::async_trait;
use brewline_core::error::{ProviderError, RetrievalError};
use brewline_core::knowledge::{Document, Passage, VectorStore};
use brewline_core::message::Message;
use brewline_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;
use std::time::Duration;

/// Replies with a fixed text and remembers every request.
pub struct RecordingProvider {
    reply: String,
    delay: Duration,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl RecordingProvider {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.into(),
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> ProviderRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request recorded")
    }
}

#[async_trait]
impl Provider for RecordingProvider {
    fn name(&self) -> &str {
        "recording_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(ProviderResponse {
            message: Message::assistant(self.reply.clone()),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        })
    }
}

/// Always fails with the given error.
pub struct FailingProvider {
    pub error: ProviderError,
}

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(self.error.clone())
    }
}

/// Returns a fixed passage list for every search and records the queries.
pub struct ScriptedStore {
    passages: Vec<Passage>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedStore {
    pub fn new(contents: &[&str]) -> Self {
        Self {
            passages: contents
                .iter()
                .enumerate()
                .map(|(i, c)| Passage {
                    id: format!("p{i}"),
                    content: c.to_string(),
                    source: "scripted.txt".into(),
                    score: 1.0 - i as f32 * 0.1,
                    embedding: None,
                })
                .collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorStore for ScriptedStore {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Passage>, RetrievalError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.passages.iter().take(k).cloned().collect())
    }

    async fn add_documents(&self, _documents: Vec<Document>) -> Result<usize, RetrievalError> {
        Ok(0)
    }

    async fn count(&self) -> Result<usize, RetrievalError> {
        Ok(self.passages.len())
    }

    async fn clear(&self) -> Result<(), RetrievalError> {
        Ok(())
    }
}
