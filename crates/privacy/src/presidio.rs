//! Presidio-compatible HTTP engine.
//!
//! Talks to a separately deployed analyzer (`POST /analyze`) and
//! anonymizer (`POST /anonymize`). Spans are passed back to the anonymizer
//! exactly as the analyzer reported them.

use async_trait::async_trait;
use brewline_core::error::PrivacyError;
use brewline_core::privacy::{EntityKind, EntitySpan, PiiEngine};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub struct PresidioEngine {
    analyzer_url: String,
    anonymizer_url: String,
    client: reqwest::Client,
}

impl PresidioEngine {
    pub fn new(
        analyzer_url: impl Into<String>,
        anonymizer_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PrivacyError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| PrivacyError::EngineUnavailable(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            analyzer_url: analyzer_url.into().trim_end_matches('/').to_string(),
            anonymizer_url: anonymizer_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl PiiEngine for PresidioEngine {
    fn name(&self) -> &str {
        "presidio"
    }

    async fn analyze(
        &self,
        text: &str,
        entities: &[EntityKind],
        language: &str,
    ) -> Result<Vec<EntitySpan>, PrivacyError> {
        let url = format!("{}/analyze", self.analyzer_url);
        let body = AnalyzeRequest {
            text,
            language,
            entities: entities.iter().map(|k| k.label()).collect(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PrivacyError::EngineUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(PrivacyError::AnalysisFailed(format!(
                "Analyzer returned status {status}"
            )));
        }

        let results: Vec<RecognizerResult> = response
            .json()
            .await
            .map_err(|e| PrivacyError::AnalysisFailed(format!("Failed to parse analyzer response: {e}")))?;

        let spans: Vec<EntitySpan> = results
            .into_iter()
            .filter_map(|r| match EntityKind::from_label(&r.entity_type) {
                Some(kind) => Some(EntitySpan {
                    kind,
                    start: r.start,
                    end: r.end,
                    score: r.score,
                }),
                None => {
                    debug!(entity_type = %r.entity_type, "Ignoring entity outside the taxonomy");
                    None
                }
            })
            .collect();

        Ok(spans)
    }

    async fn anonymize(&self, text: &str, spans: &[EntitySpan]) -> Result<String, PrivacyError> {
        let url = format!("{}/anonymize", self.anonymizer_url);
        let body = AnonymizeRequest {
            text,
            analyzer_results: spans
                .iter()
                .map(|s| RecognizerResult {
                    entity_type: s.kind.label().to_string(),
                    start: s.start,
                    end: s.end,
                    score: s.score,
                })
                .collect(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PrivacyError::EngineUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            warn!(status, "Anonymizer returned error");
            return Err(PrivacyError::AnonymizationFailed(format!(
                "Anonymizer returned status {status}"
            )));
        }

        let result: AnonymizeResponse = response.json().await.map_err(|e| {
            PrivacyError::AnonymizationFailed(format!("Failed to parse anonymizer response: {e}"))
        })?;
        Ok(result.text)
    }
}

// --- Presidio API types (internal) ---

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
    language: &'a str,
    entities: Vec<&'static str>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RecognizerResult {
    entity_type: String,
    start: usize,
    end: usize,
    score: f32,
}

#[derive(Debug, Serialize)]
struct AnonymizeRequest<'a> {
    text: &'a str,
    analyzer_results: Vec<RecognizerResult>,
}

#[derive(Debug, Deserialize)]
struct AnonymizeResponse {
    text: String,
}
