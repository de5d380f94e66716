//! Privacy guard: masks PII before text goes anywhere else.
//!
//! The guard never fails. Engine errors are logged and the text passes
//! through unmasked.

use brewline_config::PrivacyConfig;
use brewline_core::privacy::{EntityKind, MaskingResult, PiiEngine};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::pattern::PatternEngine;
use crate::presidio::PresidioEngine;

#[derive(Clone)]
pub struct PrivacyGuard {
    engine: Option<Arc<dyn PiiEngine>>,
    entities: Vec<EntityKind>,
    language: String,
}

impl PrivacyGuard {
    /// Guard over `engine` using the full entity taxonomy.
    pub fn new(engine: Arc<dyn PiiEngine>, language: impl Into<String>) -> Self {
        Self {
            engine: Some(engine),
            entities: EntityKind::ALL.to_vec(),
            language: language.into(),
        }
    }

    /// A guard with no engine; every text passes through unmasked.
    pub fn disabled() -> Self {
        Self {
            engine: None,
            entities: EntityKind::ALL.to_vec(),
            language: "en".into(),
        }
    }

    /// Build the configured engine. An engine that cannot be constructed
    /// leaves the guard disabled.
    pub fn from_config(config: &PrivacyConfig) -> Self {
        if !config.enabled {
            info!("PII protection disabled by configuration");
            return Self::disabled();
        }

        let engine: Result<Arc<dyn PiiEngine>, _> = match config.engine.as_str() {
            "presidio" => PresidioEngine::new(
                &config.analyzer_url,
                &config.anonymizer_url,
                Duration::from_secs(config.timeout_secs),
            )
            .map(|e| Arc::new(e) as Arc<dyn PiiEngine>),
            "pattern" => PatternEngine::new().map(|e| Arc::new(e) as Arc<dyn PiiEngine>),
            other => {
                warn!(engine = %other, "Unknown PII engine, protection disabled");
                return Self::disabled();
            }
        };

        match engine {
            Ok(engine) => {
                info!(engine = %engine.name(), "PII protection enabled");
                Self::new(engine, &config.language)
            }
            Err(e) => {
                warn!(error = %e, "PII engine unavailable, protection disabled");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.engine.is_some()
    }

    /// Replace detected entities with type-labeled placeholders.
    pub async fn mask(&self, text: &str) -> MaskingResult {
        let Some(engine) = &self.engine else {
            return MaskingResult::unmasked(text);
        };

        let spans = match engine.analyze(text, &self.entities, &self.language).await {
            Ok(spans) => spans,
            Err(e) => {
                warn!(engine = %engine.name(), error = %e, "PII analysis failed, passing text through");
                return MaskingResult::unmasked(text);
            }
        };

        if spans.is_empty() {
            return MaskingResult::unmasked(text);
        }

        match engine.anonymize(text, &spans).await {
            Ok(masked_text) => {
                let entity_kinds = spans.iter().map(|s| s.kind.label().to_string()).collect();
                info!(entities = spans.len(), "PII detected and masked");
                MaskingResult {
                    masked_text,
                    pii_detected: true,
                    entity_kinds,
                }
            }
            Err(e) => {
                warn!(engine = %engine.name(), error = %e, "PII anonymization failed, passing text through");
                MaskingResult::unmasked(text)
            }
        }
    }

    /// Entity kinds found in `text`, in order of appearance, without masking.
    pub async fn detect(&self, text: &str) -> Vec<EntityKind> {
        let Some(engine) = &self.engine else {
            return Vec::new();
        };

        match engine.analyze(text, &EntityKind::ALL, &self.language).await {
            Ok(mut spans) => {
                spans.sort_by_key(|s| s.start);
                debug!(entities = spans.len(), "PII entities detected");
                spans.into_iter().map(|s| s.kind).collect()
            }
            Err(e) => {
                warn!(engine = %engine.name(), error = %e, "PII detection failed");
                Vec::new()
            }
        }
    }
}
