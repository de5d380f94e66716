//! Privacy trait: entity recognition and anonymization of free text.
//!
//! The recognition engine is a black box: it decides which spans are PII
//! and how overlapping spans are resolved. Brewline only chooses the
//! taxonomy it asks for and what to do when the engine fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use crate::error::PrivacyError;

/// The fixed PII taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    PhoneNumber,
    EmailAddress,
    Person,
    CreditCard,
    IbanCode,
    UsSsn,
}

impl EntityKind {
    /// Every kind in the taxonomy.
    pub const ALL: [EntityKind; 6] = [
        EntityKind::PhoneNumber,
        EntityKind::EmailAddress,
        EntityKind::Person,
        EntityKind::CreditCard,
        EntityKind::IbanCode,
        EntityKind::UsSsn,
    ];

    /// Engine-facing label, also used inside placeholders.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PhoneNumber => "PHONE_NUMBER",
            Self::EmailAddress => "EMAIL_ADDRESS",
            Self::Person => "PERSON",
            Self::CreditCard => "CREDIT_CARD",
            Self::IbanCode => "IBAN_CODE",
            Self::UsSsn => "US_SSN",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.label() == label)
    }

    /// Type-labeled placeholder that replaces a detected span.
    pub fn placeholder(&self) -> String {
        format!("<{}>", self.label())
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One recognized entity in the analyzed text.
///
/// `start` and `end` are positions as the producing engine counts them: the
/// pattern engine uses byte offsets, Presidio uses character offsets. Pass
/// spans only to the `anonymize` of the engine that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub kind: EntityKind,
    pub start: usize,
    pub end: usize,
    pub score: f32,
}

/// Outcome of masking one text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskingResult {
    pub masked_text: String,
    pub pii_detected: bool,
    pub entity_kinds: BTreeSet<String>,
}

impl MaskingResult {
    /// The text passes through untouched: nothing found, or the engine failed.
    pub fn unmasked(text: impl Into<String>) -> Self {
        Self {
            masked_text: text.into(),
            pii_detected: false,
            entity_kinds: BTreeSet::new(),
        }
    }
}

/// The core PiiEngine trait.
///
/// Implementations: Presidio-compatible HTTP services, local regex patterns.
#[async_trait]
pub trait PiiEngine: Send + Sync {
    /// The engine name (e.g., "presidio", "pattern").
    fn name(&self) -> &str;

    /// Find entities of the requested kinds in `text`.
    async fn analyze(
        &self,
        text: &str,
        entities: &[EntityKind],
        language: &str,
    ) -> std::result::Result<Vec<EntitySpan>, PrivacyError>;

    /// Replace the given spans with type-labeled placeholders.
    async fn anonymize(
        &self,
        text: &str,
        spans: &[EntitySpan],
    ) -> std::result::Result<String, PrivacyError>;
}
