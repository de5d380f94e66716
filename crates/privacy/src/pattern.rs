//! Local PII engine built on regular expressions.
//!
//! Needs no external service, so masking works offline. Recognition is
//! best-effort: structured identifiers (cards, SSNs, emails, phones, IBANs)
//! are matched by shape, person names only after an introduction phrase
//! such as "my name is".

use async_trait::async_trait;
use brewline_core::error::PrivacyError;
use brewline_core::privacy::{EntityKind, EntitySpan, PiiEngine};
use regex::Regex;

/// One recognizer: a pattern and the entity it reports.
#[derive(Debug, Clone)]
struct Recognizer {
    kind: EntityKind,
    pattern: Regex,
    score: f32,
    /// Capture group holding the entity; 0 is the whole match
    group: usize,
}

impl Recognizer {
    fn new(kind: EntityKind, pattern: &str, score: f32, group: usize) -> Result<Self, PrivacyError> {
        let pattern = Regex::new(pattern).map_err(|e| {
            PrivacyError::EngineUnavailable(format!("Invalid {kind} pattern: {e}"))
        })?;
        Ok(Self {
            kind,
            pattern,
            score,
            group,
        })
    }

    fn find(&self, text: &str, out: &mut Vec<EntitySpan>) {
        for caps in self.pattern.captures_iter(text) {
            if let Some(m) = caps.get(self.group) {
                out.push(EntitySpan {
                    kind: self.kind,
                    start: m.start(),
                    end: m.end(),
                    score: self.score,
                });
            }
        }
    }
}

/// Regex-based [`PiiEngine`]. Spans are byte offsets.
#[derive(Debug, Clone)]
pub struct PatternEngine {
    recognizers: Vec<Recognizer>,
}

impl PatternEngine {
    pub fn new() -> Result<Self, PrivacyError> {
        let recognizers = vec![
            Recognizer::new(
                EntityKind::EmailAddress,
                r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
                1.0,
                0,
            )?,
            Recognizer::new(
                EntityKind::IbanCode,
                r"\b[A-Z]{2}\d{2}(?: ?[A-Z0-9]{4}){3,7}(?: ?[A-Z0-9]{1,3})?\b",
                0.95,
                0,
            )?,
            Recognizer::new(
                EntityKind::CreditCard,
                r"\b(?:\d{4}[- ]?){3}\d{4}\b",
                0.9,
                0,
            )?,
            Recognizer::new(EntityKind::UsSsn, r"\b\d{3}-\d{2}-\d{4}\b", 0.85, 0)?,
            Recognizer::new(
                EntityKind::PhoneNumber,
                r"(?:\+?\b1[-. ]?)?(?:\(\d{3}\)|\b\d{3})[-. ]?\d{3}[-. ]?\d{4}\b",
                0.75,
                0,
            )?,
            Recognizer::new(
                EntityKind::Person,
                r"(?:[Mm]y name is|[Tt]his is)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)",
                0.6,
                1,
            )?,
        ];
        Ok(Self { recognizers })
    }
}

/// Keep the best span wherever spans overlap: higher score first, then the
/// longer span. Result is ordered by start offset.
fn resolve_overlaps(mut spans: Vec<EntitySpan>) -> Vec<EntitySpan> {
    spans.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then((b.end - b.start).cmp(&(a.end - a.start)))
            .then(a.start.cmp(&b.start))
    });

    let mut kept: Vec<EntitySpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if kept.iter().all(|k| span.end <= k.start || span.start >= k.end) {
            kept.push(span);
        }
    }
    kept.sort_by_key(|s| s.start);
    kept
}

#[async_trait]
impl PiiEngine for PatternEngine {
    fn name(&self) -> &str {
        "pattern"
    }

    async fn analyze(
        &self,
        text: &str,
        entities: &[EntityKind],
        _language: &str,
    ) -> Result<Vec<EntitySpan>, PrivacyError> {
        let mut spans = Vec::new();
        for recognizer in self
            .recognizers
            .iter()
            .filter(|r| entities.contains(&r.kind))
        {
            recognizer.find(text, &mut spans);
        }
        Ok(resolve_overlaps(spans))
    }

    async fn anonymize(&self, text: &str, spans: &[EntitySpan]) -> Result<String, PrivacyError> {
        let spans = resolve_overlaps(spans.to_vec());

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for span in &spans {
            if span.end > text.len()
                || !text.is_char_boundary(span.start)
                || !text.is_char_boundary(span.end)
            {
                return Err(PrivacyError::AnonymizationFailed(format!(
                    "Span {}..{} is outside the text",
                    span.start, span.end
                )));
            }
            out.push_str(&text[cursor..span.start]);
            out.push_str(&span.kind.placeholder());
            cursor = span.end;
        }
        out.push_str(&text[cursor..]);
        Ok(out)
    }
}
