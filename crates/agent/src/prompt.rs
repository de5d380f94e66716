//! Prompt assembly: persona plus exactly one context block.
//!
//! Assembly is pure. The same persona and retrieval result always give
//! the same instruction text.

use crate::persona::Persona;
use brewline_core::knowledge::RetrievalResult;

const PROFILE_HEADER: &str = "CUSTOMER PROFILE & RELEVANT INFO:";

const PROFILE_GUIDANCE: &str = "\
Use this naturally, the way a barista remembers a regular. Mention their usual order, \
preferences or loyalty status when it helps (\"your usual hot cocoa?\"), and give specific \
business details such as prices, hours and locations when asked.";

const NEW_CUSTOMER_BLOCK: &str = "\
NEW CUSTOMER:
We don't have a profile for this customer yet. Be generally helpful, answer from what you \
know about GroundTruth Coffee, and invite them to explore the menu or ask about our drinks.";

/// Builds the instruction text for one turn.
#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    persona: Persona,
}

impl PromptAssembler {
    pub fn new(persona: Persona) -> Self {
        Self { persona }
    }

    pub fn assemble(&self, retrieval: &RetrievalResult) -> String {
        let block = if retrieval.found() {
            format!(
                "{PROFILE_HEADER}\n{}\n\n{PROFILE_GUIDANCE}",
                retrieval.context_text()
            )
        } else {
            NEW_CUSTOMER_BLOCK.to_string()
        };

        format!("{}\n\n{block}", self.persona.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewline_core::knowledge::Passage;

    fn found(text: &str) -> RetrievalResult {
        RetrievalResult::from_passages(&[Passage {
            id: "p1".into(),
            content: text.into(),
            source: "cust_001.txt".into(),
            score: 0.9,
            embedding: None,
        }])
    }

    #[test]
    fn found_context_gets_profile_block() {
        let prompt = PromptAssembler::default().assemble(&found("CUST-001 loves Hot Cocoa"));
        assert!(prompt.starts_with("You are EVA"));
        assert!(prompt.contains(PROFILE_HEADER));
        assert!(prompt.contains("Context 1: CUST-001 loves Hot Cocoa"));
        assert!(!prompt.contains("NEW CUSTOMER"));
    }

    #[test]
    fn missing_context_gets_new_customer_block() {
        let prompt = PromptAssembler::default().assemble(&RetrievalResult::not_found());
        assert!(prompt.contains("NEW CUSTOMER"));
        assert!(!prompt.contains(PROFILE_HEADER));
    }

    #[test]
    fn assembly_is_deterministic() {
        let assembler = PromptAssembler::new(Persona::new("You are Bean."));
        let retrieval = found("Store hours: 7am to 7pm");
        assert_eq!(assembler.assemble(&retrieval), assembler.assemble(&retrieval));
        assert!(assembler.assemble(&retrieval).starts_with("You are Bean."));
    }
}
