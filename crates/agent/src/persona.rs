//! The assistant's fixed persona.

use brewline_config::PersonaConfig;

/// Built-in persona: EVA, the GroundTruth Coffee assistant.
pub const DEFAULT_PERSONA: &str = "\
You are EVA, a friendly AI assistant for GroundTruth Coffee.

RESPONSE STYLE:
- Keep responses SHORT (2-3 sentences max)
- NO markdown formatting (no **, *, bullets, tables)
- Write like you're texting a friend
- Be helpful and natural

STAY ON TOPIC:
You help with GroundTruth Coffee orders, menu, locations, hours, loyalty and policies. \
If someone asks about something unrelated, politely steer them back to what you can help with.

If you don't have information, just say so - don't make it up.";

/// Persona text given to the completion service at the top of every prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    text: String,
}

impl Persona {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The configured override, or the built-in persona.
    pub fn from_config(config: &PersonaConfig) -> Self {
        match &config.system_prompt_override {
            Some(text) if !text.trim().is_empty() => Self::new(text.trim()),
            _ => Self::default(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA)
    }
}
