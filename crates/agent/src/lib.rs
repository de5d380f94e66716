//! The turn pipeline for Brewline.
//!
//! Each customer message goes through one pass of:
//!
//! 1. **Validate** the raw text (trimmed, non-empty, bounded length)
//! 2. **Mask** PII with the privacy guard
//! 3. **Retrieve** customer context, falling back to general knowledge
//! 4. **Assemble** persona + context block into instructions
//! 5. **Complete** against the provider with the session's bounded history
//! 6. **Record** the masked user turn and the reply in the session

pub mod orchestrator;
pub mod persona;
pub mod prompt;
pub mod services;

#[cfg(test)]
mod test_helpers;

pub use orchestrator::TurnOrchestrator;
pub use persona::{DEFAULT_PERSONA, Persona};
pub use prompt::PromptAssembler;
pub use services::{build_orchestrator, build_retriever};
