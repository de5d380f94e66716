//! The per-turn pipeline.
//!
//! ```text
//! Validating → Masking → Retrieving → Assembling → Completing → Recording → Done
//! ```
//!
//! Only validation and completion can fail a turn. Masking fails open,
//! retrieval degrades to "no context", and recording cannot fail.
//!
//! The masked text is the only form of the message that leaves the masking
//! stage: it is the retrieval query, the prompt input and what gets stored.
//!
//! The session lock is taken before the history snapshot and held until both
//! turns are recorded, so same-session turns land in history in order and
//! each one sees the previous exchange.

use crate::persona::Persona;
use crate::prompt::PromptAssembler;
use brewline_config::AppConfig;
use brewline_core::error::TurnError;
use brewline_core::message::{CustomerId, Message, SessionKey};
use brewline_core::turn::{TurnResult, TurnStage};
use brewline_memory::{KnowledgeRetriever, SessionStore};
use brewline_privacy::PrivacyGuard;
use brewline_providers::CompletionClient;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Runs turns against long-lived collaborators built once at startup.
pub struct TurnOrchestrator {
    guard: PrivacyGuard,
    retriever: KnowledgeRetriever,
    assembler: PromptAssembler,
    completion: CompletionClient,
    sessions: Arc<SessionStore>,
    top_k: usize,
    max_message_chars: usize,
}

impl TurnOrchestrator {
    pub fn new(
        guard: PrivacyGuard,
        retriever: KnowledgeRetriever,
        completion: CompletionClient,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            guard,
            retriever,
            assembler: PromptAssembler::default(),
            completion,
            sessions,
            top_k: 3,
            max_message_chars: 2000,
        }
    }

    /// Wire collaborators using persona, retrieval and input limits from config.
    pub fn from_config(
        config: &AppConfig,
        guard: PrivacyGuard,
        retriever: KnowledgeRetriever,
        completion: CompletionClient,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self::new(guard, retriever, completion, sessions)
            .with_persona(Persona::from_config(&config.persona))
            .with_top_k(config.knowledge.top_k)
            .with_max_message_chars(config.chat.max_message_chars)
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.assembler = PromptAssembler::new(persona);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_max_message_chars(mut self, max: usize) -> Self {
        self.max_message_chars = max;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn privacy(&self) -> &PrivacyGuard {
        &self.guard
    }

    pub fn retriever(&self) -> &KnowledgeRetriever {
        &self.retriever
    }

    pub fn model(&self) -> &str {
        self.completion.model()
    }

    /// Run one turn for `customer` in the session labeled `session_label`.
    pub async fn handle_turn(
        &self,
        customer: &CustomerId,
        session_label: &str,
        message: &str,
    ) -> Result<TurnResult, TurnError> {
        let key = SessionKey::new(customer.clone(), session_label);

        debug!(session = %key, stage = %TurnStage::Validating, chars = message.len(), "Turn stage");
        let input = self.validate(message)?;

        debug!(session = %key, stage = %TurnStage::Masking, "Turn stage");
        let masked = self.guard.mask(input).await;

        debug!(session = %key, stage = %TurnStage::Retrieving, "Turn stage");
        let retrieval = self
            .retriever
            .retrieve_for_customer(customer, &masked.masked_text, self.top_k)
            .await;

        debug!(session = %key, stage = %TurnStage::Assembling, "Turn stage");
        let instructions = self.assembler.assemble(&retrieval);

        debug!(session = %key, stage = %TurnStage::Completing, "Turn stage");
        let mut session = self.sessions.lock(&key).await;
        let history = session.history().to_vec();
        let reply = self
            .completion
            .complete(&instructions, &history, &masked.masked_text)
            .await
            .map_err(|e| {
                error!(session = %key, error = %e, "Turn failed at completion");
                TurnError::Completion(e)
            })?;

        debug!(session = %key, stage = %TurnStage::Recording, "Turn stage");
        session.append(Message::user(masked.masked_text));
        session.append(Message::assistant(reply.clone()));
        let history_len = session.history().len();
        drop(session);

        info!(
            session = %key,
            stage = %TurnStage::Done,
            pii_masked = masked.pii_detected,
            context_retrieved = retrieval.found(),
            history_len,
            reply_chars = reply.len(),
            "Turn complete"
        );

        Ok(TurnResult {
            reply_text: reply,
            pii_masked: masked.pii_detected,
            context_retrieved: retrieval.found(),
        })
    }

    /// Trim and bound the raw message. Never mutates any state.
    fn validate<'a>(&self, message: &'a str) -> Result<&'a str, TurnError> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(TurnError::Validation("Message cannot be empty".into()));
        }
        if trimmed.chars().count() > self.max_message_chars {
            return Err(TurnError::Validation(format!(
                "Message is too long (max {} characters)",
                self.max_message_chars
            )));
        }
        Ok(trimmed)
    }
}
