//! # Brewline Core
//!
//! Domain types, traits, and error definitions for the Brewline support
//! assistant. This crate has **zero framework dependencies**; it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (completion service, vector store, PII
//! engine) is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted doubles
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod knowledge;
pub mod message;
pub mod privacy;
pub mod provider;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use error::{IndexError, PrivacyError, ProviderError, RetrievalError, TurnError};
pub use knowledge::{Document, Passage, RetrievalResult, VectorStore};
pub use message::{CustomerId, History, Message, Role, SessionKey};
pub use privacy::{EntityKind, EntitySpan, MaskingResult, PiiEngine};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use turn::{TurnResult, TurnStage};
