//! Conversation memory and knowledge retrieval for Brewline.
//!
//! - [`SessionStore`]: bounded per-session history, process lifetime only
//! - [`FileVectorStore`]: embedded passages persisted as JSON lines
//! - [`KnowledgeRetriever`]: customer-scoped lookup with general fallback
//! - [`Indexer`]: offline loading of `.txt` documents into the store

pub mod file_store;
pub mod indexer;
pub mod retriever;
pub mod session_store;
pub mod vector;

pub use file_store::FileVectorStore;
pub use indexer::{IndexReport, Indexer};
pub use retriever::KnowledgeRetriever;
pub use session_store::{SessionGuard, SessionStore};
pub use vector::{cosine_similarity, rank_passages};
