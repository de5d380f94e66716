//! Knowledge trait: semantic lookup over a persisted vector store.
//!
//! The knowledge store holds passages (customer profiles, business
//! information) embedded offline by the indexer. At request time the
//! retriever asks it for the passages nearest to a query.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::RetrievalError;

/// A document handed to the store for indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Full text of the document
    pub content: String,

    /// Where the text came from (file path, URL)
    pub source: String,
}

/// A stored passage, as returned by a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Unique ID for this passage
    pub id: String,

    /// The passage text
    pub content: String,

    /// Where the text came from
    pub source: String,

    /// Similarity to the query (set by search operations)
    #[serde(default)]
    pub score: f32,

    /// Embedding vector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// The outcome of a retrieval: a labeled context block, or nothing.
///
/// `found == false` always comes with an empty `context_text`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    context_text: String,
    found: bool,
}

impl RetrievalResult {
    /// No usable context.
    pub fn not_found() -> Self {
        Self::default()
    }

    /// Label passages "Context 1:", "Context 2:", … in the given order.
    ///
    /// An empty slice yields [`RetrievalResult::not_found`].
    pub fn from_passages(passages: &[Passage]) -> Self {
        if passages.is_empty() {
            return Self::not_found();
        }
        let context_text = passages
            .iter()
            .enumerate()
            .map(|(i, p)| format!("Context {}: {}", i + 1, p.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        Self {
            context_text,
            found: true,
        }
    }

    pub fn context_text(&self) -> &str {
        &self.context_text
    }

    pub fn found(&self) -> bool {
        self.found
    }
}

/// The core VectorStore trait.
///
/// Implementations: JSONL file store (production), scripted doubles (tests).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The backend name (e.g., "file").
    fn name(&self) -> &str;

    /// Embed `query` and return up to `k` passages, most similar first.
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> std::result::Result<Vec<Passage>, RetrievalError>;

    /// Embed and store documents. Returns how many were added.
    async fn add_documents(
        &self,
        documents: Vec<Document>,
    ) -> std::result::Result<usize, RetrievalError>;

    /// Number of stored passages.
    async fn count(&self) -> std::result::Result<usize, RetrievalError>;

    /// Remove every passage.
    async fn clear(&self) -> std::result::Result<(), RetrievalError>;

    /// Replace the whole store with `documents`. Returns how many were stored.
    ///
    /// The default clears and then adds, so a failed add leaves the store
    /// empty. Persistent stores should embed first and swap in one write.
    async fn replace_documents(
        &self,
        documents: Vec<Document>,
    ) -> std::result::Result<usize, RetrievalError> {
        self.clear().await?;
        self.add_documents(documents).await
    }
}
