//! File-backed vector store: embedded passages persisted as JSON lines.
//!
//! Each line of the store file is one JSON-encoded [`Passage`] including its
//! embedding. Passages are loaded into memory on open and the file is
//! rewritten on every mutation (add, clear).
//!
//! Default location: `~/.brewline/knowledge/passages.jsonl`

use async_trait::async_trait;
use brewline_core::error::RetrievalError;
use brewline_core::knowledge::{Document, Passage, VectorStore};
use brewline_core::provider::{EmbeddingRequest, Provider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Texts sent per embedding request while indexing.
const EMBED_BATCH: usize = 16;

/// A vector store kept in memory and optionally mirrored to a JSONL file.
pub struct FileVectorStore {
    path: Option<PathBuf>,
    embedder: Arc<dyn Provider>,
    embedding_model: String,
    passages: Arc<RwLock<Vec<Passage>>>,
}

impl FileVectorStore {
    /// Open the store at `path`, loading any passages already there.
    ///
    /// A missing file starts empty; it is created on first write.
    pub fn open(
        path: PathBuf,
        embedder: Arc<dyn Provider>,
        embedding_model: impl Into<String>,
    ) -> Self {
        let passages = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = passages.len(), "Knowledge store loaded");
        Self {
            path: Some(path),
            embedder,
            embedding_model: embedding_model.into(),
            passages: Arc::new(RwLock::new(passages)),
        }
    }

    /// A store that never touches disk.
    pub fn in_memory(embedder: Arc<dyn Provider>, embedding_model: impl Into<String>) -> Self {
        Self {
            path: None,
            embedder,
            embedding_model: embedding_model.into(),
            passages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Whether a store file exists at `path`.
    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }

    fn load_from_disk(path: &Path) -> Vec<Passage> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<Passage>(line) {
                Ok(passage) => Some(passage),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted knowledge passage");
                    None
                }
            })
            .collect()
    }

    /// Rewrite the store file with `passages`.
    ///
    /// Callers write to disk first and only then swap the in-memory list,
    /// so a failed write leaves both unchanged.
    fn persist(&self, passages: &[Passage]) -> Result<(), RetrievalError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RetrievalError::Storage(format!("Failed to create knowledge directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for passage in passages {
            let line = serde_json::to_string(passage).map_err(|e| {
                RetrievalError::Storage(format!("Failed to serialize passage: {e}"))
            })?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(path, &content)
            .map_err(|e| RetrievalError::Storage(format!("Failed to write knowledge file: {e}")))?;

        Ok(())
    }

    /// Embed `documents` in batches. Nothing is stored.
    async fn embed_documents(&self, documents: &[Document]) -> Result<Vec<Passage>, RetrievalError> {
        let mut passages = Vec::with_capacity(documents.len());

        for batch in documents.chunks(EMBED_BATCH) {
            let embeddings = self
                .embed(batch.iter().map(|d| d.content.clone()).collect())
                .await?;
            for (doc, embedding) in batch.iter().zip(embeddings) {
                passages.push(Passage {
                    id: Uuid::new_v4().to_string(),
                    content: doc.content.clone(),
                    source: doc.source.clone(),
                    score: 0.0,
                    embedding: Some(embedding),
                });
            }
        }
        Ok(passages)
    }

    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let expected = inputs.len();
        let response = self
            .embedder
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs,
            })
            .await
            .map_err(|e| RetrievalError::EmbeddingFailed(e.to_string()))?;

        if response.embeddings.len() != expected {
            return Err(RetrievalError::EmbeddingFailed(format!(
                "Expected {expected} embeddings, got {}",
                response.embeddings.len()
            )));
        }
        Ok(response.embeddings)
    }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Passage>, RetrievalError> {
        if self.passages.read().await.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embed(vec![query.to_string()])
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        let passages = self.passages.read().await;
        Ok(crate::vector::rank_passages(&passages, &query_embedding, k))
    }

    async fn add_documents(&self, documents: Vec<Document>) -> Result<usize, RetrievalError> {
        let added = self.embed_documents(&documents).await?;
        let count = added.len();

        let mut passages = self.passages.write().await;
        let mut candidate = passages.clone();
        candidate.extend(added);
        self.persist(&candidate)?;
        *passages = candidate;

        debug!(added = count, "Passages added to knowledge store");
        Ok(count)
    }

    async fn count(&self) -> Result<usize, RetrievalError> {
        Ok(self.passages.read().await.len())
    }

    async fn clear(&self) -> Result<(), RetrievalError> {
        let mut passages = self.passages.write().await;
        self.persist(&[])?;
        passages.clear();
        Ok(())
    }

    async fn replace_documents(&self, documents: Vec<Document>) -> Result<usize, RetrievalError> {
        let replacement = self.embed_documents(&documents).await?;
        let count = replacement.len();

        let mut passages = self.passages.write().await;
        self.persist(&replacement)?;
        *passages = replacement;

        debug!(count, "Knowledge store replaced");
        Ok(count)
    }
}
