//! Offline indexer: loads flat `.txt` documents into the knowledge store.

use brewline_core::error::IndexError;
use brewline_core::knowledge::{Document, VectorStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Outcome of an indexing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub files_indexed: usize,
    pub skipped: usize,
}

/// Walks directories for `*.txt` files and adds them to a vector store.
pub struct Indexer {
    store: Arc<dyn VectorStore>,
}

impl Indexer {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// Index several directories in one run.
    ///
    /// Every directory is checked and read before anything is written.
    /// With `rebuild`, the documents replace the store contents in one
    /// swap, so a failed run leaves the previous store in place; otherwise
    /// they are appended to what is already there.
    pub async fn index_directories(
        &self,
        dirs: &[PathBuf],
        rebuild: bool,
    ) -> Result<IndexReport, IndexError> {
        for dir in dirs {
            if !dir.is_dir() {
                return Err(IndexError::DirectoryNotFound(dir.display().to_string()));
            }
        }

        let mut documents = Vec::new();
        let mut skipped = 0;
        for dir in dirs {
            let (docs, dir_skipped) = read_directory(dir)?;
            documents.extend(docs);
            skipped += dir_skipped;
        }

        let files_indexed = if rebuild {
            info!(store = %self.store.name(), documents = documents.len(), "Rebuilding knowledge store");
            self.store.replace_documents(documents).await?
        } else if documents.is_empty() {
            0
        } else {
            self.store.add_documents(documents).await?
        };

        info!(files_indexed, skipped, "Indexing complete");
        Ok(IndexReport {
            files_indexed,
            skipped,
        })
    }

    /// Append every `*.txt` file under `dir` (recursively) to the store.
    pub async fn index_directory(&self, dir: &Path) -> Result<IndexReport, IndexError> {
        if !dir.is_dir() {
            return Err(IndexError::DirectoryNotFound(dir.display().to_string()));
        }

        let (documents, skipped) = read_directory(dir)?;
        let files_indexed = if documents.is_empty() {
            0
        } else {
            self.store.add_documents(documents).await?
        };

        info!(dir = %dir.display(), files_indexed, skipped, "Indexing complete");
        Ok(IndexReport {
            files_indexed,
            skipped,
        })
    }
}

/// Read every non-empty `*.txt` file under `dir`. Returns the documents and
/// how many files were skipped as empty or unreadable.
fn read_directory(dir: &Path) -> Result<(Vec<Document>, usize), IndexError> {
    let files = collect_text_files(dir);
    if files.is_empty() {
        return Err(IndexError::NoDocuments(dir.display().to_string()));
    }

    info!(dir = %dir.display(), files = files.len(), "Reading documents");

    let mut documents = Vec::with_capacity(files.len());
    let mut skipped = 0;
    for path in &files {
        match std::fs::read_to_string(path) {
            Ok(content) if !content.trim().is_empty() => documents.push(Document {
                content,
                source: path.display().to_string(),
            }),
            Ok(_) => {
                warn!(path = %path.display(), "Skipping empty document");
                skipped += 1;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable document");
                skipped += 1;
            }
        }
    }
    Ok((documents, skipped))
}

/// Sorted `*.txt` paths under `dir`. Symlinks are not followed.
fn collect_text_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "txt"))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}
