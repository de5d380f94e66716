//! Builds the long-lived turn collaborators from configuration, once.

use crate::orchestrator::TurnOrchestrator;
use brewline_config::AppConfig;
use brewline_core::error::ProviderError;
use brewline_memory::{FileVectorStore, KnowledgeRetriever, SessionStore};
use brewline_privacy::PrivacyGuard;
use std::sync::Arc;
use tracing::{info, warn};

/// Open the knowledge store if it is enabled and has been indexed.
///
/// A missing store disables retrieval instead of failing startup.
pub fn build_retriever(config: &AppConfig) -> Result<KnowledgeRetriever, ProviderError> {
    let knowledge = &config.knowledge;
    if !knowledge.enabled {
        info!("Knowledge retrieval disabled by configuration");
        return Ok(KnowledgeRetriever::disabled());
    }

    if !FileVectorStore::exists(&knowledge.store_path) {
        warn!(
            path = %knowledge.store_path.display(),
            "Knowledge store not found, retrieval disabled. Run `brewline index` to build it"
        );
        return Ok(KnowledgeRetriever::disabled());
    }

    let embedder = brewline_providers::build_embedding_provider(config)?;
    let store = FileVectorStore::open(
        knowledge.store_path.clone(),
        embedder,
        knowledge.embedding_model.clone(),
    );
    info!(path = %knowledge.store_path.display(), "Knowledge store loaded");
    Ok(KnowledgeRetriever::new(Arc::new(store)))
}

/// Wire a [`TurnOrchestrator`] with a fresh session store.
///
/// Fails only when the completion provider cannot be configured.
pub fn build_orchestrator(config: &AppConfig) -> Result<TurnOrchestrator, ProviderError> {
    let completion = brewline_providers::build_completion_client(config)?;
    let retriever = build_retriever(config)?;
    let guard = PrivacyGuard::from_config(&config.privacy);
    let sessions = Arc::new(SessionStore::new(config.memory.history_cap()));

    Ok(TurnOrchestrator::from_config(
        config, guard, retriever, completion, sessions,
    ))
}
