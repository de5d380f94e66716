//! Knowledge retriever: customer-scoped lookup with a general fallback.
//!
//! Retrieval never fails the turn. A missing store, an embedding failure
//! or an empty result all come back as [`RetrievalResult::not_found`].

use brewline_core::knowledge::{Passage, RetrievalResult, VectorStore};
use brewline_core::message::CustomerId;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Looks up context passages for a query.
#[derive(Clone)]
pub struct KnowledgeRetriever {
    store: Option<Arc<dyn VectorStore>>,
}

impl KnowledgeRetriever {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store: Some(store) }
    }

    /// A retriever with no store; every lookup is `not_found`.
    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Nearest passages to `query`, labeled in rank order.
    pub async fn retrieve_general(&self, query: &str, k: usize) -> RetrievalResult {
        let Some(store) = &self.store else {
            return RetrievalResult::not_found();
        };

        match store.similarity_search(query, k).await {
            Ok(passages) => {
                debug!(count = passages.len(), "General retrieval");
                RetrievalResult::from_passages(&passages)
            }
            Err(e) => {
                warn!(error = %e, "Knowledge retrieval failed");
                RetrievalResult::not_found()
            }
        }
    }

    /// Customer-scoped lookup.
    ///
    /// Searches with the customer id prefixed to the query and keeps only
    /// passages whose text contains the id. When none qualify, falls back to
    /// [`retrieve_general`](Self::retrieve_general) with the plain query.
    ///
    /// The filter is a literal substring match, so an id that is a prefix of
    /// another (`CUST-1` / `CUST-10`) also matches the longer one.
    pub async fn retrieve_for_customer(
        &self,
        customer: &CustomerId,
        query: &str,
        k: usize,
    ) -> RetrievalResult {
        let Some(store) = &self.store else {
            return RetrievalResult::not_found();
        };

        let customer_query = format!("{customer} {query}");
        let passages = match store.similarity_search(&customer_query, k).await {
            Ok(passages) => passages,
            Err(e) => {
                warn!(customer = %customer, error = %e, "Customer retrieval failed");
                return RetrievalResult::not_found();
            }
        };

        let owned: Vec<Passage> = passages
            .into_iter()
            .filter(|p| p.content.contains(customer.as_str()))
            .collect();

        if !owned.is_empty() {
            info!(customer = %customer, count = owned.len(), "Retrieved customer passages");
            return RetrievalResult::from_passages(&owned);
        }

        debug!(customer = %customer, "No customer passages, falling back to general search");
        self.retrieve_general(query, k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_store::tests::KeywordEmbedder;
    use crate::file_store::FileVectorStore;
    use async_trait::async_trait;
    use brewline_core::error::RetrievalError;
    use brewline_core::knowledge::Document;

    async fn store_with(docs: &[&str]) -> Arc<dyn VectorStore> {
        let store = FileVectorStore::in_memory(Arc::new(KeywordEmbedder), "test");
        store
            .add_documents(
                docs.iter()
                    .map(|d| Document {
                        content: d.to_string(),
                        source: "test.txt".into(),
                    })
                    .collect(),
            )
            .await
            .unwrap();
        Arc::new(store)
    }

    struct BrokenStore;

    #[async_trait]
    impl VectorStore for BrokenStore {
        fn name(&self) -> &str {
            "broken"
        }
        async fn similarity_search(&self, _q: &str, _k: usize) -> Result<Vec<Passage>, RetrievalError> {
            Err(RetrievalError::EmbeddingFailed("connection refused".into()))
        }
        async fn add_documents(&self, _d: Vec<Document>) -> Result<usize, RetrievalError> {
            Err(RetrievalError::StoreUnavailable("broken".into()))
        }
        async fn count(&self) -> Result<usize, RetrievalError> {
            Ok(0)
        }
        async fn clear(&self) -> Result<(), RetrievalError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn customer_passages_are_preferred() {
        let retriever = KnowledgeRetriever::new(
            store_with(&[
                "CUST-001 John Doe. Favourite: Hot Cocoa.",
                "Store hours: 7am to 7pm",
            ])
            .await,
        );

        let result = retriever
            .retrieve_for_customer(&CustomerId::new("CUST-001"), "my usual cocoa", 3)
            .await;
        assert!(result.found());
        assert!(result.context_text().starts_with("Context 1: CUST-001"));
        assert!(!result.context_text().contains("Store hours"));
    }

    #[tokio::test]
    async fn falls_back_to_general_when_no_profile_matches() {
        let retriever =
            KnowledgeRetriever::new(store_with(&["Store hours: 7am to 7pm", "Latte menu"]).await);
        let query = "what are your hours";

        let scoped = retriever
            .retrieve_for_customer(&CustomerId::new("CUST-777"), query, 3)
            .await;
        let general = retriever.retrieve_general(query, 3).await;

        assert!(scoped.found());
        assert_eq!(scoped, general);
    }

    #[tokio::test]
    async fn disabled_retriever_finds_nothing() {
        let retriever = KnowledgeRetriever::disabled();
        assert!(!retriever.is_enabled());
        let result = retriever
            .retrieve_for_customer(&CustomerId::new("CUST-001"), "cocoa", 3)
            .await;
        assert_eq!(result, RetrievalResult::not_found());
    }

    #[tokio::test]
    async fn store_errors_degrade_to_not_found() {
        let retriever = KnowledgeRetriever::new(Arc::new(BrokenStore));
        assert!(retriever.is_enabled());

        let scoped = retriever
            .retrieve_for_customer(&CustomerId::new("CUST-001"), "cocoa", 3)
            .await;
        assert!(!scoped.found());
        assert!(scoped.context_text().is_empty());
        assert!(!retriever.retrieve_general("cocoa", 3).await.found());
    }

    #[tokio::test]
    async fn empty_store_is_not_found() {
        let retriever = KnowledgeRetriever::new(store_with(&[]).await);
        assert!(!retriever.retrieve_general("cocoa", 3).await.found());
    }
}
