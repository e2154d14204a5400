use std::sync::Arc;

use async_trait::async_trait;

use super::store::{EvidenceItem, RagStore};
use crate::core::errors::ApiError;
use crate::llm::LlmService;

/// Query-to-evidence capability consumed by the workflow.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Ordered best-first; may be empty.
    async fn retrieve(&self, query: &str) -> Result<Vec<EvidenceItem>, ApiError>;
}

/// Embeds the query through the language-model provider and returns the
/// `top_k` nearest catalogue records.
pub struct VectorRetriever {
    llm: LlmService,
    store: Arc<dyn RagStore>,
    top_k: usize,
}

impl VectorRetriever {
    pub fn new(llm: LlmService, store: Arc<dyn RagStore>, top_k: usize) -> Self {
        Self {
            llm,
            store,
            top_k: top_k.max(1),
        }
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<EvidenceItem>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.llm.embed(&[query.to_string()]).await?;
        let query_embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::upstream("Embedding provider returned no vector"))?;

        let results = self.store.search(&query_embedding, self.top_k).await?;
        tracing::debug!(
            "Retrieved {} catalogue records (top score {:?})",
            results.len(),
            results.first().map(|r| r.score)
        );

        Ok(results.into_iter().map(|scored| scored.item).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedProvider;
    use crate::rag::sqlite::SqliteRagStore;
    use crate::rag::store::ProductMetadata;

    fn product(id: &str, title: &str, reviews: &str) -> EvidenceItem {
        EvidenceItem::new(
            reviews,
            ProductMetadata {
                product_id: id.to_string(),
                title: Some(title.to_string()),
                ..ProductMetadata::default()
            },
        )
    }

    #[tokio::test]
    async fn returns_nearest_records_limited_to_top_k() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            SqliteRagStore::with_path(dir.path().join("catalogue.db"))
                .await
                .unwrap(),
        );
        let items = vec![
            product("p1", "iPhone 15", "great camera and battery"),
            product("p2", "Galaxy S24", "bright display"),
            product("p3", "Boat earbuds", "deep bass"),
        ];
        store
            .upsert_batch(
                items
                    .iter()
                    .map(|i| (i.clone(), ScriptedProvider::embed_text(&i.embedding_text())))
                    .collect(),
            )
            .await
            .unwrap();

        let llm = LlmService::new(Arc::new(ScriptedProvider::constant("")), "chat", "embed");
        let retriever = VectorRetriever::new(llm, store, 2);

        let results = retriever.retrieve("iphone 15 camera").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].metadata.product_id, "p1");
    }

    #[tokio::test]
    async fn blank_query_skips_embedding() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            SqliteRagStore::with_path(dir.path().join("catalogue.db"))
                .await
                .unwrap(),
        );
        let provider = Arc::new(ScriptedProvider::constant(""));
        let llm = LlmService::new(provider.clone(), "chat", "embed");
        let retriever = VectorRetriever::new(llm, store, 3);

        assert!(retriever.retrieve("   ").await.unwrap().is_empty());
        assert_eq!(provider.embed_calls(), 0);
    }
}
