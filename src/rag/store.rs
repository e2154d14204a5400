//! RagStore trait and the product evidence records it holds.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// Structured metadata of one catalogue entry. Every field except the id may
/// be absent in the source data and renders as `N/A`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub product_id: String,
    pub title: Option<String>,
    pub rating: Option<String>,
    pub total_reviews: Option<String>,
    pub price: Option<String>,
}

/// One retrieved record: review text plus product metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub content: String,
    pub metadata: ProductMetadata,
}

impl EvidenceItem {
    pub fn new(content: impl Into<String>, metadata: ProductMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Text that gets embedded for similarity search.
    pub fn embedding_text(&self) -> String {
        match &self.metadata.title {
            Some(title) => format!("{}\n{}", title, self.content),
            None => self.content.clone(),
        }
    }
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredEvidence {
    pub item: EvidenceItem,
    /// Cosine similarity (higher = better).
    pub score: f32,
}

/// Abstract trait for catalogue storage backends.
#[async_trait]
pub trait RagStore: Send + Sync {
    /// Insert or replace records keyed by product id.
    async fn upsert_batch(&self, items: Vec<(EvidenceItem, Vec<f32>)>) -> Result<(), ApiError>;

    /// Nearest records to the query embedding, best first.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredEvidence>, ApiError>;

    async fn count(&self) -> Result<usize, ApiError>;

    /// Embedding model the stored vectors were produced with, if recorded.
    async fn embedding_model(&self) -> Result<Option<String>, ApiError>;

    /// Clear all records and record the new embedding model.
    ///
    /// Used when the embedding model changes and all vectors are invalidated.
    async fn reindex_with_model(&self, embedding_model: &str) -> Result<(), ApiError>;
}
