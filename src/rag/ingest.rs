//! Catalogue ingestion: product review CSV -> embedded records in a RagStore.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use super::store::{EvidenceItem, ProductMetadata, RagStore};
use crate::core::errors::ApiError;
use crate::llm::LlmService;

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "product_id",
    "product_title",
    "rating",
    "total_reviews",
    "price",
    "top_reviews",
];

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub records_stored: usize,
    pub reindexed: bool,
}

pub fn read_catalogue(path: &Path) -> Result<(Vec<EvidenceItem>, usize), ApiError> {
    let file = std::fs::File::open(path).map_err(|e| {
        ApiError::BadRequest(format!("Cannot open catalogue {}: {}", path.display(), e))
    })?;
    read_catalogue_from(file)
}

/// Parses catalogue rows. Returns the items plus the number of rows skipped
/// for lacking a product id.
pub fn read_catalogue_from<R: Read>(reader: R) -> Result<(Vec<EvidenceItem>, usize), ApiError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| ApiError::BadRequest(format!("Invalid catalogue header: {}", e)))?
        .clone();
    let columns: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name, idx))
        .collect();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|name| !columns.contains_key(name))
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Catalogue is missing columns: {}",
            missing.join(", ")
        )));
    }

    let mut items = Vec::new();
    let mut skipped = 0;

    for (line, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|e| {
            ApiError::BadRequest(format!("Invalid catalogue row {}: {}", line + 2, e))
        })?;
        let field = |name: &str| -> Option<String> {
            columns
                .get(name)
                .and_then(|idx| record.get(*idx))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let Some(product_id) = field("product_id") else {
            tracing::warn!("Skipping catalogue row {} without product_id", line + 2);
            skipped += 1;
            continue;
        };

        items.push(EvidenceItem::new(
            field("top_reviews").unwrap_or_default(),
            ProductMetadata {
                product_id,
                title: field("product_title"),
                rating: field("rating"),
                total_reviews: field("total_reviews"),
                price: field("price"),
            },
        ));
    }

    Ok((items, skipped))
}

/// Embeds catalogue items in batches and writes them to the store.
pub struct CatalogueIngestor {
    llm: LlmService,
    store: Arc<dyn RagStore>,
    batch_size: usize,
}

impl CatalogueIngestor {
    pub fn new(llm: LlmService, store: Arc<dyn RagStore>, batch_size: usize) -> Self {
        Self {
            llm,
            store,
            batch_size: batch_size.max(1),
        }
    }

    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport, ApiError> {
        let (items, skipped) = read_catalogue(path)?;
        let mut report = self.ingest(items).await?;
        report.rows_read += skipped;
        report.rows_skipped = skipped;
        Ok(report)
    }

    /// Stored vectors from a different embedding model are discarded first.
    pub async fn ingest(&self, items: Vec<EvidenceItem>) -> Result<IngestReport, ApiError> {
        let mut report = IngestReport {
            rows_read: items.len(),
            ..IngestReport::default()
        };

        let model = self.llm.embedding_model().to_string();
        let stored_model = self.store.embedding_model().await?;
        if stored_model.as_deref() != Some(model.as_str()) {
            tracing::info!(
                "Embedding model changed ({:?} -> {}), clearing catalogue",
                stored_model,
                model
            );
            self.store.reindex_with_model(&model).await?;
            report.reindexed = true;
        }

        for batch in items.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(EvidenceItem::embedding_text).collect();
            let embeddings = self.llm.embed(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(ApiError::upstream(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                )));
            }

            let rows: Vec<(EvidenceItem, Vec<f32>)> =
                batch.iter().cloned().zip(embeddings).collect();
            self.store.upsert_batch(rows).await?;
            report.records_stored += batch.len();
            tracing::debug!("Stored {}/{} catalogue records", report.records_stored, report.rows_read);
        }

        tracing::info!(
            "Catalogue ingestion finished: {} stored, {} skipped",
            report.records_stored,
            report.rows_skipped
        );
        Ok(report)
    }
}
