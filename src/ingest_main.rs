use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use prod_assistant::core::config::{AppPaths, ConfigService};
use prod_assistant::core::logging;
use prod_assistant::llm::LlmService;
use prod_assistant::rag::{CatalogueIngestor, RagStore, SqliteRagStore};

const DEFAULT_CATALOGUE: &str = "data/product_reviews.csv";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, "ingest.log");

    let csv_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.project_root.join(DEFAULT_CATALOGUE));
    if !csv_path.exists() {
        anyhow::bail!("Catalogue CSV not found at {}", csv_path.display());
    }

    let settings = ConfigService::new(paths.clone())
        .load_settings()
        .context("Failed to load configuration")?;
    let llm = LlmService::from_config(&settings).context("Failed to build LLM service")?;

    let store: Arc<dyn RagStore> = Arc::new(
        SqliteRagStore::with_path(paths.catalogue_db_path.clone())
            .await
            .context("Failed to open catalogue store")?,
    );

    tracing::info!(
        "Ingesting {} into {} (embedding model {})",
        csv_path.display(),
        paths.catalogue_db_path.display(),
        llm.embedding_model()
    );

    let ingestor = CatalogueIngestor::new(llm, store.clone(), settings.retriever.batch_size);
    let report = ingestor.ingest_file(&csv_path).await?;

    tracing::info!(
        "Stored {} of {} rows ({} skipped, reindexed: {}); catalogue now holds {} products",
        report.records_stored,
        report.rows_read,
        report.rows_skipped,
        report.reindexed,
        store.count().await?
    );

    Ok(())
}
