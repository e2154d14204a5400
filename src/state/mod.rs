use std::sync::Arc;

use crate::core::config::{AppConfig, AppPaths, CheckpointBackend, ConfigService};
use crate::graph::AgenticRag;
use crate::history::{CheckpointStore, InMemoryCheckpointStore, SqliteCheckpointStore};
use crate::llm::LlmService;
use crate::rag::{RagStore, Retriever, SqliteRagStore, VectorRetriever};

pub mod error;

pub use error::InitializationError;

/// Application state shared across all routes.
///
/// Contains references to:
/// - Configuration and paths
/// - The catalogue store and the checkpoint store
/// - The LLM service
/// - The workflow engine
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: Arc<AppConfig>,
    pub llm: LlmService,
    pub rag_store: Arc<dyn RagStore>,
    pub checkpoints: Arc<dyn CheckpointStore>,
    pub engine: Arc<AgenticRag>,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// 1. Loading and validating configuration
    /// 2. Opening the catalogue and checkpoint databases
    /// 3. Building the LLM service for the active provider
    /// 4. Building the workflow engine
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config
            .load_settings()
            .map_err(|e| InitializationError::Config(e.into()))?;

        let checkpoints: Arc<dyn CheckpointStore> = match settings.workflow.checkpoint_backend {
            CheckpointBackend::Sqlite => Arc::new(
                SqliteCheckpointStore::new(paths.db_path.clone())
                    .await
                    .map_err(|e| InitializationError::History(e.into()))?,
            ),
            CheckpointBackend::Memory => {
                tracing::warn!("Using in-memory checkpoints; sessions are lost on restart");
                Arc::new(InMemoryCheckpointStore::new())
            }
        };

        let rag_store: Arc<dyn RagStore> = Arc::new(
            SqliteRagStore::with_path(paths.catalogue_db_path.clone())
                .await
                .map_err(|e| InitializationError::Rag(e.into()))?,
        );

        let llm = LlmService::from_config(&settings).map_err(|e| InitializationError::Llm(e.into()))?;

        match rag_store.embedding_model().await {
            Ok(Some(model)) if model != llm.embedding_model() => tracing::warn!(
                "Catalogue was embedded with '{}' but '{}' is configured; re-run prod-ingest",
                model,
                llm.embedding_model()
            ),
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to read catalogue metadata: {}", e),
        }

        Self::with_components(paths, config, settings, llm, rag_store, checkpoints)
    }

    /// Assembles the state from already-built collaborators.
    pub fn with_components(
        paths: Arc<AppPaths>,
        config: ConfigService,
        settings: AppConfig,
        llm: LlmService,
        rag_store: Arc<dyn RagStore>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Result<Arc<Self>, InitializationError> {
        let retriever: Arc<dyn Retriever> = Arc::new(VectorRetriever::new(
            llm.clone(),
            rag_store.clone(),
            settings.retriever.top_k,
        ));

        let engine = Arc::new(
            AgenticRag::from_config(&settings, llm.clone(), retriever, checkpoints.clone())
                .map_err(|e| InitializationError::Graph(e.into()))?,
        );

        Ok(Arc::new(AppState {
            paths,
            config,
            settings: Arc::new(settings),
            llm,
            rag_store,
            checkpoints,
            engine,
        }))
    }
}
