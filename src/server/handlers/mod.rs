pub mod catalogue;
pub mod chat;
pub mod health;
pub mod sessions;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::core::config::{AppConfig, AppPaths, ConfigService};
    use crate::core::errors::ApiError;
    use crate::history::InMemoryCheckpointStore;
    use crate::llm::{LlmService, ScriptedProvider};
    use crate::rag::{RagStore, SqliteRagStore};
    use crate::state::AppState;

    pub async fn app_state<F>(
        dir: &tempfile::TempDir,
        responder: F,
    ) -> (Arc<AppState>, Arc<dyn RagStore>)
    where
        F: Fn(&str) -> Result<String, ApiError> + Send + Sync + 'static,
    {
        let paths = Arc::new(AppPaths::with_dirs(
            dir.path().to_path_buf(),
            dir.path().join("data"),
        ));
        let rag_store: Arc<dyn RagStore> = Arc::new(
            SqliteRagStore::with_path(paths.catalogue_db_path.clone())
                .await
                .unwrap(),
        );
        let llm = LlmService::new(Arc::new(ScriptedProvider::new(responder)), "chat", "embed");
        let state = AppState::with_components(
            paths.clone(),
            ConfigService::new(paths),
            AppConfig::default(),
            llm,
            rag_store.clone(),
            Arc::new(InMemoryCheckpointStore::new()),
        )
        .unwrap();
        (state, rag_store)
    }
}
