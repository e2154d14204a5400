use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn catalogue_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state.rag_store.count().await?;
    let stored_model = state.rag_store.embedding_model().await?;
    let configured_model = state.llm.embedding_model();

    Ok(Json(json!({
        "records": records,
        "embedding_model": stored_model,
        "configured_embedding_model": configured_model,
        "needs_reindex": stored_model.as_deref().is_some_and(|m| m != configured_model),
        "top_k": state.settings.retriever.top_k
    })))
}
