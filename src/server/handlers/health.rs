use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// Liveness plus reachability of the configured model backend. The server
/// stays up while the backend is down; `status` reports `degraded` instead.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let llm_reachable = match state.llm.health_check().await {
        Ok(reachable) => reachable,
        Err(e) => {
            tracing::warn!("LLM health check failed: {}", e);
            false
        }
    };

    Json(json!({
        "status": if llm_reachable { "ok" } else { "degraded" },
        "provider": state.llm.provider_name(),
        "llm_reachable": llm_reachable,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::handlers::test_support::app_state;
    use serde_json::Value;

    #[tokio::test]
    async fn reports_backend_reachability() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = app_state(&dir, |_| Ok("x".into())).await;

        let response = health(State(state)).await.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let status: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(status["status"], "ok");
        assert_eq!(status["provider"], "scripted");
        assert_eq!(status["llm_reachable"], true);
    }
}
