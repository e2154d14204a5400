use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// Missing template, unknown provider, invalid settings. Never retried.
    #[error("configuration error: {0}")]
    Config(String),
    /// A language-model, embedding or retrieval collaborator failed.
    #[error("upstream error: {0}")]
    Upstream(String),
    /// The workflow gave up without producing an answer.
    #[error("unanswerable: {0}")]
    Unanswerable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn upstream<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Upstream(err.to_string())
    }

    pub fn config(message: impl Into<String>) -> Self {
        ApiError::Config(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, kind, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "config", msg.clone()),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "upstream", msg.clone()),
            ApiError::Unanswerable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unanswerable", msg.clone())
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg.clone()),
        };

        let body = Json(json!({ "error": message, "kind": kind }));
        (status, body).into_response()
    }
}
