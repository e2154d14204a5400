use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};

use super::CheckpointStore;
use crate::core::errors::ApiError;
use crate::graph::ConversationState;

/// Checkpoints persisted as JSON documents, one row per session.
#[derive(Clone)]
pub struct SqliteCheckpointStore {
    pool: SqlitePool,
}

impl SqliteCheckpointStore {
    pub async fn new(db_path: PathBuf) -> Result<Self, ApiError> {
        let conn_str = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&conn_str)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to connect to session db: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS checkpoints (
                session_id TEXT PRIMARY KEY,
                state JSON NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init checkpoints table: {}", e)))?;

        Ok(Self { pool })
    }

    pub async fn session_count(&self) -> Result<i64, ApiError> {
        let count: i64 = sqlx::query("SELECT COUNT(*) FROM checkpoints")
            .fetch_one(&self.pool)
            .await
            .map(|r| r.get(0))
            .map_err(ApiError::internal)?;
        Ok(count)
    }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>, ApiError> {
        let row = sqlx::query("SELECT state FROM checkpoints WHERE session_id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row.try_get("state").map_err(ApiError::internal)?;
        let state = serde_json::from_str(&raw).map_err(|e| {
            ApiError::internal(format!("Corrupt checkpoint for session {}: {}", session_id, e))
        })?;
        Ok(Some(state))
    }

    async fn save(&self, state: &ConversationState) -> Result<(), ApiError> {
        let raw = serde_json::to_string(state).map_err(ApiError::internal)?;
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO checkpoints (session_id, state, created_at, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(session_id) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
        )
        .bind(&state.session_id)
        .bind(raw)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM checkpoints WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(result.rows_affected() > 0)
    }
}
