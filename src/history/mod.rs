//! Session checkpoints.
//!
//! A checkpoint is the last saved `ConversationState` of a session. The
//! workflow loads it at the start of a run and saves after each step.

mod memory;
mod sqlite;

use async_trait::async_trait;

use crate::core::errors::ApiError;
use crate::graph::ConversationState;

pub use memory::InMemoryCheckpointStore;
pub use sqlite::SqliteCheckpointStore;

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>, ApiError>;

    /// Replaces the checkpoint stored under `state.session_id`.
    async fn save(&self, state: &ConversationState) -> Result<(), ApiError>;

    /// Returns whether a checkpoint existed.
    async fn delete(&self, session_id: &str) -> Result<bool, ApiError>;
}
