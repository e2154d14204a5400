use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CheckpointStore;
use crate::core::errors::ApiError;
use crate::graph::ConversationState;

/// Process-local checkpoints; lost on restart.
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    states: RwLock<HashMap<String, ConversationState>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>, ApiError> {
        Ok(self.states.read().await.get(session_id).cloned())
    }

    async fn save(&self, state: &ConversationState) -> Result<(), ApiError> {
        self.states
            .write()
            .await
            .insert(state.session_id.clone(), state.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<bool, ApiError> {
        Ok(self.states.write().await.remove(session_id).is_some())
    }
}
