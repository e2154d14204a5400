//! Deterministic in-process provider.
//!
//! Chat replies come from a caller-supplied responder; embeddings are hashed
//! bags of lowercase words so that texts sharing words land close together.
//! Used by the test suites and by offline smoke runs.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::errors::ApiError;
use super::provider::LlmProvider;
use super::types::ChatRequest;

const EMBEDDING_DIMS: usize = 64;

type Responder = dyn Fn(&str) -> Result<String, ApiError> + Send + Sync;

pub struct ScriptedProvider {
    responder: Arc<Responder>,
    prompts: Mutex<Vec<String>>,
    embed_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, ApiError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            prompts: Mutex::new(Vec::new()),
            embed_calls: AtomicUsize::new(0),
        }
    }

    /// Always answers with the same text.
    pub fn constant(reply: impl Into<String>) -> Self {
        let reply = reply.into();
        Self::new(move |_| Ok(reply.clone()))
    }

    /// Every prompt seen by `chat`, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn embed_text(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; EMBEDDING_DIMS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let slot = (hasher.finish() % EMBEDDING_DIMS as u64) as usize;
            vector[slot] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        Ok(true)
    }

    async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, ApiError> {
        let prompt = request.last_content().to_string();
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.clone());
        }
        (self.responder)(&prompt)
    }

    async fn embed(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        Ok(inputs.iter().map(|text| Self::embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_prompts_and_replies() {
        let provider = ScriptedProvider::new(|prompt| Ok(format!("echo: {}", prompt)));
        let reply = provider
            .chat(ChatRequest::from_prompt("hi"), "m")
            .await
            .unwrap();

        assert_eq!(reply, "echo: hi");
        assert_eq!(provider.prompts(), vec!["hi".to_string()]);
    }

    #[test]
    fn shared_words_produce_identical_slots() {
        let a = ScriptedProvider::embed_text("iPhone 15 price");
        let b = ScriptedProvider::embed_text("PRICE of the iphone 15");
        let overlap: f32 = a.iter().zip(b.iter()).map(|(x, y)| x.min(*y)).sum();
        assert!(overlap >= 3.0);
    }
}
