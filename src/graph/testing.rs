//! Shared fixtures for node and runtime tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::node::NodeContext;
use crate::core::config::WorkflowSettings;
use crate::core::errors::ApiError;
use crate::llm::{LlmService, ScriptedProvider};
use crate::prompts::PromptRegistry;
use crate::rag::{EvidenceItem, ProductMetadata, Retriever};

/// Returns the same evidence for every query and records the queries.
pub struct StaticRetriever {
    items: Vec<EvidenceItem>,
    queries: Mutex<Vec<String>>,
}

impl StaticRetriever {
    pub fn new(items: Vec<EvidenceItem>) -> Self {
        Self {
            items,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<EvidenceItem>, ApiError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.items.clone())
    }
}

pub struct TestHarness {
    pub provider: Arc<ScriptedProvider>,
    pub llm: LlmService,
    pub retriever: StaticRetriever,
    pub prompts: PromptRegistry,
    pub settings: WorkflowSettings,
}

impl TestHarness {
    pub fn new<F>(responder: F, evidence: Vec<EvidenceItem>) -> Self
    where
        F: Fn(&str) -> Result<String, ApiError> + Send + Sync + 'static,
    {
        let provider = Arc::new(ScriptedProvider::new(responder));
        Self {
            llm: LlmService::new(provider.clone(), "chat", "embed"),
            provider,
            retriever: StaticRetriever::new(evidence),
            prompts: PromptRegistry::with_defaults(),
            settings: WorkflowSettings::default(),
        }
    }

    pub fn context(&self) -> NodeContext<'_> {
        NodeContext {
            llm: &self.llm,
            retriever: &self.retriever,
            prompts: &self.prompts,
            settings: &self.settings,
            checkpoints: None,
        }
    }
}

pub fn iphone_evidence() -> EvidenceItem {
    EvidenceItem::new(
        "Camera is superb and battery lasts all day.",
        ProductMetadata {
            product_id: "MOBGTAGPTB3VS24W".to_string(),
            title: Some("Apple iPhone 15 (Black, 128 GB)".to_string()),
            rating: Some("4.6".to_string()),
            total_reviews: Some("12,803".to_string()),
            price: Some("₹69,900".to_string()),
        },
    )
}
