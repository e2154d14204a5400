use std::sync::Arc;

use crate::core::config::{AppConfig, ProviderSettings};
use crate::core::errors::ApiError;
use crate::llm::openai::OpenAiCompatibleProvider;
use crate::llm::provider::LlmProvider;
use crate::llm::types::ChatRequest;

/// Binds a provider to the chat and embedding models chosen in config.
#[derive(Clone)]
pub struct LlmService {
    provider: Arc<dyn LlmProvider>,
    chat_model: String,
    embedding_model: String,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
}

impl LlmService {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        chat_model: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            chat_model: chat_model.into(),
            embedding_model: embedding_model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Builds the active provider from config. Unknown provider names and
    /// missing API keys are configuration errors.
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        let (name, settings) = config.active_provider()?;
        tracing::info!(
            "Loading LLM provider '{}' (kind={}, model={})",
            name,
            settings.kind.as_str(),
            settings.model
        );
        let provider = OpenAiCompatibleProvider::from_settings(settings)?;
        Ok(Self::with_settings(Arc::new(provider), settings))
    }

    pub fn with_settings(provider: Arc<dyn LlmProvider>, settings: &ProviderSettings) -> Self {
        Self {
            provider,
            chat_model: settings.model.clone(),
            embedding_model: settings.embedding_model.clone(),
            temperature: Some(settings.temperature),
            max_tokens: settings.max_tokens,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// One chat call with a fully rendered prompt as the only user turn.
    pub async fn complete(&self, prompt: impl Into<String>) -> Result<String, ApiError> {
        let request = ChatRequest::from_prompt(prompt)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        self.provider.chat(request, &self.chat_model).await
    }

    pub async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        self.provider.embed(inputs, &self.embedding_model).await
    }

    pub async fn health_check(&self) -> Result<bool, ApiError> {
        self.provider.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedProvider;

    #[tokio::test]
    async fn complete_sends_prompt_as_single_user_turn() {
        let provider = Arc::new(ScriptedProvider::constant("ok"));
        let service = LlmService::new(provider.clone(), "chat", "embed");

        let reply = service.complete("What is the price?").await.unwrap();

        assert_eq!(reply, "ok");
        assert_eq!(provider.prompts(), vec!["What is the price?".to_string()]);
    }

    #[tokio::test]
    async fn embed_skips_provider_for_empty_input() {
        let provider = Arc::new(ScriptedProvider::constant("ok"));
        let service = LlmService::new(provider.clone(), "chat", "embed");

        assert!(service.embed(&[]).await.unwrap().is_empty());
        assert_eq!(provider.embed_calls(), 0);

        let vectors = service.embed(&["laptop".to_string()]).await.unwrap();
        assert_eq!(vectors.len(), 1);
        assert_eq!(provider.embed_calls(), 1);
    }
}
