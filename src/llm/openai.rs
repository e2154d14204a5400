use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

use crate::core::config::ProviderSettings;
use crate::core::errors::ApiError;
use super::provider::LlmProvider;
use super::types::ChatRequest;

/// Client for any server speaking the OpenAI `/v1/chat/completions` and
/// `/v1/embeddings` dialect (OpenAI, Groq, LM Studio).
#[derive(Clone)]
pub struct OpenAiCompatibleProvider {
    name: String,
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ApiError> {
        Self::new(
            settings.kind.as_str(),
            settings.base_url(),
            settings.resolve_api_key()?,
            Duration::from_secs(settings.timeout_secs),
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        let url = format!("{}/v1/models", self.base_url);
        let res = self.authorized(self.client.get(&url)).send().await;
        match res {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut body = json!({
            "model": model_id,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(temperature) = request.temperature {
                obj.insert("temperature".to_string(), json!(temperature));
            }
            if let Some(max_tokens) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(max_tokens));
            }
        }

        let res = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "{} chat error ({}): {}",
                self.name, status, text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::upstream)?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(content)
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        let url = format!("{}/v1/embeddings", self.base_url);

        let body = json!({
            "model": model_id,
            "input": inputs,
        });

        let res = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "{} embed error ({}): {}",
                self.name, status, text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::upstream)?;

        let mut embeddings = Vec::new();
        if let Some(data) = payload["data"].as_array() {
            for item in data {
                if let Some(vals) = item["embedding"].as_array() {
                    let vec: Vec<f32> = vals.iter().filter_map(|v| v.as_f64().map(|f| f as f32)).collect();
                    embeddings.push(vec);
                }
            }
        }

        if embeddings.len() != inputs.len() {
            return Err(ApiError::Upstream(format!(
                "{} returned {} embeddings for {} inputs",
                self.name,
                embeddings.len(),
                inputs.len()
            )));
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ProviderKind;
    use crate::llm::types::ChatMessage;

    #[test]
    fn from_settings_trims_trailing_slash_and_resolves_key() {
        let settings = ProviderSettings {
            kind: ProviderKind::OpenAi,
            base_url: Some("https://example.test/".to_string()),
            api_key: Some("sk-test".to_string()),
            ..ProviderSettings::default()
        };

        let provider = OpenAiCompatibleProvider::from_settings(&settings).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.base_url, "https://example.test");
        assert_eq!(provider.api_key.as_deref(), Some("sk-test"));
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_lmstudio_connection() {
        let provider = OpenAiCompatibleProvider::from_settings(&ProviderSettings::default()).unwrap();
        if !provider.health_check().await.unwrap() {
            panic!("LM Studio is not reachable on localhost:1234");
        }

        let req = ChatRequest::new(vec![ChatMessage::user("Hello")]).with_max_tokens(Some(10));
        match provider.chat(req, "local-model").await {
            Ok(response) => println!("LM Studio Chat Response: {}", response),
            Err(e) => println!("LM Studio Chat Error: {}", e),
        }
    }
}
