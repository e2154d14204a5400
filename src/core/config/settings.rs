//! Typed view over the merged YAML configuration.

use std::collections::{BTreeMap, HashMap};
use std::env;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::ApiError;

pub const PROVIDER_ENV_VAR: &str = "LLM_PROVIDER";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSettings,
    pub retriever: RetrieverSettings,
    pub workflow: WorkflowSettings,
    /// Template overrides keyed by prompt kind (`product_bot`, `grader`, ...).
    pub prompts: HashMap<String, String>,
    pub server: ServerSettings,
}

impl AppConfig {
    pub fn from_value(value: &Value) -> Result<Self, ApiError> {
        serde_json::from_value(value.clone())
            .map_err(|e| ApiError::config(format!("Failed to parse config: {}", e)))
    }

    /// Resolves the active provider block. `LLM_PROVIDER` wins over `llm.active`.
    pub fn active_provider(&self) -> Result<(String, &ProviderSettings), ApiError> {
        let name = env::var(PROVIDER_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.llm.active.clone());
        self.llm.provider(&name).map(|settings| (name, settings))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub active: String,
    pub providers: BTreeMap<String, ProviderSettings>,
}

impl LlmSettings {
    pub fn provider(&self, name: &str) -> Result<&ProviderSettings, ApiError> {
        self.providers.get(name).ok_or_else(|| {
            ApiError::config(format!("LLM provider '{}' not found in config", name))
        })
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        let mut providers = BTreeMap::new();
        providers.insert("lmstudio".to_string(), ProviderSettings::default());
        Self {
            active: "lmstudio".to_string(),
            providers,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    #[default]
    LmStudio,
    Groq,
}

impl ProviderKind {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com",
            ProviderKind::LmStudio => "http://localhost:1234",
            ProviderKind::Groq => "https://api.groq.com/openai",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderKind::LmStudio)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::LmStudio => "lmstudio",
            ProviderKind::Groq => "groq",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub base_url: Option<String>,
    pub model: String,
    pub embedding_model: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
    /// Usually supplied through `secrets.yaml`.
    pub api_key: Option<String>,
    pub api_key_env: Option<String>,
}

impl ProviderSettings {
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.kind.default_base_url().to_string())
    }

    pub fn resolve_api_key(&self) -> Result<Option<String>, ApiError> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(Some(key.clone()));
        }

        if let Some(var) = &self.api_key_env {
            if let Some(key) = env::var(var).ok().filter(|k| !k.trim().is_empty()) {
                return Ok(Some(key));
            }
        }

        if self.kind.requires_api_key() {
            return Err(ApiError::config(format!(
                "Missing API key for provider kind '{}'",
                self.kind.as_str()
            )));
        }

        Ok(None)
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::LmStudio,
            base_url: None,
            model: "local-model".to_string(),
            embedding_model: "text-embedding-nomic-embed-text-v1.5".to_string(),
            temperature: 0.2,
            max_tokens: Some(2048),
            timeout_secs: 60,
            api_key: None,
            api_key_env: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrieverSettings {
    pub top_k: usize,
    /// Rows embedded per provider call during catalogue ingestion.
    pub batch_size: usize,
}

impl Default for RetrieverSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            batch_size: 32,
        }
    }
}

/// What the engine does once the rewrite budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustedPolicy {
    /// Answer from the latest context anyway.
    #[default]
    BestEffort,
    /// Abort the run with a rewrite-limit error.
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointBackend {
    Memory,
    #[default]
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    pub max_rewrites: u32,
    pub exhausted_policy: ExhaustedPolicy,
    pub router_keywords: Vec<String>,
    pub max_steps: usize,
    /// Turns of earlier runs carried into a resumed session, newest kept.
    pub history_window: usize,
    pub checkpoint_each_step: bool,
    pub checkpoint_backend: CheckpointBackend,
}

impl WorkflowSettings {
    /// Steps one refinement cycle takes: routing, retrieving, grading, rewriting.
    pub const STEPS_PER_CYCLE: usize = 4;

    /// Smallest step limit that lets `max_rewrites` rewrites run out before
    /// the runtime does: every cycle plus the final generation.
    pub fn min_steps_for(max_rewrites: u32) -> usize {
        Self::STEPS_PER_CYCLE * (max_rewrites as usize + 1) + 1
    }

    pub fn check_step_budget(&self) -> Result<(), ApiError> {
        let required = Self::min_steps_for(self.max_rewrites);
        if self.max_steps < required {
            return Err(ApiError::config(format!(
                "workflow.max_steps ({}) must be at least {} for workflow.max_rewrites = {}",
                self.max_steps, required, self.max_rewrites
            )));
        }
        Ok(())
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_rewrites: 2,
            exhausted_policy: ExhaustedPolicy::BestEffort,
            router_keywords: vec![
                "price".to_string(),
                "review".to_string(),
                "product".to_string(),
            ],
            max_steps: 50,
            history_window: 20,
            checkpoint_each_step: true,
            checkpoint_backend: CheckpointBackend::Sqlite,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_allowed_origins: Vec::new(),
        }
    }
}
