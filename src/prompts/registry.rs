use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::template::PromptTemplate;
use crate::core::errors::ApiError;

const PRODUCT_BOT_PROMPT: &str = "You are an expert EcommerceBot specialized in product recommendations and handling customer queries.
Analyze the provided product titles, ratings, and reviews to provide accurate, helpful responses.
Stay relevant to the context, and keep your answers concise and informative.

CONTEXT:
{context}

QUESTION: {question}

YOUR ANSWER:";

const DIRECT_ANSWER_PROMPT: &str =
    "You are a helpful assistant. Answer the user directly.\n\nQuestion: {question}\nAnswer:";

const GRADER_PROMPT: &str = "You are a grader. Question: {question}
Docs: {context}

Are docs relevant to the question? Answer yes or no.";

const REWRITER_PROMPT: &str = "Rewrite the query to be clearer: {question}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// Answers from retrieved product evidence. Fields: `context`, `question`.
    ProductBot,
    /// Answers without evidence. Fields: `question`.
    DirectAnswer,
    /// Yes/no relevance judgment. Fields: `context`, `question`.
    Grader,
    /// Reformulates a question. Fields: `question`.
    Rewriter,
}

impl PromptKind {
    pub const ALL: [PromptKind; 4] = [
        PromptKind::ProductBot,
        PromptKind::DirectAnswer,
        PromptKind::Grader,
        PromptKind::Rewriter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKind::ProductBot => "product_bot",
            PromptKind::DirectAnswer => "direct_answer",
            PromptKind::Grader => "grader",
            PromptKind::Rewriter => "rewriter",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == key)
    }

    fn required_fields(&self) -> &'static [&'static str] {
        match self {
            PromptKind::ProductBot | PromptKind::Grader => &["context", "question"],
            PromptKind::DirectAnswer | PromptKind::Rewriter => &["question"],
        }
    }

    fn default_template(&self) -> &'static str {
        match self {
            PromptKind::ProductBot => PRODUCT_BOT_PROMPT,
            PromptKind::DirectAnswer => DIRECT_ANSWER_PROMPT,
            PromptKind::Grader => GRADER_PROMPT,
            PromptKind::Rewriter => REWRITER_PROMPT,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PromptRegistry {
    templates: HashMap<PromptKind, PromptTemplate>,
}

impl PromptRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let templates = PromptKind::ALL
            .into_iter()
            .map(|kind| (kind, PromptTemplate::parse(kind.default_template())))
            .collect();
        Self { templates }
    }

    /// Defaults with config-supplied replacements layered on top.
    pub fn from_overrides(overrides: &HashMap<String, String>) -> Result<Self, ApiError> {
        let mut registry = Self::with_defaults();
        for (key, content) in overrides {
            let kind = PromptKind::from_key(key)
                .ok_or_else(|| ApiError::config(format!("Unknown prompt kind '{}'", key)))?;
            registry.register(kind, content.clone())?;
        }
        Ok(registry)
    }

    /// Registers a template after checking it carries every field the kind
    /// is rendered with.
    pub fn register(&mut self, kind: PromptKind, content: impl Into<String>) -> Result<(), ApiError> {
        let template = PromptTemplate::parse(content);
        if let Some(missing) = kind
            .required_fields()
            .iter()
            .find(|field| !template.has_field(field))
        {
            return Err(ApiError::config(format!(
                "Prompt '{}' must contain the '{{{}}}' field",
                kind.as_str(),
                missing
            )));
        }
        self.templates.insert(kind, template);
        Ok(())
    }

    pub fn get(&self, kind: PromptKind) -> Result<&PromptTemplate, ApiError> {
        self.templates
            .get(&kind)
            .ok_or_else(|| ApiError::config(format!("Prompt '{}' is not registered", kind.as_str())))
    }

    pub fn render(&self, kind: PromptKind, values: &[(&str, &str)]) -> Result<String, ApiError> {
        self.get(kind)?.render(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_kind() {
        let registry = PromptRegistry::with_defaults();
        for kind in PromptKind::ALL {
            assert!(registry.get(kind).is_ok(), "{} missing", kind.as_str());
        }
    }

    #[test]
    fn product_bot_embeds_context_and_question() {
        let registry = PromptRegistry::with_defaults();
        let prompt = registry
            .render(
                PromptKind::ProductBot,
                &[("context", "Price: 79900"), ("question", "iPhone 15 price?")],
            )
            .unwrap();
        assert!(prompt.contains("CONTEXT:\nPrice: 79900"));
        assert!(prompt.contains("QUESTION: iPhone 15 price?"));
    }

    #[test]
    fn missing_kind_is_config_error() {
        let registry = PromptRegistry::empty();
        let err = registry.get(PromptKind::ProductBot).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn overrides_replace_defaults() {
        let overrides = HashMap::from([(
            "rewriter".to_string(),
            "Make this a product search query: {question}".to_string(),
        )]);
        let registry = PromptRegistry::from_overrides(&overrides).unwrap();
        let prompt = registry
            .render(PromptKind::Rewriter, &[("question", "cheap phone")])
            .unwrap();
        assert_eq!(prompt, "Make this a product search query: cheap phone");
    }

    #[test]
    fn overrides_reject_unknown_kind_and_missing_fields() {
        let unknown = HashMap::from([("summary".to_string(), "{question}".to_string())]);
        assert!(matches!(
            PromptRegistry::from_overrides(&unknown),
            Err(ApiError::Config(_))
        ));

        let incomplete = HashMap::from([("product_bot".to_string(), "{question}".to_string())]);
        let err = PromptRegistry::from_overrides(&incomplete).unwrap_err();
        assert!(err.to_string().contains("{context}"));
    }
}
