//! Template parsing and rendering.
//!
//! Fields are written as `{name}`. Rendering is a single pass over the
//! template, so substituted values are never re-scanned for fields.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::core::errors::ApiError;

fn field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{([a-z_][a-z0-9_]*)\}").expect("field pattern is a valid regex")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    content: String,
    fields: BTreeSet<String>,
}

impl PromptTemplate {
    pub fn parse(content: impl Into<String>) -> Self {
        let content = content.into();
        let fields = field_pattern()
            .captures_iter(&content)
            .map(|cap| cap[1].to_string())
            .collect();
        Self { content, fields }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    /// Fills every field from `values`. A field without a value is a
    /// configuration error; extra values are ignored.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String, ApiError> {
        if let Some(missing) = self
            .fields
            .iter()
            .find(|field| !values.iter().any(|(name, _)| *name == field.as_str()))
        {
            return Err(ApiError::config(format!(
                "Missing value for template field '{}'",
                missing
            )));
        }

        let rendered = field_pattern().replace_all(&self.content, |cap: &Captures| {
            values
                .iter()
                .find(|(name, _)| *name == &cap[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_default()
        });

        Ok(rendered.into_owned())
    }
}
