use serde_json::{Map, Value};

use super::settings::WorkflowSettings;
use crate::core::errors::ApiError;

const PROVIDER_KINDS: [&str; 3] = ["openai", "lmstudio", "groq"];
const EXHAUSTED_POLICIES: [&str; 2] = ["best_effort", "fail"];
const CHECKPOINT_BACKENDS: [&str; 2] = ["memory", "sqlite"];

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_optional_string_field(llm, "llm.active", "active")?;

        if let Some(providers) = expect_optional_object(llm, "providers")? {
            for (provider_name, value) in providers {
                let path_prefix = format!("llm.providers.{}", provider_name);
                let entry = value
                    .as_object()
                    .ok_or_else(|| config_type_error(&path_prefix, "object"))?;
                validate_enum_field(
                    entry,
                    &format!("{}.kind", path_prefix),
                    "kind",
                    &PROVIDER_KINDS,
                )?;
                validate_required_string_field(entry, &format!("{}.model", path_prefix), "model")?;
                validate_optional_string_field(
                    entry,
                    &format!("{}.embedding_model", path_prefix),
                    "embedding_model",
                )?;
                validate_optional_string_field(
                    entry,
                    &format!("{}.base_url", path_prefix),
                    "base_url",
                )?;
                validate_f64_field(
                    entry,
                    &format!("{}.temperature", path_prefix),
                    "temperature",
                    0.0,
                    2.0,
                )?;
                validate_u64_field(
                    entry,
                    &format!("{}.max_tokens", path_prefix),
                    "max_tokens",
                    1,
                    1_000_000,
                )?;
                validate_u64_field(
                    entry,
                    &format!("{}.timeout_secs", path_prefix),
                    "timeout_secs",
                    1,
                    3_600,
                )?;
            }
        }
    }

    if let Some(retriever) = expect_optional_object(root, "retriever")? {
        validate_u64_field(retriever, "retriever.top_k", "top_k", 1, 100)?;
        validate_u64_field(retriever, "retriever.batch_size", "batch_size", 1, 1024)?;
    }

    if let Some(workflow) = expect_optional_object(root, "workflow")? {
        validate_u64_field(workflow, "workflow.max_rewrites", "max_rewrites", 0, 20)?;
        validate_u64_field(workflow, "workflow.max_steps", "max_steps", 1, 10_000)?;
        validate_u64_field(workflow, "workflow.history_window", "history_window", 0, 10_000)?;
        validate_string_array_field(workflow, "workflow.router_keywords", "router_keywords")?;
        validate_bool_field(
            workflow,
            "workflow.checkpoint_each_step",
            "checkpoint_each_step",
        )?;
        validate_enum_field(
            workflow,
            "workflow.exhausted_policy",
            "exhausted_policy",
            &EXHAUSTED_POLICIES,
        )?;
        validate_enum_field(
            workflow,
            "workflow.checkpoint_backend",
            "checkpoint_backend",
            &CHECKPOINT_BACKENDS,
        )?;
        validate_step_budget(workflow)?;
    }

    if let Some(prompts) = expect_optional_object(root, "prompts")? {
        for key in prompts.keys() {
            validate_required_string_field(prompts, &format!("prompts.{}", key), key)?;
        }
    }

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 1, 65_535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    Ok(())
}

/// The rewrite cap has to bind before the step limit does.
fn validate_step_budget(workflow: &Map<String, Value>) -> Result<(), ApiError> {
    let defaults = WorkflowSettings::default();
    let max_rewrites = workflow
        .get("max_rewrites")
        .and_then(Value::as_u64)
        .map(|v| v as u32)
        .unwrap_or(defaults.max_rewrites);
    let max_steps = workflow
        .get("max_steps")
        .and_then(Value::as_u64)
        .map(|v| v as usize)
        .unwrap_or(defaults.max_steps);

    WorkflowSettings {
        max_rewrites,
        max_steps,
        ..defaults
    }
    .check_step_budget()
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_bool_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_bool().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "boolean"))
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::Config(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(ApiError::Config(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_enum_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    allowed: &[&str],
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if !allowed.contains(&text) {
        return Err(ApiError::Config(format!(
            "Invalid config at '{}': expected one of {}",
            path,
            allowed.join(", ")
        )));
    }
    Ok(())
}

fn validate_required_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let value = section.get(key).ok_or_else(|| {
        ApiError::Config(format!("Invalid config at '{}': value is required", path))
    })?;
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::Config(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_str().is_none() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::Config(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::Config(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_well_formed_config() {
        let config = json!({
            "llm": {
                "active": "lmstudio",
                "providers": {
                    "lmstudio": { "kind": "lmstudio", "model": "qwen2.5-7b", "temperature": 0.2 }
                }
            },
            "retriever": { "top_k": 5 },
            "workflow": {
                "max_rewrites": 3,
                "router_keywords": ["price", "laptop"],
                "exhausted_policy": "fail"
            },
            "prompts": { "product_bot": "{context} {question}" },
            "server": { "port": 8080 }
        });

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_unknown_provider_kind() {
        let config = json!({
            "llm": { "providers": { "x": { "kind": "google", "model": "gemini" } } }
        });
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("llm.providers.x.kind"));
    }

    #[test]
    fn rejects_provider_without_model() {
        let config = json!({ "llm": { "providers": { "x": { "kind": "openai" } } } });
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("llm.providers.x.model"));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let config = json!({ "retriever": { "top_k": 0 } });
        assert!(validate_config(&config).is_err());

        let config = json!({ "workflow": { "max_rewrites": 21 } });
        assert!(validate_config(&config).is_err());

        let config = json!({
            "llm": { "providers": { "x": { "kind": "openai", "model": "m", "temperature": 3.5 } } }
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_blank_router_keyword() {
        let config = json!({ "workflow": { "router_keywords": ["price", " "] } });
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("workflow.router_keywords[1]"));
    }

    #[test]
    fn step_limit_must_outlast_rewrite_cap() {
        // 13 rewrites need 4 * 14 + 1 = 57 steps; the default limit is 50.
        let config = json!({ "workflow": { "max_rewrites": 13 } });
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ApiError::Config(ref msg) if msg.contains("57")));

        let config = json!({ "workflow": { "max_rewrites": 13, "max_steps": 57 } });
        assert!(validate_config(&config).is_ok());

        // Default rewrite cap (2) needs 13 steps.
        let config = json!({ "workflow": { "max_steps": 12 } });
        assert!(validate_config(&config).is_err());
        let config = json!({ "workflow": { "max_steps": 13 } });
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_non_object_root() {
        assert!(validate_config(&json!([1, 2])).is_err());
    }
}
