use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::validation::validate_config;
use super::{AppConfig, ConfigError, MemoryBackend};

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 6] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "credential",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 1] = ["max_tokens"];

pub fn config_path() -> PathBuf {
    env::var("RAGCHAT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.yml"))
}

/// Load the config file (defaults if absent), apply environment overrides
/// and validate the result.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut config = load_config_from(&config_path())?;
    apply_env_overrides(&mut config, |key| env::var(key).ok());
    validate_config(&config)?;
    Ok(config)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(AppConfig::default());
    }

    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Secrets and addresses can come from the environment instead of the file.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(addr) = lookup("RAGCHAT_ADDR") {
        config.server.addr = addr;
    }
    if let Some(url) = lookup("WEAVIATE_URL") {
        config.vector_index.url = url;
    }
    if let Some(key) = lookup("WEAVIATE_API_KEY") {
        config.vector_index.api_key = Some(key);
    }
    if let Some(url) = lookup("REDIS_URL") {
        config.memory.redis_url = url;
        config.memory.backend = MemoryBackend::Redis;
    }

    let shared_key = lookup("OPENAI_API_KEY");
    if let Some(key) = lookup("REWRITER_API_KEY").or_else(|| shared_key.clone()) {
        config.llm.rewriter.api_key = Some(key);
    }
    if let Some(key) = lookup("SYNTHESIZER_API_KEY").or(shared_key) {
        config.llm.synthesizer.api_key = Some(key);
    }
    if let Some(model) = lookup("REWRITER_MODEL") {
        config.llm.rewriter.model = model;
    }
    if let Some(model) = lookup("SYNTHESIZER_MODEL") {
        config.llm.synthesizer.model = model;
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_lowercase();
    if SENSITIVE_WHITELIST.contains(&key.as_str()) {
        return false;
    }
    SENSITIVE_PATTERNS.iter().any(|pattern| key.contains(pattern))
}

/// Mask secret values so the effective config can be logged.
pub fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                let masked = if is_sensitive_key(key) && !val.is_null() {
                    Value::String(REDACT_PLACEHOLDER.to_string())
                } else {
                    redact_sensitive_values(val)
                };
                redacted.insert(key.clone(), masked);
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        other => other.clone(),
    }
}
