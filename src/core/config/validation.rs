use super::{AppConfig, ConfigError, MemoryBackend, ModelConfig};

pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_required_string("server.addr", &config.server.addr)?;

    validate_url("vector_index.url", &config.vector_index.url)?;
    validate_required_string("vector_index.class_name", &config.vector_index.class_name)?;
    validate_range("vector_index.timeout_secs", config.vector_index.timeout_secs, 1, 3_600)?;

    if config.memory.backend == MemoryBackend::Redis {
        validate_required_string("memory.redis_url", &config.memory.redis_url)?;
    }

    validate_model("llm.rewriter", &config.llm.rewriter)?;
    validate_model("llm.synthesizer", &config.llm.synthesizer)?;

    let prompts = &config.prompts;
    validate_placeholders(
        "prompts.rewrite_template",
        prompts.rewrite_template.as_deref(),
        &["{chat_history}", "{question}"],
    )?;
    validate_placeholders(
        "prompts.answer_template",
        prompts.answer_template.as_deref(),
        &["{chat_history}", "{context}", "{question}"],
    )?;

    Ok(())
}

fn validate_model(prefix: &str, model: &ModelConfig) -> Result<(), ConfigError> {
    validate_url(&format!("{}.base_url", prefix), &model.base_url)?;
    validate_required_string(&format!("{}.model", prefix), &model.model)?;
    validate_range(&format!("{}.timeout_secs", prefix), model.timeout_secs, 1, 3_600)?;

    if let Some(temperature) = model.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(invalid(
                &format!("{}.temperature", prefix),
                "must be between 0 and 2",
            ));
        }
    }
    if let Some(max_tokens) = model.max_tokens {
        if max_tokens < 1 {
            return Err(invalid(&format!("{}.max_tokens", prefix), "must be positive"));
        }
    }
    Ok(())
}

fn validate_required_string(path: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(path, "must not be empty"));
    }
    Ok(())
}

fn validate_url(path: &str, value: &str) -> Result<(), ConfigError> {
    validate_required_string(path, value)?;
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(invalid(path, "must be an http(s) URL"));
    }
    Ok(())
}

fn validate_range(path: &str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(invalid(
            path,
            &format!("must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

fn validate_placeholders(
    path: &str,
    template: Option<&str>,
    required: &[&str],
) -> Result<(), ConfigError> {
    let Some(template) = template else {
        return Ok(());
    };
    for placeholder in required {
        if !template.contains(placeholder) {
            return Err(invalid(path, &format!("missing placeholder {}", placeholder)));
        }
    }
    Ok(())
}

fn invalid(path: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        validate_config(&AppConfig::default()).unwrap();
    }

    #[test]
    fn test_rejects_non_http_index_url() {
        let mut config = AppConfig::default();
        config.vector_index.url = "localhost:8080".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("vector_index.url"));
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let mut config = AppConfig::default();
        config.llm.synthesizer.temperature = Some(3.5);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("llm.synthesizer.temperature"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.llm.rewriter.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_redis_url_only_required_for_redis_backend() {
        let mut config = AppConfig::default();
        config.memory.redis_url = String::new();
        assert!(validate_config(&config).is_err());

        config.memory.backend = MemoryBackend::Memory;
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_prompt_template_must_keep_placeholders() {
        let mut config = AppConfig::default();
        config.prompts.answer_template = Some("CONTEXT: {context}\nQ: {question}".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("{chat_history}"));
    }
}
