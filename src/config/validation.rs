use crate::config::types::{
    ApiConfig, Config, DirectoryConfig, LinksConfig, ResolverConfig, SpellCheckConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_directory_config(&config.directory)?;
    validate_api_config(&config.api)?;
    validate_links_config(&config.links)?;
    validate_resolver_config(&config.resolver)?;
    validate_spell_check_config(&config.spell_check)?;
    Ok(())
}

fn validate_directory_config(config: &DirectoryConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    validate_http_url("base_url", &config.base_url)?;

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_links_config(config: &LinksConfig) -> Result<(), ConfigError> {
    if config.rate_budget_capacity < 1 || config.rate_budget_capacity > 100 {
        return Err(ConfigError::Validation(format!(
            "rate_budget_capacity must be between 1 and 100, got {}",
            config.rate_budget_capacity
        )));
    }

    if config.cache_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "cache_ttl_secs must be >= 1".to_string(),
        ));
    }

    if let Some(website) = &config.website_url {
        validate_http_url("website_url", website)?;
    }

    Ok(())
}

fn validate_resolver_config(config: &ResolverConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be >= 1, got {}",
            config.batch_size
        )));
    }

    for (name, value) in [
        ("acceptance_threshold", config.acceptance_threshold),
        ("early_exit_threshold", config.early_exit_threshold),
        ("report_threshold", config.report_threshold),
    ] {
        validate_score(name, value)?;
    }

    if config.early_exit_threshold < config.acceptance_threshold {
        return Err(ConfigError::Validation(format!(
            "early_exit_threshold ({}) cannot be below acceptance_threshold ({})",
            config.early_exit_threshold, config.acceptance_threshold
        )));
    }

    if config.noise_phrases.iter().any(|p| p.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "noise_phrases cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

fn validate_spell_check_config(config: &SpellCheckConfig) -> Result<(), ConfigError> {
    if config.max_rounds < 1 {
        return Err(ConfigError::Validation(
            "spell-check max_rounds must be >= 1".to_string(),
        ));
    }

    if config.page_size < 1 {
        return Err(ConfigError::Validation(
            "spell-check page_size must be >= 1".to_string(),
        ));
    }

    validate_score("min_closeness", config.min_closeness)
}

/// Scores live on a 0-100 scale
fn validate_score(name: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be between 0 and 100, got {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", name, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            name, value
        )));
    }

    Ok(())
}
