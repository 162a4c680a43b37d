use crate::api::{BATCH_SIZE_RANGE, MAX_DEPTH_RANGE, MAX_PAGES_RANGE};
use crate::config::types::{AuthConfig, Config, ExtractionSettings, SpiderConfig, UserAgentConfig};
use crate::ConfigError;
use std::ops::RangeInclusive;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_spider_config(&config.spider)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_auth_config(&config.auth)?;
    validate_extraction_settings(&config.extraction)?;
    Ok(())
}

/// Validates spider defaults and timeouts
fn validate_spider_config(config: &SpiderConfig) -> Result<(), ConfigError> {
    check_range("default-max-depth", config.default_max_depth, MAX_DEPTH_RANGE)?;
    check_range("default-max-pages", config.default_max_pages, MAX_PAGES_RANGE)?;
    check_range("default-batch-size", config.default_batch_size, BATCH_SIZE_RANGE)?;

    if config.page_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "page-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn check_range(name: &str, value: u32, range: RangeInclusive<u32>) -> Result<(), ConfigError> {
    if !range.contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be between {} and {}, got {}",
            name,
            range.start(),
            range.end(),
            value
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Token hashes must be hex-encoded SHA-256 digests
fn validate_auth_config(config: &AuthConfig) -> Result<(), ConfigError> {
    for hash in &config.token_hashes {
        if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::Validation(format!(
                "token hash '{}' is not a hex-encoded SHA-256 digest",
                hash
            )));
        }
    }
    Ok(())
}

fn validate_extraction_settings(settings: &ExtractionSettings) -> Result<(), ConfigError> {
    if let Some(llm) = &settings.llm {
        let endpoint = Url::parse(&llm.endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid llm endpoint: {}", e)))?;

        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "llm endpoint must be http(s), got '{}'",
                llm.endpoint
            )));
        }

        if llm.model.is_empty() {
            return Err(ConfigError::Validation(
                "llm model cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
