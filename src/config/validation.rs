use crate::config::types::{Config, OutputConfig, SourceConfig, UserAgentConfig, VerifierConfig};
use crate::template::RoutingId;
use crate::version::ReleaseVersion;
use crate::ConfigError;
use std::collections::BTreeMap;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_verifier_config(&config.verifier)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_known_identifiers(&config.known_identifiers)?;
    Ok(())
}

/// Validates release source configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    validate_http_url("release-notes-url", &config.release_notes_url)?;
    validate_http_url("download-base", &config.download_base)?;

    if !config.subpage_pattern.contains("{version}") && !config.subpage_pattern.contains("{anchor}")
    {
        return Err(ConfigError::Validation(format!(
            "subpage-pattern must contain {{version}} or {{anchor}}, got '{}'",
            config.subpage_pattern
        )));
    }

    let expanded = config
        .subpage_pattern
        .replace("{version}", "4.0.0")
        .replace("{anchor}", "400");
    validate_http_url("subpage-pattern", &expanded)?;

    config
        .baseline_version
        .parse::<ReleaseVersion>()
        .map_err(|e| ConfigError::InvalidVersion(format!("baseline-version: {}", e)))?;

    Ok(())
}

/// Validates link verifier configuration
fn validate_verifier_config(config: &VerifierConfig) -> Result<(), ConfigError> {
    if config.request_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-ms must be >= 100ms, got {}ms",
            config.request_timeout_ms
        )));
    }

    if config.connect_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-ms must be >= 100ms, got {}ms",
            config.connect_timeout_ms
        )));
    }

    if config.max_concurrent_checks < 1 || config.max_concurrent_checks > 64 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-checks must be between 1 and 64, got {}",
            config.max_concurrent_checks
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent name cannot be empty".to_string(),
        ));
    }

    if !config
        .name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "user-agent name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.catalog_path.is_empty() {
        return Err(ConfigError::Validation(
            "catalog-path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates hand-supplied routing identifiers
fn validate_known_identifiers(entries: &BTreeMap<String, String>) -> Result<(), ConfigError> {
    for (version, identifier) in entries {
        version
            .parse::<ReleaseVersion>()
            .map_err(|e| ConfigError::InvalidVersion(format!("known-identifiers: {}", e)))?;

        RoutingId::new(identifier.as_str()).map_err(|e| {
            ConfigError::Validation(format!("known-identifiers entry for {}: {}", version, e))
        })?;
    }
    Ok(())
}

/// Validates that a value is an absolute http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}
