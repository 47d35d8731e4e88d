use crate::config::types::{
    Config, ExtractorConfig, OutputConfig, RateLimitConfig, RetryConfig, RunConfig, SourceConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_retry_config(&config.retry)?;
    validate_rate_limit_config(&config.rate_limit)?;
    validate_extractor_config(&config.extractor)?;
    validate_run_config(&config.run)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the profile page source
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    if !config.url_template.contains("{id}") {
        return Err(ConfigError::Validation(format!(
            "url_template must contain an {{id}} placeholder, got '{}'",
            config.url_template
        )));
    }

    let sample = config.url_template.replace("{id}", "ID");
    let url = Url::parse(&sample)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid url_template: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "url_template must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(
            "url_template has no host".to_string(),
        ));
    }

    if config.timeout_secs < 1 || config.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    for domain in &config.origin_domains {
        validate_domain_pattern(domain)?;
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
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

    if let Some(agent) = &config.agent_string {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "agent_string cannot be blank".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.max_backoff_ms < config.initial_backoff_ms {
        return Err(ConfigError::Validation(format!(
            "max_backoff_ms ({}) must be >= initial_backoff_ms ({})",
            config.max_backoff_ms, config.initial_backoff_ms
        )));
    }

    Ok(())
}

/// Validates window ceilings
///
/// A longer window may never admit fewer requests than a shorter one,
/// otherwise the shorter ceiling is unreachable and almost certainly a typo.
fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    for (name, ceiling) in [
        ("per_minute", config.per_minute),
        ("per_hour", config.per_hour),
        ("per_day", config.per_day),
    ] {
        if ceiling < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, ceiling
            )));
        }
    }

    if config.per_minute > config.per_hour || config.per_hour > config.per_day {
        return Err(ConfigError::Validation(format!(
            "ceilings must satisfy per_minute <= per_hour <= per_day, got {}/{}/{}",
            config.per_minute, config.per_hour, config.per_day
        )));
    }

    Ok(())
}

fn validate_extractor_config(config: &ExtractorConfig) -> Result<(), ConfigError> {
    if config.max_host_labels < 2 {
        return Err(ConfigError::Validation(format!(
            "max_host_labels must be >= 2, got {}",
            config.max_host_labels
        )));
    }

    if config.labels.iter().any(|l| l.trim().is_empty()) {
        return Err(ConfigError::Validation("labels cannot be blank".to_string()));
    }

    if config.section_keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "section_keywords cannot be blank".to_string(),
        ));
    }

    for entry in &config.blocklist {
        validate_domain_pattern(entry)?;
    }

    Ok(())
}

fn validate_run_config(config: &RunConfig) -> Result<(), ConfigError> {
    if config.input_path.is_empty() {
        return Err(ConfigError::Validation(
            "input_path cannot be empty".to_string(),
        ));
    }

    if config.flush_every < 1 {
        return Err(ConfigError::Validation(format!(
            "flush_every must be >= 1, got {}",
            config.flush_every
        )));
    }

    if config.progress_every < 1 {
        return Err(ConfigError::Validation(format!(
            "progress_every must be >= 1, got {}",
            config.progress_every
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.records_path.is_empty() {
        return Err(ConfigError::Validation(
            "records_path cannot be empty".to_string(),
        ));
    }

    if config.domains_path.is_empty() {
        return Err(ConfigError::Validation(
            "domains_path cannot be empty".to_string(),
        ));
    }

    if config.records_path == config.domains_path {
        return Err(ConfigError::Validation(
            "records_path and domains_path must differ".to_string(),
        ));
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        validate_domain_string(domain)?;
    } else {
        validate_domain_string(pattern)?;
    }

    Ok(())
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    // Must contain at least one dot (e.g., example.com, not just "example")
    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
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
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
