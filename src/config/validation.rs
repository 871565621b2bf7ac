use crate::config::types::{Config, CookieEntry, CrawlerConfig, UserAgentConfig};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Upper bound on the worker pool size
const MAX_POOL_SIZE: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_cookies(&config.cookies)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    validate_start_url(&config.start_url)?;

    if config.min_pool_size < 1 {
        return Err(ConfigError::Validation(format!(
            "min_pool_size must be >= 1, got {}",
            config.min_pool_size
        )));
    }

    if config.max_pool_size < config.min_pool_size || config.max_pool_size > MAX_POOL_SIZE {
        return Err(ConfigError::Validation(format!(
            "max_pool_size must be between min_pool_size ({}) and {}, got {}",
            config.min_pool_size, MAX_POOL_SIZE, config.max_pool_size
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request_timeout must be >= 1ms".to_string(),
        ));
    }

    if config.accepted_mime_types.is_empty() {
        return Err(ConfigError::Validation(
            "accepted_mime_types must list at least one content type".to_string(),
        ));
    }

    if config
        .accepted_mime_types
        .iter()
        .any(|mime| mime.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "accepted_mime_types cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates the start URL: non-blank, absolute, http(s), with a host
pub fn validate_start_url(start_url: &str) -> ConfigResult<()> {
    let trimmed = start_url.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidUrl(
            "start_url cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start_url '{}': {}", trimmed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "start_url '{}' must use the http or https scheme",
            trimmed
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "start_url '{}' has no host",
            trimmed
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> ConfigResult<()> {
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

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates pre-seeded cookies
fn validate_cookies(cookies: &[CookieEntry]) -> ConfigResult<()> {
    for cookie in cookies {
        if cookie.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "cookie name cannot be empty".to_string(),
            ));
        }

        if cookie.name.contains(['=', ';']) || cookie.value.contains(';') {
            return Err(ConfigError::Validation(format!(
                "cookie '{}' contains reserved characters",
                cookie.name
            )));
        }

        validate_cookie_domain(&cookie.domain)?;

        if !cookie.path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "cookie '{}' path must start with '/', got '{}'",
                cookie.name, cookie.path
            )));
        }
    }
    Ok(())
}

/// Validates a cookie domain (an optional leading dot is allowed)
fn validate_cookie_domain(domain: &str) -> ConfigResult<()> {
    let domain = domain.strip_prefix('.').unwrap_or(domain);

    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Cookie domain cannot be empty".to_string(),
        ));
    }

    // Check for invalid characters
    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    // Check that it doesn't start or end with a dot or hyphen
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

    // Check for consecutive dots
    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}
