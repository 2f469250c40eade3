//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{PlanlyError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_auth_config(&settings.auth)?;
    validate_line_config(&settings.line)?;
    validate_notification_config(&settings.notifications)?;
    validate_logging_config(&settings.logging)?;

    if let Some(ref redis_config) = settings.redis {
        validate_redis_config(redis_config)?;
    } else if settings.features.listing_cache {
        return Err(PlanlyError::Config(
            "Listing cache requires a redis section".to_string()
        ));
    }

    Ok(())
}

fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(PlanlyError::Config(
            "Server host is required".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(PlanlyError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(PlanlyError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(PlanlyError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    if config.acquire_timeout_seconds == 0 {
        return Err(PlanlyError::Config(
            "Acquire timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(PlanlyError::Config(
            "Redis URL is required".to_string()
        ));
    }

    Ok(())
}

fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.session_secret.is_empty() {
        return Err(PlanlyError::Config(
            "Session secret is required".to_string()
        ));
    }

    Ok(())
}

/// Validate LINE messaging configuration
fn validate_line_config(config: &super::LineConfig) -> Result<()> {
    if config.channel_access_token.is_empty() {
        return Err(PlanlyError::Config(
            "LINE channel access token is required".to_string()
        ));
    }

    url::Url::parse(&config.push_api_url)?;
    url::Url::parse(&config.app_url)?;

    Ok(())
}

fn validate_notification_config(config: &super::NotificationConfig) -> Result<()> {
    if config.max_concurrency == 0 {
        return Err(PlanlyError::Config(
            "Notification concurrency must be greater than 0".to_string()
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(PlanlyError::Config(
            "Notification timeout must be greater than 0".to_string()
        ));
    }

    if config.per_second == 0 {
        return Err(PlanlyError::Config(
            "Notification rate must be greater than 0".to_string()
        ));
    }

    let supported = ["ja", "en"];
    if !supported.contains(&config.default_language.as_str()) {
        return Err(PlanlyError::Config(
            format!("Unsupported notification language: {}", config.default_language)
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(PlanlyError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(PlanlyError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.auth.session_secret = "secret".to_string();
        settings.line.channel_access_token = "token".to_string();
        settings
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn test_missing_secret_rejected() {
        let mut settings = valid_settings();
        settings.auth.session_secret.clear();
        assert!(matches!(validate_settings(&settings), Err(PlanlyError::Config(_))));
    }

    #[test]
    fn test_connection_bounds_rejected() {
        let mut settings = valid_settings();
        settings.database.min_connections = 20;
        assert!(validate_settings(&settings).is_err());

        let mut settings = valid_settings();
        settings.database.acquire_timeout_seconds = 0;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_listing_cache_needs_redis() {
        let mut settings = valid_settings();
        settings.features.listing_cache = true;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut settings = valid_settings();
        settings.logging.level = "loud".to_string();
        assert!(validate_settings(&settings).is_err());
    }
}
