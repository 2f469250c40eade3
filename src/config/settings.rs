//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub auth: AuthConfig,
    pub line: LineConfig,
    pub notifications: NotificationConfig,
    pub logging: LoggingConfig,
    pub features: FeaturesConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    /// Zero keeps idle connections open indefinitely
    pub idle_timeout_seconds: u64,
    /// Zero disables connection recycling
    pub max_lifetime_seconds: u64,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
    pub ttl_seconds: u64,
}

/// Session token configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub session_secret: String,
    pub cookie_names: Vec<String>,
}

/// LINE messaging API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LineConfig {
    pub channel_access_token: String,
    pub push_api_url: String,
    /// Public base URL of the web application, used in notification links
    pub app_url: String,
}

/// Outbound notification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    pub max_concurrency: usize,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub per_second: u32,
    pub default_language: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
    pub json: bool,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    pub listing_cache: bool,
}

impl Settings {
    /// Load settings from an optional `config.*` file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load(config::File::with_name("config").required(false))
    }

    /// Load settings from the given file, which must exist
    pub fn from_file(path: &std::path::Path) -> Result<Self, config::ConfigError> {
        Self::load(config::File::from(path))
    }

    fn load<S>(file: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = config::Config::try_from(&Settings::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(file)
            .add_source(config::Environment::with_prefix("PLANLY").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::PlanlyError> {
        super::validation::validate_settings(self)
    }

    /// Socket address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/planly".to_string(),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_seconds: 30,
                idle_timeout_seconds: 600,
                max_lifetime_seconds: 1800,
            },
            redis: None,
            auth: AuthConfig {
                session_secret: String::new(),
                cookie_names: vec![
                    "next-auth.session-token".to_string(),
                    "__Secure-next-auth.session-token".to_string(),
                ],
            },
            line: LineConfig {
                channel_access_token: String::new(),
                push_api_url: "https://api.line.me/v2/bot/message/push".to_string(),
                app_url: "http://localhost:3000".to_string(),
            },
            notifications: NotificationConfig {
                max_concurrency: 8,
                timeout_seconds: 10,
                max_retries: 2,
                per_second: 20,
                default_language: "ja".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "logs".to_string(),
                json: false,
            },
            features: FeaturesConfig {
                listing_cache: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bind_address() {
        let settings = Settings::default();
        assert_eq!(settings.bind_address(), "0.0.0.0:3000");
        assert!(settings.redis.is_none());
        assert_eq!(settings.auth.cookie_names.len(), 2);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planly.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            port = 8080

            [database]
            url = "postgresql://db.internal/planly"
            max_connections = 4

            [line]
            app_url = "https://planly.example/"
            "#,
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.database.url, "postgresql://db.internal/planly");
        assert_eq!(settings.database.max_connections, 4);
        assert_eq!(settings.database.min_connections, 1);
        assert_eq!(settings.line.app_url, "https://planly.example/");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::from_file(&dir.path().join("absent.toml")).is_err());
    }
}
