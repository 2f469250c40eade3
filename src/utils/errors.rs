//! Error handling for Planly
//!
//! This module defines the main error type used throughout the application.
//! Every core operation returns [`Result`], and [`PlanlyError::kind`] folds
//! the variants onto the small taxonomy the HTTP layer reports to callers.

use serde::Serialize;
use thiserror::Error;

/// Main error type for Planly
#[derive(Error, Debug)]
pub enum PlanlyError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Login required")]
    Unauthenticated,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Slot {slot_id} not found for event {event_id}")]
    SlotNotFound { event_id: i64, slot_id: i64 },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Error kinds exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthenticated,
    Validation,
    NotFound,
    Forbidden,
    Conflict,
    Store,
    Internal,
}

/// Result type alias for Planly operations
pub type Result<T> = std::result::Result<T, PlanlyError>;

impl PlanlyError {
    /// Classify the error for callers
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlanlyError::Unauthenticated => ErrorKind::Unauthenticated,
            PlanlyError::Validation(_) => ErrorKind::Validation,
            PlanlyError::EventNotFound { .. }
            | PlanlyError::SlotNotFound { .. }
            | PlanlyError::UserNotFound { .. } => ErrorKind::NotFound,
            PlanlyError::Forbidden(_) => ErrorKind::Forbidden,
            PlanlyError::Conflict(_) => ErrorKind::Conflict,
            PlanlyError::Database(_) | PlanlyError::Migration(_) | PlanlyError::Redis(_) => {
                ErrorKind::Store
            }
            PlanlyError::Http(_)
            | PlanlyError::Serialization(_)
            | PlanlyError::Token(_)
            | PlanlyError::Io(_)
            | PlanlyError::UrlParse(_)
            | PlanlyError::Config(_) => ErrorKind::Internal,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PlanlyError::Database(_) => ErrorSeverity::Critical,
            PlanlyError::Migration(_) => ErrorSeverity::Critical,
            PlanlyError::Config(_) => ErrorSeverity::Critical,
            PlanlyError::Unauthenticated => ErrorSeverity::Warning,
            PlanlyError::Forbidden(_) => ErrorSeverity::Warning,
            PlanlyError::Conflict(_) => ErrorSeverity::Warning,
            PlanlyError::Validation(_) => ErrorSeverity::Info,
            PlanlyError::EventNotFound { .. }
            | PlanlyError::SlotNotFound { .. }
            | PlanlyError::UserNotFound { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Message safe to hand back to an API caller.
    ///
    /// Store and internal failures are collapsed to a generic text so that
    /// connection strings or SQL never leak out of the service.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Store | ErrorKind::Internal => "Server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
