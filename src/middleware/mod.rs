//! Middleware module
//!
//! This module contains request extractors and layers

pub mod auth;

// Re-export commonly used middleware
pub use auth::{CurrentUser, SessionContext};
