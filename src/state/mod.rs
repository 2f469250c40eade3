//! Shared application state

pub mod context;

pub use context::AppContext;
