//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod user;
pub mod event;
pub mod slot;
pub mod participation;

// Re-export repositories
pub use user::UserRepository;
pub use event::EventRepository;
pub use slot::SlotRepository;
pub use participation::ParticipationRepository;
