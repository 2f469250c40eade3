//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod event;
pub mod participation;
pub mod user;
pub mod views;

// Re-export commonly used models
pub use event::{Event, EventSlot, SlotFields, SlotDraft, SlotDiff, NewEvent, CreateEventRequest, UpdateEventRequest};
pub use participation::{Participation, ParticipationRow, ParticipationStatus, ParticipationUpsert, SlotResponse};
pub use user::{User, UpsertUserRequest};
pub use views::{EventGraph, SlotGraph, ParticipationRecord, EventView, SlotView, ParticipationView, EventDetailView, CreatedEvent, SubmissionReceipt, ConfirmationOutcome};
