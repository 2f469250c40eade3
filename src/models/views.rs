//! Read models
//!
//! `EventGraph` is what the store hands back: an event with its slots and
//! every participation on them. The `*View` types are the projections the
//! query layer derives from a graph for a particular viewer.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use super::event::{Event, EventSlot};
use super::participation::{Participation, ParticipationStatus};

/// A participation together with the responder's display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipationRecord {
    pub participation: Participation,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotGraph {
    pub slot: EventSlot,
    pub participations: Vec<ParticipationRecord>,
}

/// An event with its slots ordered by (day, start) and all participations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventGraph {
    pub event: Event,
    pub slots: Vec<SlotGraph>,
}

impl EventGraph {
    pub fn slot(&self, slot_id: i64) -> Option<&SlotGraph> {
        self.slots.iter().find(|s| s.slot.id == slot_id)
    }

    pub fn confirmed_slot(&self) -> Option<&SlotGraph> {
        self.event.confirmed_slot_id.and_then(|id| self.slot(id))
    }

    /// Whether the user answered at least one slot
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.slots
            .iter()
            .any(|s| s.participations.iter().any(|p| p.participation.user_id == user_id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationView {
    pub id: i64,
    pub user_id: String,
    pub user_name: Option<String>,
    pub status: ParticipationStatus,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ParticipationRecord> for ParticipationView {
    fn from(record: &ParticipationRecord) -> Self {
        let p = &record.participation;
        Self {
            id: p.id,
            user_id: p.user_id.clone(),
            user_name: record.user_name.clone(),
            status: p.status,
            comment: p.comment.clone(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub id: i64,
    pub day: NaiveDate,
    pub start_at: String,
    pub end_at: String,
    pub participations: Vec<ParticipationView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventView {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub is_confirmed: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_slot_id: Option<i64>,
    pub slots: Vec<SlotView>,
}

/// Event page as seen by one viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetailView {
    #[serde(flatten)]
    pub event: EventView,
    pub current_user_participation: Vec<ParticipationView>,
    pub is_user_registered: bool,
}

/// Result of event creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub event_id: i64,
    pub slot_ids: Vec<i64>,
}

/// Result of a participation submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub saved: usize,
    pub skipped_slot_ids: Vec<i64>,
}

/// Result of a confirmation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationOutcome {
    pub event_id: i64,
    pub confirmed_slot_id: i64,
    pub confirmed_at: DateTime<Utc>,
    /// `false` when the event had already been confirmed on the same slot
    pub newly_confirmed: bool,
    pub notifications_sent: usize,
    pub notifications_total: usize,
}
