//! Event and slot models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use sqlx::FromRow;
use crate::utils::errors::PlanlyError;

/// Default window used when an event is created without candidate slots
pub const DEFAULT_SLOT_START: &str = "09:00";
pub const DEFAULT_SLOT_END: &str = "10:00";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub is_confirmed: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_slot_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EventSlot {
    pub id: i64,
    pub event_id: i64,
    pub day: NaiveDate,
    pub start_at: String,
    pub end_at: String,
}

impl EventSlot {
    /// Ordering key used by every listing: day, then start time
    pub fn sort_key(&self) -> (NaiveDate, &str, i64) {
        (self.day, self.start_at.as_str(), self.id)
    }

    /// Whether the slot already holds the given day and times
    pub fn matches(&self, fields: &SlotFields) -> bool {
        self.day == fields.day && self.start_at == fields.start_at && self.end_at == fields.end_at
    }
}

/// Day and time window of a slot, without identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotFields {
    pub day: NaiveDate,
    pub start_at: String,
    pub end_at: String,
}

impl SlotFields {
    pub fn new(day: NaiveDate, start_at: impl Into<String>, end_at: impl Into<String>) -> Self {
        Self {
            day,
            start_at: start_at.into(),
            end_at: end_at.into(),
        }
    }

    /// Slot synthesized for events created without candidates
    pub fn default_for(day: NaiveDate) -> Self {
        Self::new(day, DEFAULT_SLOT_START, DEFAULT_SLOT_END)
    }
}

/// One entry of the complete slot set submitted on update.
///
/// An id of `None` or a non-positive id means "create a new slot".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDraft {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub fields: SlotFields,
}

impl SlotDraft {
    pub fn existing(id: i64, fields: SlotFields) -> Self {
        Self { id: Some(id), fields }
    }

    pub fn new_slot(fields: SlotFields) -> Self {
        Self { id: None, fields }
    }

    /// Id of the slot this draft edits, if it refers to one
    pub fn existing_id(&self) -> Option<i64> {
        self.id.filter(|id| *id > 0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub candidate_slots: Vec<SlotFields>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub slots: Vec<SlotDraft>,
}

/// Row data for a new event
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub created_by: String,
}

/// Three-way difference between stored slots and a submitted slot set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotDiff {
    pub to_delete: Vec<i64>,
    pub to_update: Vec<(i64, SlotFields)>,
    pub to_insert: Vec<SlotFields>,
}

impl SlotDiff {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_update.is_empty() && self.to_insert.is_empty()
    }
}

/// Three-way difference between the stored slots and the submitted set.
///
/// Unchanged slots produce no update. A submitted id that is not one of the
/// event's slots is `SlotNotFound`; the same id twice is a validation error.
pub fn compute_slot_diff(event_id: i64, current: &[EventSlot], submitted: &[SlotDraft]) -> Result<SlotDiff, PlanlyError> {
    let mut diff = SlotDiff::default();
    let mut kept = HashSet::new();

    for draft in submitted {
        match draft.existing_id() {
            Some(slot_id) => {
                let slot = current
                    .iter()
                    .find(|s| s.id == slot_id)
                    .ok_or(PlanlyError::SlotNotFound { event_id, slot_id })?;
                if !kept.insert(slot_id) {
                    return Err(PlanlyError::Validation(format!("Slot {} submitted twice", slot_id)));
                }
                if !slot.matches(&draft.fields) {
                    diff.to_update.push((slot_id, draft.fields.clone()));
                }
            }
            None => diff.to_insert.push(draft.fields.clone()),
        }
    }

    diff.to_delete = current
        .iter()
        .map(|s| s.id)
        .filter(|id| !kept.contains(id))
        .collect();

    Ok(diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    fn fields(d: u32, start: &str, end: &str) -> SlotFields {
        SlotFields::new(NaiveDate::from_ymd_opt(2025, 8, d).unwrap(), start, end)
    }

    fn stored(id: i64, d: u32) -> EventSlot {
        EventSlot {
            id,
            event_id: 1,
            day: NaiveDate::from_ymd_opt(2025, 8, d).unwrap(),
            start_at: "09:00".to_string(),
            end_at: "10:00".to_string(),
        }
    }

    #[test]
    fn test_slot_draft_sentinel_ids() {
        let fields = SlotFields::default_for(NaiveDate::from_ymd_opt(2025, 8, 10).unwrap());
        assert_eq!(SlotDraft::new_slot(fields.clone()).existing_id(), None);
        assert_eq!(SlotDraft { id: Some(0), fields: fields.clone() }.existing_id(), None);
        assert_eq!(SlotDraft { id: Some(-3), fields: fields.clone() }.existing_id(), None);
        assert_eq!(SlotDraft::existing(7, fields).existing_id(), Some(7));
    }

    #[test]
    fn test_slot_draft_deserializes_flat() {
        let draft: SlotDraft = serde_json::from_str(
            r#"{"id": 4, "day": "2025-08-11", "start_at": "13:00", "end_at": "17:00"}"#,
        )
        .unwrap();
        assert_eq!(draft.existing_id(), Some(4));
        assert_eq!(draft.fields.start_at, "13:00");

        let draft: SlotDraft = serde_json::from_str(
            r#"{"day": "2025-08-11", "start_at": "13:00", "end_at": "17:00"}"#,
        )
        .unwrap();
        assert_eq!(draft.id, None);
    }

    #[test]
    fn test_diff_edit_delete_insert() {
        let current = vec![stored(1, 10), stored(2, 11), stored(3, 12)];
        let submitted = vec![
            SlotDraft::existing(1, fields(15, "13:00", "17:00")),
            SlotDraft::new_slot(fields(16, "09:00", "10:00")),
        ];

        let diff = compute_slot_diff(1, &current, &submitted).unwrap();
        assert_eq!(diff.to_update, vec![(1, fields(15, "13:00", "17:00"))]);
        assert_eq!(diff.to_delete, vec![2, 3]);
        assert_eq!(diff.to_insert, vec![fields(16, "09:00", "10:00")]);
    }

    #[test]
    fn test_diff_unchanged_is_empty() {
        let current = vec![stored(1, 10)];
        let submitted = vec![SlotDraft::existing(1, fields(10, "09:00", "10:00"))];
        assert!(compute_slot_diff(1, &current, &submitted).unwrap().is_empty());
    }

    #[test]
    fn test_diff_rejects_foreign_and_repeated_ids() {
        let current = vec![stored(1, 10)];
        assert_matches!(
            compute_slot_diff(1, &current, &[SlotDraft::existing(9, fields(10, "09:00", "10:00"))]),
            Err(PlanlyError::SlotNotFound { event_id: 1, slot_id: 9 })
        );
        assert_matches!(
            compute_slot_diff(
                1,
                &current,
                &[
                    SlotDraft::existing(1, fields(10, "09:00", "10:00")),
                    SlotDraft::existing(1, fields(11, "09:00", "10:00")),
                ]
            ),
            Err(PlanlyError::Validation(_))
        );
    }

    proptest! {
        #[test]
        fn diff_partitions_stored_slots(
            stored_count in 1usize..10,
            keep_mask in proptest::collection::vec(any::<bool>(), 10),
            edit_mask in proptest::collection::vec(any::<bool>(), 10),
            new_count in 0usize..4,
        ) {
            let current: Vec<EventSlot> = (0..stored_count).map(|i| stored(i as i64 + 1, 10)).collect();
            let mut submitted = Vec::new();
            for (i, slot) in current.iter().enumerate() {
                if keep_mask[i] {
                    let day = if edit_mask[i] { 20 } else { 10 };
                    submitted.push(SlotDraft::existing(slot.id, fields(day, "09:00", "10:00")));
                }
            }
            for n in 0..new_count {
                submitted.push(SlotDraft::new_slot(fields(25 + n as u32, "09:00", "10:00")));
            }

            let diff = compute_slot_diff(1, &current, &submitted).unwrap();

            for (i, slot) in current.iter().enumerate() {
                let deleted = diff.to_delete.contains(&slot.id);
                let updated = diff.to_update.iter().any(|(id, _)| *id == slot.id);
                prop_assert_eq!(deleted, !keep_mask[i]);
                prop_assert_eq!(updated, keep_mask[i] && edit_mask[i]);
            }
            prop_assert_eq!(diff.to_insert.len(), new_count);
        }
    }
}
