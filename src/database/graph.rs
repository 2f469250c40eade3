//! Assembly of flat event, slot and participation rows into [`EventGraph`]s

use std::collections::HashMap;
use crate::models::event::{Event, EventSlot};
use crate::models::views::{EventGraph, ParticipationRecord, SlotGraph};

/// Group rows by owner, keeping `events` in their given order.
///
/// Slots are sorted by (day, start, id); participations keep their relative
/// order. Rows whose owner is not in the input are dropped.
pub fn assemble_graphs(
    events: Vec<Event>,
    slots: Vec<EventSlot>,
    participations: Vec<ParticipationRecord>,
) -> Vec<EventGraph> {
    let mut by_slot: HashMap<i64, Vec<ParticipationRecord>> = HashMap::new();
    for record in participations {
        by_slot.entry(record.participation.slot_id).or_default().push(record);
    }

    let mut by_event: HashMap<i64, Vec<SlotGraph>> = HashMap::new();
    for slot in slots {
        let participations = by_slot.remove(&slot.id).unwrap_or_default();
        by_event
            .entry(slot.event_id)
            .or_default()
            .push(SlotGraph { slot, participations });
    }

    events
        .into_iter()
        .map(|event| {
            let mut slots = by_event.remove(&event.id).unwrap_or_default();
            slots.sort_by(|a, b| a.slot.sort_key().cmp(&b.slot.sort_key()));
            EventGraph { event, slots }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use crate::models::participation::{Participation, ParticipationStatus};

    fn event(id: i64) -> Event {
        Event {
            id,
            title: format!("Event {}", id),
            description: None,
            created_by: "U1".to_string(),
            created_at: Utc::now(),
            is_confirmed: false,
            confirmed_at: None,
            confirmed_slot_id: None,
        }
    }

    fn slot(id: i64, event_id: i64, day: u32, start: &str) -> EventSlot {
        EventSlot {
            id,
            event_id,
            day: NaiveDate::from_ymd_opt(2025, 8, day).unwrap(),
            start_at: start.to_string(),
            end_at: "23:00".to_string(),
        }
    }

    fn record(id: i64, event_id: i64, slot_id: i64, user: &str) -> ParticipationRecord {
        ParticipationRecord {
            participation: Participation {
                id,
                event_id,
                slot_id,
                user_id: user.to_string(),
                status: ParticipationStatus::Yes,
                comment: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            user_name: None,
        }
    }

    #[test]
    fn test_slots_sorted_by_day_then_start() {
        let graphs = assemble_graphs(
            vec![event(1)],
            vec![slot(3, 1, 11, "09:00"), slot(2, 1, 10, "13:00"), slot(1, 1, 10, "09:00")],
            vec![],
        );

        let ids: Vec<i64> = graphs[0].slots.iter().map(|s| s.slot.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_rows_attach_to_their_owner() {
        let graphs = assemble_graphs(
            vec![event(2), event(1)],
            vec![slot(10, 1, 10, "09:00"), slot(20, 2, 10, "09:00")],
            vec![record(1, 1, 10, "U2"), record(2, 2, 20, "U3"), record(3, 1, 10, "U3")],
        );

        assert_eq!(graphs[0].event.id, 2);
        assert_eq!(graphs[0].slots[0].participations.len(), 1);
        assert_eq!(graphs[1].slots[0].participations.len(), 2);
        assert!(graphs[1].has_participant("U2"));
        assert!(!graphs[0].has_participant("U2"));
    }
}
