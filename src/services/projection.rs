//! Projections from [`EventGraph`] to the views handed to callers.
//!
//! Pure functions; slots keep the (day, start) order the graph carries.

use crate::models::views::{EventDetailView, EventGraph, EventView, ParticipationRecord, ParticipationView, SlotView};
use crate::models::participation::ParticipationStatus;

/// Full view with every participation on every slot
pub fn event_view(graph: &EventGraph) -> EventView {
    project(graph, |_| true)
}

/// View for a specific viewer with their own responses and registration flag
pub fn detail_view(graph: &EventGraph, viewer: Option<&str>) -> EventDetailView {
    let current_user_participation = match viewer {
        Some(user_id) => graph
            .slots
            .iter()
            .flat_map(|s| s.participations.iter())
            .filter(|p| p.participation.user_id == user_id)
            .map(ParticipationView::from)
            .collect(),
        None => Vec::new(),
    };

    EventDetailView {
        event: event_view(graph),
        current_user_participation,
        is_user_registered: viewer.map_or(false, |user_id| is_user_registered(graph, user_id)),
    }
}

/// Whether `user_id` answered every slot of the event
pub fn is_user_registered(graph: &EventGraph, user_id: &str) -> bool {
    !graph.slots.is_empty()
        && graph
            .slots
            .iter()
            .all(|s| s.participations.iter().any(|p| p.participation.user_id == user_id))
}

/// Creator listing entry: each slot carries only the creator's own "yes"
pub fn creator_listing_view(graph: &EventGraph) -> EventView {
    let creator = graph.event.created_by.as_str();
    project(graph, |p| {
        p.participation.user_id == creator && p.participation.status == ParticipationStatus::Yes
    })
}

fn project(graph: &EventGraph, keep: impl Fn(&ParticipationRecord) -> bool) -> EventView {
    let event = &graph.event;
    EventView {
        id: event.id,
        title: event.title.clone(),
        description: event.description.clone(),
        created_by: event.created_by.clone(),
        created_at: event.created_at,
        is_confirmed: event.is_confirmed,
        confirmed_at: event.confirmed_at,
        confirmed_slot_id: event.confirmed_slot_id,
        slots: graph
            .slots
            .iter()
            .map(|s| SlotView {
                id: s.slot.id,
                day: s.slot.day,
                start_at: s.slot.start_at.clone(),
                end_at: s.slot.end_at.clone(),
                participations: s
                    .participations
                    .iter()
                    .filter(|p| keep(p))
                    .map(ParticipationView::from)
                    .collect(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use proptest::prelude::*;
    use crate::models::event::{Event, EventSlot};
    use crate::models::participation::Participation;
    use crate::models::views::SlotGraph;

    fn graph(answers: &[Vec<(&str, ParticipationStatus)>]) -> EventGraph {
        let mut next_id = 0;
        let slots = answers
            .iter()
            .enumerate()
            .map(|(i, slot_answers)| SlotGraph {
                slot: EventSlot {
                    id: i as i64 + 1,
                    event_id: 1,
                    day: NaiveDate::from_ymd_opt(2025, 8, 10).unwrap(),
                    start_at: format!("{:02}:00", i),
                    end_at: format!("{:02}:30", i),
                },
                participations: slot_answers
                    .iter()
                    .map(|(user, status)| {
                        next_id += 1;
                        ParticipationRecord {
                            participation: Participation {
                                id: next_id,
                                event_id: 1,
                                slot_id: i as i64 + 1,
                                user_id: user.to_string(),
                                status: *status,
                                comment: None,
                                created_at: Utc::now(),
                                updated_at: Utc::now(),
                            },
                            user_name: Some(format!("name-{}", user)),
                        }
                    })
                    .collect(),
            })
            .collect();

        EventGraph {
            event: Event {
                id: 1,
                title: "Tennis".to_string(),
                description: None,
                created_by: "U1".to_string(),
                created_at: Utc::now(),
                is_confirmed: false,
                confirmed_at: None,
                confirmed_slot_id: None,
            },
            slots,
        }
    }

    use ParticipationStatus::{Maybe, No, Yes};

    #[test]
    fn test_detail_view_for_viewer() {
        let g = graph(&[vec![("U2", Yes), ("U3", Maybe)], vec![("U2", No)]]);

        let view = detail_view(&g, Some("U2"));
        assert!(view.is_user_registered);
        assert_eq!(view.current_user_participation.len(), 2);
        assert_eq!(view.event.slots[0].participations.len(), 2);
        assert_eq!(view.event.slots[0].participations[1].user_name.as_deref(), Some("name-U3"));

        let partial = detail_view(&g, Some("U3"));
        assert!(!partial.is_user_registered);
        assert_eq!(partial.current_user_participation.len(), 1);
    }

    #[test]
    fn test_anonymous_viewer() {
        let g = graph(&[vec![("U2", Yes)]]);
        let view = detail_view(&g, None);
        assert!(!view.is_user_registered);
        assert!(view.current_user_participation.is_empty());
    }

    #[test]
    fn test_creator_listing_keeps_only_own_yes() {
        let g = graph(&[vec![("U1", Yes), ("U2", Yes)], vec![("U1", Maybe), ("U3", Yes)]]);
        let view = creator_listing_view(&g);

        assert_eq!(view.slots[0].participations.len(), 1);
        assert_eq!(view.slots[0].participations[0].user_id, "U1");
        assert!(view.slots[1].participations.is_empty());
    }

    proptest! {
        #[test]
        fn registration_requires_every_slot(slot_count in 1usize..8, dropped in 0usize..8) {
            let full: Vec<Vec<(&str, ParticipationStatus)>> =
                (0..slot_count).map(|_| vec![("U2", Maybe), ("U3", Yes)]).collect();
            prop_assert!(is_user_registered(&graph(&full), "U2"));

            let mut partial = full.clone();
            partial[dropped % slot_count].retain(|(user, _)| *user != "U2");
            prop_assert!(!is_user_registered(&graph(&partial), "U2"));
            prop_assert!(is_user_registered(&graph(&partial), "U3"));
        }
    }
}
