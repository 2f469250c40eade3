//! Persistence contracts used by the services
//!
//! The services only see [`EventStore`] and [`UserStore`]. Postgres
//! ([`DatabaseService`]) and the in-memory store in `memory.rs` implement
//! both. Every mutating method is atomic: it either applies completely or
//! leaves the store untouched.

use std::collections::HashSet;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use crate::database::graph::assemble_graphs;
use crate::database::repositories::{EventRepository, ParticipationRepository, SlotRepository};
use crate::database::service::DatabaseService;
use crate::models::event::{compute_slot_diff, Event, EventSlot, NewEvent, SlotDiff, SlotDraft, SlotFields};
use crate::models::participation::{Participation, ParticipationUpsert};
use crate::models::user::{User, UpsertUserRequest};
use crate::models::views::EventGraph;
use crate::utils::errors::{PlanlyError, Result};

/// Outcome of a confirmation attempt that found the event and slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmTransition {
    /// This call moved the event to confirmed
    Confirmed(Event),
    /// The event was confirmed before this call; carries the stored state
    AlreadyConfirmed(Event),
}

/// Outcome of a participation batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipationBatch {
    pub saved: Vec<Participation>,
    /// Submitted slot ids that are not slots of the event, in first-seen order
    pub skipped_slot_ids: Vec<i64>,
}

/// Split responses into those on the event's slots and the foreign slot ids
pub(crate) fn partition_responses<'a>(
    slot_ids: &HashSet<i64>,
    responses: &'a [ParticipationUpsert],
) -> (Vec<&'a ParticipationUpsert>, Vec<i64>) {
    let mut known = Vec::with_capacity(responses.len());
    let mut skipped = Vec::new();
    for response in responses {
        if slot_ids.contains(&response.slot_id) {
            known.push(response);
        } else if !skipped.contains(&response.slot_id) {
            skipped.push(response.slot_id);
        }
    }
    (known, skipped)
}

/// Event predicates for participant listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantFilter {
    /// Any event with a slot on or after `today` that the user answered
    UpcomingSlots { today: NaiveDate },
    /// Confirmed events the user answered whose confirmed day is before `today`
    ConfirmedBefore { today: NaiveDate },
    /// Confirmed events the user answered whose confirmed day is `today` or later
    ConfirmedOnOrAfter { today: NaiveDate },
}

impl ParticipantFilter {
    pub fn matches(&self, graph: &EventGraph, user_id: &str) -> bool {
        match *self {
            ParticipantFilter::UpcomingSlots { today } => graph.slots.iter().any(|s| {
                s.slot.day >= today
                    && s.participations.iter().any(|p| p.participation.user_id == user_id)
            }),
            ParticipantFilter::ConfirmedBefore { today } => {
                Self::confirmed_day(graph).map_or(false, |day| day < today)
                    && graph.has_participant(user_id)
            }
            ParticipantFilter::ConfirmedOnOrAfter { today } => {
                Self::confirmed_day(graph).map_or(false, |day| day >= today)
                    && graph.has_participant(user_id)
            }
        }
    }

    fn confirmed_day(graph: &EventGraph) -> Option<NaiveDate> {
        if !graph.event.is_confirmed {
            return None;
        }
        graph.confirmed_slot().map(|s| s.slot.day)
    }
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist an event with its slots in one transaction
    async fn create_event(&self, event: NewEvent, slots: Vec<SlotFields>) -> Result<(Event, Vec<EventSlot>)>;

    async fn find_event(&self, event_id: i64) -> Result<Option<Event>>;

    /// Overwrite title and description and make `slots` the complete slot set.
    ///
    /// The diff against the stored slots is computed and applied while the
    /// event is locked, so slots written by a concurrent update are
    /// reconciled too. Returns the updated event and the applied diff.
    ///
    /// # Errors
    ///
    /// - `EventNotFound` if the event is gone
    /// - `SlotNotFound` if a draft refers to a slot that is not the event's
    /// - `Conflict` if the event is confirmed and the slot set would change
    async fn update_event(
        &self,
        event_id: i64,
        title: &str,
        description: Option<&str>,
        slots: &[SlotDraft],
    ) -> Result<(Event, SlotDiff)>;

    /// Delete an event with its slots and participations.
    ///
    /// Returns `false` if there was nothing to delete.
    async fn delete_event(&self, event_id: i64) -> Result<bool>;

    /// Confirm the event on `slot_id` unless it is already confirmed.
    ///
    /// The check and the write are a single conditional update.
    ///
    /// # Errors
    ///
    /// - `EventNotFound` if the event is gone
    /// - `SlotNotFound` if the event is unconfirmed and the slot is not its own
    async fn confirm_event(&self, event_id: i64, slot_id: i64, at: DateTime<Utc>) -> Result<ConfirmTransition>;

    /// Insert or overwrite one response per slot for `user_id`, all or nothing.
    ///
    /// Responses on slots that are not the event's at write time are skipped
    /// and reported. Fails with `EventNotFound` if the event is gone.
    async fn upsert_participations(
        &self,
        event_id: i64,
        user_id: &str,
        responses: &[ParticipationUpsert],
    ) -> Result<ParticipationBatch>;

    async fn load_event_graph(&self, event_id: i64) -> Result<Option<EventGraph>>;

    /// Events created by `creator`, newest first
    async fn events_by_creator(&self, creator: &str) -> Result<Vec<EventGraph>>;

    /// Events matching `filter` for `user_id`, newest first
    async fn events_with_participant(&self, user_id: &str, filter: ParticipantFilter) -> Result<Vec<EventGraph>>;

    async fn health_check(&self) -> Result<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn upsert_user(&self, request: &UpsertUserRequest) -> Result<User>;

    async fn find_user(&self, user_id: &str) -> Result<Option<User>>;

    /// Returns `None` if the user does not exist
    async fn set_friend_added(&self, user_id: &str) -> Result<Option<User>>;
}

impl DatabaseService {
    async fn load_graphs(&self, events: Vec<Event>) -> Result<Vec<EventGraph>> {
        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        let slots = self.slots.list_for_events(&ids).await?;
        let participations = self.participations.list_for_events(&ids).await?;

        Ok(assemble_graphs(events, slots, participations))
    }
}

#[async_trait]
impl EventStore for DatabaseService {
    async fn create_event(&self, event: NewEvent, slots: Vec<SlotFields>) -> Result<(Event, Vec<EventSlot>)> {
        let mut tx = self.pool.begin().await?;

        let created = EventRepository::insert(&mut *tx, &event).await?;
        let mut stored = Vec::with_capacity(slots.len());
        for fields in &slots {
            stored.push(SlotRepository::insert(&mut *tx, created.id, fields).await?);
        }

        tx.commit().await?;
        Ok((created, stored))
    }

    async fn find_event(&self, event_id: i64) -> Result<Option<Event>> {
        self.events.find_by_id(event_id).await
    }

    async fn update_event(
        &self,
        event_id: i64,
        title: &str,
        description: Option<&str>,
        slots: &[SlotDraft],
    ) -> Result<(Event, SlotDiff)> {
        let mut tx = self.pool.begin().await?;

        let event = EventRepository::find_for_update(&mut *tx, event_id)
            .await?
            .ok_or(PlanlyError::EventNotFound { event_id })?;

        let current = SlotRepository::list_for_event_in(&mut *tx, event_id).await?;
        let diff = compute_slot_diff(event_id, &current, slots)?;

        if event.is_confirmed && !diff.is_empty() {
            return Err(PlanlyError::Conflict(format!(
                "Event {} is confirmed; its slots can no longer change",
                event_id
            )));
        }

        EventRepository::update_details(&mut *tx, event_id, title, description).await?;
        SlotRepository::delete_many(&mut *tx, event_id, &diff.to_delete).await?;
        for (slot_id, fields) in &diff.to_update {
            SlotRepository::update(&mut *tx, event_id, *slot_id, fields).await?;
        }
        for fields in &diff.to_insert {
            SlotRepository::insert(&mut *tx, event_id, fields).await?;
        }

        tx.commit().await?;

        let updated = Event {
            title: title.to_string(),
            description: description.map(str::to_string),
            ..event
        };
        Ok((updated, diff))
    }

    async fn delete_event(&self, event_id: i64) -> Result<bool> {
        self.events.delete(event_id).await
    }

    async fn confirm_event(&self, event_id: i64, slot_id: i64, at: DateTime<Utc>) -> Result<ConfirmTransition> {
        if let Some(event) = self.events.confirm(event_id, slot_id, at).await? {
            return Ok(ConfirmTransition::Confirmed(event));
        }

        match self.events.find_by_id(event_id).await? {
            None => Err(PlanlyError::EventNotFound { event_id }),
            Some(event) if event.is_confirmed => Ok(ConfirmTransition::AlreadyConfirmed(event)),
            Some(_) => Err(PlanlyError::SlotNotFound { event_id, slot_id }),
        }
    }

    async fn upsert_participations(
        &self,
        event_id: i64,
        user_id: &str,
        responses: &[ParticipationUpsert],
    ) -> Result<ParticipationBatch> {
        let mut tx = self.pool.begin().await?;

        // Shared lock: slot edits and deletion wait for this batch
        if !EventRepository::lock_shared(&mut *tx, event_id).await? {
            return Err(PlanlyError::EventNotFound { event_id });
        }
        let slot_ids: HashSet<i64> = SlotRepository::list_for_event_in(&mut *tx, event_id)
            .await?
            .iter()
            .map(|s| s.id)
            .collect();
        let (known, skipped_slot_ids) = partition_responses(&slot_ids, responses);

        let mut saved = Vec::with_capacity(known.len());
        for response in known {
            saved.push(ParticipationRepository::upsert(&mut *tx, event_id, user_id, response).await?);
        }

        tx.commit().await?;
        Ok(ParticipationBatch { saved, skipped_slot_ids })
    }

    async fn load_event_graph(&self, event_id: i64) -> Result<Option<EventGraph>> {
        let Some(event) = self.events.find_by_id(event_id).await? else {
            return Ok(None);
        };

        Ok(self.load_graphs(vec![event]).await?.pop())
    }

    async fn events_by_creator(&self, creator: &str) -> Result<Vec<EventGraph>> {
        let events = self.events.list_by_creator(creator).await?;
        self.load_graphs(events).await
    }

    async fn events_with_participant(&self, user_id: &str, filter: ParticipantFilter) -> Result<Vec<EventGraph>> {
        let events = match filter {
            ParticipantFilter::UpcomingSlots { today } => {
                self.events.list_with_upcoming_participation(user_id, today).await?
            }
            ParticipantFilter::ConfirmedBefore { today } => {
                self.events.list_confirmed_with_participant(user_id, today, true).await?
            }
            ParticipantFilter::ConfirmedOnOrAfter { today } => {
                self.events.list_confirmed_with_participant(user_id, today, false).await?
            }
        };

        self.load_graphs(events).await
    }

    async fn health_check(&self) -> Result<()> {
        crate::database::connection::health_check(&self.pool).await
    }
}

#[async_trait]
impl UserStore for DatabaseService {
    async fn upsert_user(&self, request: &UpsertUserRequest) -> Result<User> {
        self.users.upsert(request).await
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        self.users.find_by_id(user_id).await
    }

    async fn set_friend_added(&self, user_id: &str) -> Result<Option<User>> {
        self.users.set_friend_added(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::participation::{Participation, ParticipationStatus};
    use crate::models::views::{ParticipationRecord, SlotGraph};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    fn graph(confirmed_on: Option<u32>, slot_days: &[u32], answered_by: &str) -> EventGraph {
        let slots = slot_days
            .iter()
            .enumerate()
            .map(|(i, d)| SlotGraph {
                slot: EventSlot {
                    id: i as i64 + 1,
                    event_id: 1,
                    day: day(*d),
                    start_at: "09:00".to_string(),
                    end_at: "10:00".to_string(),
                },
                participations: vec![ParticipationRecord {
                    participation: Participation {
                        id: i as i64 + 1,
                        event_id: 1,
                        slot_id: i as i64 + 1,
                        user_id: answered_by.to_string(),
                        status: ParticipationStatus::Yes,
                        comment: None,
                        created_at: Utc::now(),
                        updated_at: Utc::now(),
                    },
                    user_name: None,
                }],
            })
            .collect::<Vec<_>>();

        let confirmed_slot_id = confirmed_on
            .and_then(|d| slots.iter().find(|s| s.slot.day == day(d)))
            .map(|s| s.slot.id);

        EventGraph {
            event: Event {
                id: 1,
                title: "Tennis".to_string(),
                description: None,
                created_by: "U1".to_string(),
                created_at: Utc::now(),
                is_confirmed: confirmed_slot_id.is_some(),
                confirmed_at: confirmed_slot_id.map(|_| Utc::now()),
                confirmed_slot_id,
            },
            slots,
        }
    }

    #[test]
    fn test_confirmed_day_partitions_at_today() {
        let today = day(10);
        for (confirmed, past) in [(9, true), (10, false), (11, false)] {
            let g = graph(Some(confirmed), &[9, 10, 11], "U2");
            assert_eq!(ParticipantFilter::ConfirmedBefore { today }.matches(&g, "U2"), past);
            assert_eq!(ParticipantFilter::ConfirmedOnOrAfter { today }.matches(&g, "U2"), !past);
        }
    }

    #[test]
    fn test_unconfirmed_events_are_neither_past_nor_attending() {
        let today = day(10);
        let g = graph(None, &[9, 11], "U2");
        assert!(!ParticipantFilter::ConfirmedBefore { today }.matches(&g, "U2"));
        assert!(!ParticipantFilter::ConfirmedOnOrAfter { today }.matches(&g, "U2"));
        assert!(ParticipantFilter::UpcomingSlots { today }.matches(&g, "U2"));
    }

    #[test]
    fn test_filters_require_participation() {
        let today = day(10);
        let g = graph(Some(9), &[9, 11], "U2");
        assert!(!ParticipantFilter::ConfirmedBefore { today }.matches(&g, "U3"));
        assert!(!ParticipantFilter::UpcomingSlots { today }.matches(&g, "U3"));
    }

    #[test]
    fn test_upcoming_ignores_answers_on_past_slots() {
        let g = graph(None, &[9], "U2");
        assert!(!ParticipantFilter::UpcomingSlots { today: day(10) }.matches(&g, "U2"));
        assert!(ParticipantFilter::UpcomingSlots { today: day(9) }.matches(&g, "U2"));
    }

    #[test]
    fn test_partition_reports_each_foreign_slot_once() {
        let slot_ids: HashSet<i64> = [1, 2].into_iter().collect();
        let responses: Vec<ParticipationUpsert> = [1, 7, 2, 7, 9]
            .into_iter()
            .map(|slot_id| ParticipationUpsert { slot_id, status: ParticipationStatus::Yes, comment: None })
            .collect();

        let (known, skipped) = partition_responses(&slot_ids, &responses);
        assert_eq!(known.iter().map(|r| r.slot_id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(skipped, vec![7, 9]);
    }

    #[test]
    fn test_stores_are_object_safe() {
        fn _accepts_dyn(_events: &dyn EventStore, _users: &dyn UserStore) {}
    }
}
