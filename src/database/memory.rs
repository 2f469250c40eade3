//! In-memory store
//!
//! Implements the same contracts as the Postgres service on top of a single
//! mutex-guarded state. Each operation holds the lock for its whole duration
//! and validates before it writes, so operations are atomic.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::database::graph::assemble_graphs;
use crate::database::store::{partition_responses, ConfirmTransition, EventStore, ParticipantFilter, ParticipationBatch, UserStore};
use crate::models::event::{compute_slot_diff, Event, EventSlot, NewEvent, SlotDiff, SlotDraft, SlotFields};
use crate::models::participation::{Participation, ParticipationUpsert};
use crate::models::user::{User, UpsertUserRequest};
use crate::models::views::{EventGraph, ParticipationRecord};
use crate::utils::errors::{PlanlyError, Result};

#[derive(Debug, Default)]
struct State {
    next_event_id: i64,
    next_slot_id: i64,
    next_participation_id: i64,
    events: BTreeMap<i64, Event>,
    slots: BTreeMap<i64, EventSlot>,
    participations: BTreeMap<i64, Participation>,
    users: HashMap<String, User>,
}

impl State {
    fn insert_slot(&mut self, event_id: i64, fields: &SlotFields) -> EventSlot {
        self.next_slot_id += 1;
        let slot = EventSlot {
            id: self.next_slot_id,
            event_id,
            day: fields.day,
            start_at: fields.start_at.clone(),
            end_at: fields.end_at.clone(),
        };
        self.slots.insert(slot.id, slot.clone());
        slot
    }

    /// Slots of an event ordered by (day, start)
    fn slots_of(&self, event_id: i64) -> Vec<EventSlot> {
        let mut slots: Vec<EventSlot> = self
            .slots
            .values()
            .filter(|s| s.event_id == event_id)
            .cloned()
            .collect();
        slots.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        slots
    }

    fn slot_belongs(&self, event_id: i64, slot_id: i64) -> bool {
        self.slots.get(&slot_id).map_or(false, |s| s.event_id == event_id)
    }

    fn graphs(&self, events: Vec<Event>) -> Vec<EventGraph> {
        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        let slots = self
            .slots
            .values()
            .filter(|s| ids.contains(&s.event_id))
            .cloned()
            .collect();
        let participations = self
            .participations
            .values()
            .filter(|p| ids.contains(&p.event_id))
            .map(|p| ParticipationRecord {
                participation: p.clone(),
                user_name: self.users.get(&p.user_id).and_then(|u| u.name.clone()),
            })
            .collect();

        assemble_graphs(events, slots, participations)
    }

    /// All events as graphs, newest first
    fn all_graphs(&self) -> Vec<EventGraph> {
        let mut events: Vec<Event> = self.events.values().cloned().collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        self.graphs(events)
    }
}

/// Store kept entirely in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail with a store error, or recover
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn slot_count(&self) -> usize {
        self.lock().map(|s| s.slots.len()).unwrap_or_default()
    }

    pub fn participation_count(&self) -> usize {
        self.lock().map(|s| s.participations.len()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PlanlyError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.state.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn create_event(&self, event: NewEvent, slots: Vec<SlotFields>) -> Result<(Event, Vec<EventSlot>)> {
        let mut state = self.lock()?;

        state.next_event_id += 1;
        let created = Event {
            id: state.next_event_id,
            title: event.title,
            description: event.description,
            created_by: event.created_by,
            created_at: Utc::now(),
            is_confirmed: false,
            confirmed_at: None,
            confirmed_slot_id: None,
        };
        state.events.insert(created.id, created.clone());

        let stored = slots.iter().map(|fields| state.insert_slot(created.id, fields)).collect();
        Ok((created, stored))
    }

    async fn find_event(&self, event_id: i64) -> Result<Option<Event>> {
        Ok(self.lock()?.events.get(&event_id).cloned())
    }

    async fn update_event(
        &self,
        event_id: i64,
        title: &str,
        description: Option<&str>,
        slots: &[SlotDraft],
    ) -> Result<(Event, SlotDiff)> {
        let mut state = self.lock()?;

        let event = state
            .events
            .get(&event_id)
            .cloned()
            .ok_or(PlanlyError::EventNotFound { event_id })?;

        let diff = compute_slot_diff(event_id, &state.slots_of(event_id), slots)?;

        if event.is_confirmed && !diff.is_empty() {
            return Err(PlanlyError::Conflict(format!(
                "Event {} is confirmed; its slots can no longer change",
                event_id
            )));
        }

        let updated = Event {
            title: title.to_string(),
            description: description.map(str::to_string),
            ..event
        };
        state.events.insert(event_id, updated.clone());

        for slot_id in &diff.to_delete {
            state.slots.remove(slot_id);
            state.participations.retain(|_, p| p.slot_id != *slot_id);
        }
        for (slot_id, fields) in &diff.to_update {
            if let Some(slot) = state.slots.get_mut(slot_id) {
                slot.day = fields.day;
                slot.start_at = fields.start_at.clone();
                slot.end_at = fields.end_at.clone();
            }
        }
        for fields in &diff.to_insert {
            state.insert_slot(event_id, fields);
        }

        Ok((updated, diff))
    }

    async fn delete_event(&self, event_id: i64) -> Result<bool> {
        let mut state = self.lock()?;

        if state.events.remove(&event_id).is_none() {
            return Ok(false);
        }
        state.slots.retain(|_, s| s.event_id != event_id);
        state.participations.retain(|_, p| p.event_id != event_id);
        Ok(true)
    }

    async fn confirm_event(&self, event_id: i64, slot_id: i64, at: DateTime<Utc>) -> Result<ConfirmTransition> {
        let mut state = self.lock()?;

        let event = state
            .events
            .get(&event_id)
            .cloned()
            .ok_or(PlanlyError::EventNotFound { event_id })?;

        if event.is_confirmed {
            return Ok(ConfirmTransition::AlreadyConfirmed(event));
        }
        if !state.slot_belongs(event_id, slot_id) {
            return Err(PlanlyError::SlotNotFound { event_id, slot_id });
        }

        let confirmed = Event {
            is_confirmed: true,
            confirmed_at: Some(at),
            confirmed_slot_id: Some(slot_id),
            ..event
        };
        state.events.insert(event_id, confirmed.clone());
        Ok(ConfirmTransition::Confirmed(confirmed))
    }

    async fn upsert_participations(
        &self,
        event_id: i64,
        user_id: &str,
        responses: &[ParticipationUpsert],
    ) -> Result<ParticipationBatch> {
        let mut state = self.lock()?;

        if !state.events.contains_key(&event_id) {
            return Err(PlanlyError::EventNotFound { event_id });
        }
        let slot_ids: HashSet<i64> = state.slots_of(event_id).iter().map(|s| s.id).collect();
        let (known, skipped_slot_ids) = partition_responses(&slot_ids, responses);

        let now = Utc::now();
        let mut saved = Vec::with_capacity(known.len());
        for response in known {
            let existing = state
                .participations
                .values()
                .find(|p| p.event_id == event_id && p.slot_id == response.slot_id && p.user_id == user_id)
                .map(|p| p.id);

            let participation = match existing.and_then(|id| state.participations.get_mut(&id)) {
                Some(p) => {
                    p.status = response.status;
                    p.comment = response.comment.clone();
                    p.updated_at = now;
                    p.clone()
                }
                None => {
                    state.next_participation_id += 1;
                    let p = Participation {
                        id: state.next_participation_id,
                        event_id,
                        slot_id: response.slot_id,
                        user_id: user_id.to_string(),
                        status: response.status,
                        comment: response.comment.clone(),
                        created_at: now,
                        updated_at: now,
                    };
                    state.participations.insert(p.id, p.clone());
                    p
                }
            };
            saved.push(participation);
        }

        Ok(ParticipationBatch { saved, skipped_slot_ids })
    }

    async fn load_event_graph(&self, event_id: i64) -> Result<Option<EventGraph>> {
        let state = self.lock()?;
        let Some(event) = state.events.get(&event_id).cloned() else {
            return Ok(None);
        };
        Ok(state.graphs(vec![event]).pop())
    }

    async fn events_by_creator(&self, creator: &str) -> Result<Vec<EventGraph>> {
        let state = self.lock()?;
        Ok(state
            .all_graphs()
            .into_iter()
            .filter(|g| g.event.created_by == creator)
            .collect())
    }

    async fn events_with_participant(&self, user_id: &str, filter: ParticipantFilter) -> Result<Vec<EventGraph>> {
        let state = self.lock()?;
        Ok(state
            .all_graphs()
            .into_iter()
            .filter(|g| filter.matches(g, user_id))
            .collect())
    }

    async fn health_check(&self) -> Result<()> {
        self.lock().map(|_| ())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn upsert_user(&self, request: &UpsertUserRequest) -> Result<User> {
        let mut state = self.lock()?;
        let now = Utc::now();

        let user = state
            .users
            .entry(request.id.clone())
            .and_modify(|u| {
                if request.name.is_some() {
                    u.name = request.name.clone();
                }
                u.updated_at = now;
            })
            .or_insert_with(|| User {
                id: request.id.clone(),
                name: request.name.clone(),
                is_friend_added: false,
                created_at: now,
                updated_at: now,
            });

        Ok(user.clone())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.lock()?.users.get(user_id).cloned())
    }

    async fn set_friend_added(&self, user_id: &str) -> Result<Option<User>> {
        let mut state = self.lock()?;
        Ok(state.users.get_mut(user_id).map(|u| {
            if !u.is_friend_added {
                u.is_friend_added = true;
                u.updated_at = Utc::now();
            }
            u.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use crate::models::participation::ParticipationStatus;

    fn fields(d: u32, start: &str, end: &str) -> SlotFields {
        SlotFields::new(NaiveDate::from_ymd_opt(2025, 8, d).unwrap(), start, end)
    }

    async fn seeded() -> (InMemoryStore, Event, Vec<EventSlot>) {
        let store = InMemoryStore::new();
        let (event, slots) = store
            .create_event(
                NewEvent {
                    title: "Tennis".to_string(),
                    description: None,
                    created_by: "U1".to_string(),
                },
                vec![fields(10, "09:00", "10:00"), fields(11, "13:00", "17:00")],
            )
            .await
            .unwrap();
        (store, event, slots)
    }

    fn yes(slot_id: i64) -> ParticipationUpsert {
        ParticipationUpsert { slot_id, status: ParticipationStatus::Yes, comment: None }
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_row_per_triple() {
        let (store, event, slots) = seeded().await;

        let first = store.upsert_participations(event.id, "U2", &[yes(slots[0].id)]).await.unwrap();
        let second = store.upsert_participations(event.id, "U2", &[yes(slots[0].id)]).await.unwrap();

        assert_eq!(first.saved[0].id, second.saved[0].id);
        assert_eq!(store.participation_count(), 1);
    }

    #[tokio::test]
    async fn test_upsert_skips_slots_of_other_events() {
        let (store, event, slots) = seeded().await;

        let batch = store
            .upsert_participations(event.id, "U2", &[yes(slots[0].id), yes(999), yes(999)])
            .await
            .unwrap();

        assert_eq!(batch.saved.len(), 1);
        assert_eq!(batch.skipped_slot_ids, vec![999]);
        assert_eq!(store.participation_count(), 1);
    }

    #[test]
    fn test_upsert_on_missing_event() {
        let store = InMemoryStore::new();
        let result = tokio_test::block_on(store.upsert_participations(42, "U2", &[yes(1)]));
        assert_matches!(result, Err(PlanlyError::EventNotFound { event_id: 42 }));
    }

    #[tokio::test]
    async fn test_update_with_foreign_slot_changes_nothing() {
        let (store, event, slots) = seeded().await;
        let drafts = vec![
            SlotDraft::existing(slots[0].id, fields(10, "09:00", "10:00")),
            SlotDraft::existing(999, fields(12, "09:00", "10:00")),
        ];

        let result = store.update_event(event.id, "Renamed", None, &drafts).await;

        assert_matches!(result, Err(PlanlyError::SlotNotFound { slot_id: 999, .. }));
        assert_eq!(store.slot_count(), 2);
        assert_eq!(store.find_event(event.id).await.unwrap().unwrap().title, "Tennis");
    }

    #[tokio::test]
    async fn test_update_reconciles_against_current_slots() {
        let (store, event, slots) = seeded().await;
        let kept = SlotDraft::existing(slots[0].id, fields(10, "09:00", "10:00"));

        // Another editor adds a slot after this caller read the event
        let (_, added) = store
            .update_event(
                event.id,
                "Tennis",
                None,
                &[
                    kept.clone(),
                    SlotDraft::existing(slots[1].id, fields(11, "13:00", "17:00")),
                    SlotDraft::new_slot(fields(12, "09:00", "10:00")),
                ],
            )
            .await
            .unwrap();
        assert_eq!(added.to_insert.len(), 1);

        let (_, diff) = store.update_event(event.id, "Tennis", None, &[kept]).await.unwrap();

        assert_eq!(diff.to_delete.len(), 2);
        assert_eq!(store.slot_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_updates_leave_one_submitted_set() {
        let (store, event, slots) = seeded().await;
        let store = std::sync::Arc::new(store);
        let event_id = event.id;
        let kept = slots[0].id;

        let handles: Vec<_> = (0..8u32)
            .map(|n| {
                let store = store.clone();
                tokio::spawn(async move {
                    let drafts = [
                        SlotDraft::existing(kept, fields(10, "09:00", "10:00")),
                        SlotDraft::new_slot(fields(12 + n, "09:00", "10:00")),
                    ];
                    store.update_event(event_id, "Tennis", None, &drafts).await
                })
            })
            .collect();
        for handle in handles {
            tokio_test::assert_ok!(handle.await.unwrap());
        }

        assert_eq!(store.slot_count(), 2);
    }

    #[tokio::test]
    async fn test_confirm_is_conditional() {
        let (store, event, slots) = seeded().await;

        let first = store.confirm_event(event.id, slots[0].id, Utc::now()).await.unwrap();
        assert_matches!(first, ConfirmTransition::Confirmed(e) if e.confirmed_slot_id == Some(slots[0].id));

        let second = store.confirm_event(event.id, slots[1].id, Utc::now()).await.unwrap();
        assert_matches!(second, ConfirmTransition::AlreadyConfirmed(e) if e.confirmed_slot_id == Some(slots[0].id));
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let (store, event, slots) = seeded().await;
        store.upsert_participations(event.id, "U2", &[yes(slots[0].id), yes(slots[1].id)]).await.unwrap();

        assert!(store.delete_event(event.id).await.unwrap());
        assert!(!store.delete_event(event.id).await.unwrap());
        assert_eq!(store.slot_count(), 0);
        assert_eq!(store.participation_count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let (store, event, _) = seeded().await;
        store.set_unavailable(true);

        assert_matches!(store.find_event(event.id).await, Err(PlanlyError::Database(_)));
        assert!(store.health_check().await.is_err());

        store.set_unavailable(false);
        assert!(store.find_event(event.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_graph_carries_user_names() {
        let (store, event, slots) = seeded().await;
        store
            .upsert_user(&UpsertUserRequest { id: "U2".to_string(), name: Some("Hanako".to_string()) })
            .await
            .unwrap();
        store.upsert_participations(event.id, "U2", &[yes(slots[0].id)]).await.unwrap();

        let graph = store.load_event_graph(event.id).await.unwrap().unwrap();
        assert_eq!(graph.slots[0].participations[0].user_name.as_deref(), Some("Hanako"));
    }
}
