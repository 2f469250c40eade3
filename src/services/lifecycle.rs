//! Event lifecycle: create, update, delete, confirm
//!
//! Every operation resolves the caller from the [`RequestContext`], checks
//! creator ownership where required and leaves atomicity to the store.
//! Listing invalidation and notification delivery are best-effort: their
//! failures are logged and never change the outcome of the operation.

use std::collections::HashSet;
use std::sync::Arc;
use chrono::Utc;
use tracing::warn;
use crate::database::store::{ConfirmTransition, EventStore};
use crate::models::event::{CreateEventRequest, Event, NewEvent, SlotFields, UpdateEventRequest};
use crate::models::views::{ConfirmationOutcome, CreatedEvent};
use crate::services::cache::ListingCache;
use crate::services::identity::{Identity, RequestContext};
use crate::services::notification::{FanOutReport, NotificationService};
use crate::utils::errors::{PlanlyError, Result};
use crate::utils::helpers::{is_valid_time_of_day, non_blank, today_local};
use crate::utils::logging::log_event_action;

#[derive(Clone)]
pub struct LifecycleService {
    store: Arc<dyn EventStore>,
    cache: Arc<dyn ListingCache>,
    notifications: NotificationService,
}

impl LifecycleService {
    pub fn new(store: Arc<dyn EventStore>, cache: Arc<dyn ListingCache>, notifications: NotificationService) -> Self {
        Self { store, cache, notifications }
    }

    /// Create an event with its candidate slots.
    ///
    /// Without candidates a single 09:00-10:00 slot on today's date is added.
    pub async fn create_event(&self, ctx: &RequestContext, request: CreateEventRequest) -> Result<CreatedEvent> {
        let identity = ctx.require_identity()?;
        let title = validate_title(&request.title)?;

        let slots = if request.candidate_slots.is_empty() {
            vec![SlotFields::default_for(today_local())]
        } else {
            validate_slot_set(request.candidate_slots.iter())?;
            request.candidate_slots
        };

        let (event, slots) = self
            .store
            .create_event(
                NewEvent {
                    title,
                    description: non_blank(request.description),
                    created_by: identity.id.clone(),
                },
                slots,
            )
            .await?;

        self.invalidate_listings(&event.created_by).await;
        log_event_action(event.id, "create", &identity.id, None);

        Ok(CreatedEvent {
            event_id: event.id,
            slot_ids: slots.iter().map(|s| s.id).collect(),
        })
    }

    /// Replace title, description and the complete slot set.
    ///
    /// Slots are reconciled by id: kept ids are edited in place, missing ids
    /// are deleted with their responses, entries without id are inserted.
    pub async fn update_event(&self, ctx: &RequestContext, event_id: i64, request: UpdateEventRequest) -> Result<Event> {
        let identity = ctx.require_identity()?;
        let title = validate_title(&request.title)?;
        self.owned_event(identity, event_id).await?;

        if request.slots.is_empty() {
            return Err(PlanlyError::Validation("An event needs at least one slot".to_string()));
        }
        validate_slot_set(request.slots.iter().map(|d| &d.fields))?;

        let description = non_blank(request.description);
        let (updated, diff) = self
            .store
            .update_event(event_id, &title, description.as_deref(), &request.slots)
            .await?;

        self.invalidate_listings(&updated.created_by).await;
        let details = format!(
            "deleted={} updated={} inserted={}",
            diff.to_delete.len(),
            diff.to_update.len(),
            diff.to_insert.len()
        );
        log_event_action(event_id, "update", &identity.id, Some(&details));

        Ok(updated)
    }

    /// Delete an event with its slots and responses; creator only
    pub async fn delete_event(&self, ctx: &RequestContext, event_id: i64) -> Result<()> {
        let identity = ctx.require_identity()?;
        let event = self.owned_event(identity, event_id).await?;

        if !self.store.delete_event(event_id).await? {
            return Err(PlanlyError::EventNotFound { event_id });
        }

        self.invalidate_listings(&event.created_by).await;
        log_event_action(event_id, "delete", &identity.id, None);
        Ok(())
    }

    /// Settle the event on one of its slots and notify that slot's respondents.
    ///
    /// Confirming again with the same slot succeeds without a second
    /// notification round; any other slot is a conflict.
    pub async fn confirm_event(&self, ctx: &RequestContext, event_id: i64, slot_id: i64) -> Result<ConfirmationOutcome> {
        let identity = ctx.require_identity()?;
        let event = self.owned_event(identity, event_id).await?;

        if event.is_confirmed {
            return already_confirmed(event, slot_id);
        }

        let confirmed = match self.store.confirm_event(event_id, slot_id, Utc::now()).await? {
            ConfirmTransition::Confirmed(event) => event,
            ConfirmTransition::AlreadyConfirmed(event) => return already_confirmed(event, slot_id),
        };

        self.invalidate_listings(&confirmed.created_by).await;
        let report = self.notify_participants(&confirmed, slot_id).await;
        log_event_action(
            event_id,
            "confirm",
            &identity.id,
            Some(&format!("slot={} notified={}/{}", slot_id, report.sent, report.total)),
        );

        Ok(ConfirmationOutcome {
            event_id,
            confirmed_slot_id: slot_id,
            confirmed_at: confirmed.confirmed_at.unwrap_or_else(Utc::now),
            newly_confirmed: true,
            notifications_sent: report.sent,
            notifications_total: report.total,
        })
    }

    async fn owned_event(&self, identity: &Identity, event_id: i64) -> Result<Event> {
        let event = self
            .store
            .find_event(event_id)
            .await?
            .ok_or(PlanlyError::EventNotFound { event_id })?;

        if event.created_by != identity.id {
            return Err(PlanlyError::Forbidden(format!(
                "Only the creator can modify event {}",
                event_id
            )));
        }
        Ok(event)
    }

    async fn notify_participants(&self, event: &Event, slot_id: i64) -> FanOutReport {
        let graph = match self.store.load_event_graph(event.id).await {
            Ok(Some(graph)) => graph,
            Ok(None) => return FanOutReport::default(),
            Err(e) => {
                warn!(event_id = event.id, error = %e, "Could not load participants for confirmation notices");
                return FanOutReport::default();
            }
        };

        match graph.slot(slot_id) {
            Some(slot) => self.notifications.notify_confirmation(event, slot).await,
            None => FanOutReport::default(),
        }
    }

    async fn invalidate_listings(&self, creator: &str) {
        if let Err(e) = self.cache.invalidate(creator).await {
            warn!(creator = creator, error = %e, "Listing invalidation failed");
        }
    }
}

fn already_confirmed(event: Event, slot_id: i64) -> Result<ConfirmationOutcome> {
    match (event.confirmed_slot_id, event.confirmed_at) {
        (Some(confirmed_slot_id), Some(confirmed_at)) if confirmed_slot_id == slot_id => Ok(ConfirmationOutcome {
            event_id: event.id,
            confirmed_slot_id,
            confirmed_at,
            newly_confirmed: false,
            notifications_sent: 0,
            notifications_total: 0,
        }),
        _ => Err(PlanlyError::Conflict(format!(
            "Event {} is already confirmed on another slot",
            event.id
        ))),
    }
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(PlanlyError::Validation("Title is required".to_string()));
    }
    Ok(title.to_string())
}

/// Check times and reject two slots with the same day and window
pub fn validate_slot_set<'a>(slots: impl Iterator<Item = &'a SlotFields>) -> Result<()> {
    let mut seen = HashSet::new();
    for slot in slots {
        validate_slot(slot)?;
        if !seen.insert(slot) {
            return Err(PlanlyError::Validation(format!(
                "Duplicate slot {} {}-{}",
                slot.day, slot.start_at, slot.end_at
            )));
        }
    }
    Ok(())
}

fn validate_slot(slot: &SlotFields) -> Result<()> {
    for time in [&slot.start_at, &slot.end_at] {
        if !is_valid_time_of_day(time) {
            return Err(PlanlyError::Validation(format!("Invalid time of day: {}", time)));
        }
    }
    // Zero-padded HH:MM compares correctly as text
    if slot.start_at >= slot.end_at {
        return Err(PlanlyError::Validation(format!(
            "Slot on {} must start before it ends",
            slot.day
        )));
    }
    Ok(())
}
