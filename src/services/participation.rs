//! Participation reconciler
//!
//! An invitee's submission is a batch of per-slot answers. Each answer is an
//! upsert keyed on (event, slot, user), so resubmitting only overwrites.

use std::sync::Arc;
use tracing::warn;
use crate::database::store::EventStore;
use crate::models::participation::{ParticipationUpsert, SlotResponse};
use crate::models::views::SubmissionReceipt;
use crate::services::cache::ListingCache;
use crate::services::identity::RequestContext;
use crate::utils::errors::{PlanlyError, Result};
use crate::utils::helpers::non_blank;
use crate::utils::logging::log_participation;

#[derive(Clone)]
pub struct ParticipationService {
    store: Arc<dyn EventStore>,
    cache: Arc<dyn ListingCache>,
}

impl ParticipationService {
    pub fn new(store: Arc<dyn EventStore>, cache: Arc<dyn ListingCache>) -> Self {
        Self { store, cache }
    }

    /// Record the caller's answers for the event's slots.
    ///
    /// Answers for slots outside the event are skipped and listed in the
    /// receipt. When one slot appears several times the last answer wins.
    /// The remaining answers are written all together or not at all.
    pub async fn submit_participation(
        &self,
        ctx: &RequestContext,
        event_id: i64,
        responses: Vec<SlotResponse>,
    ) -> Result<SubmissionReceipt> {
        let identity = ctx.require_identity()?;

        let event = self
            .store
            .find_event(event_id)
            .await?
            .ok_or(PlanlyError::EventNotFound { event_id })?;

        let upserts = collapse_responses(responses);
        let batch = self
            .store
            .upsert_participations(event_id, &identity.id, &upserts)
            .await?;

        if let Err(e) = self.cache.invalidate(&event.created_by).await {
            warn!(creator = %event.created_by, error = %e, "Listing invalidation failed");
        }
        log_participation(event_id, &identity.id, batch.saved.len(), batch.skipped_slot_ids.len());

        Ok(SubmissionReceipt {
            saved: batch.saved.len(),
            skipped_slot_ids: batch.skipped_slot_ids,
        })
    }
}

/// One upsert per slot with trimmed comments; a later answer replaces an earlier one
fn collapse_responses(responses: Vec<SlotResponse>) -> Vec<ParticipationUpsert> {
    let mut upserts: Vec<ParticipationUpsert> = Vec::with_capacity(responses.len());

    for response in responses {
        let upsert = ParticipationUpsert {
            slot_id: response.slot_id,
            status: response.status,
            comment: non_blank(response.comment),
        };
        match upserts.iter_mut().find(|u| u.slot_id == upsert.slot_id) {
            Some(existing) => *existing = upsert,
            None => upserts.push(upsert),
        }
    }

    upserts
}
