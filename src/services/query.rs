//! Read side: event page and listings
//!
//! No side effects beyond filling the listing cache. Store failures are
//! returned as errors, never as empty results.

use std::sync::Arc;
use chrono::NaiveDate;
use tracing::warn;
use crate::database::store::{EventStore, ParticipantFilter};
use crate::models::views::{EventDetailView, EventView};
use crate::services::cache::ListingCache;
use crate::services::projection::{creator_listing_view, detail_view, event_view};
use crate::utils::errors::Result;
use crate::utils::helpers::today_local;

#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn EventStore>,
    cache: Arc<dyn ListingCache>,
}

impl QueryService {
    pub fn new(store: Arc<dyn EventStore>, cache: Arc<dyn ListingCache>) -> Self {
        Self { store, cache }
    }

    /// Event page for `viewer`; `None` if the event does not exist
    pub async fn get_event_by_id(&self, event_id: i64, viewer: Option<&str>) -> Result<Option<EventDetailView>> {
        let graph = self.store.load_event_graph(event_id).await?;
        Ok(graph.map(|g| detail_view(&g, viewer)))
    }

    /// Events created by `creator`, newest first
    pub async fn get_my_events(&self, creator: &str) -> Result<Vec<EventView>> {
        match self.cache.get_creator_listing(creator).await {
            Ok(Some(listing)) => return Ok(listing),
            Ok(None) => {}
            Err(e) => warn!(creator = creator, error = %e, "Listing cache read failed"),
        }

        let listing: Vec<EventView> = self
            .store
            .events_by_creator(creator)
            .await?
            .iter()
            .map(creator_listing_view)
            .collect();

        if let Err(e) = self.cache.put_creator_listing(creator, &listing).await {
            warn!(creator = creator, error = %e, "Listing cache write failed");
        }

        Ok(listing)
    }

    /// Events with a slot today or later that `user_id` answered
    pub async fn get_upcoming_events(&self, user_id: &str) -> Result<Vec<EventView>> {
        self.get_upcoming_events_on(user_id, today_local()).await
    }

    pub async fn get_upcoming_events_on(&self, user_id: &str, today: NaiveDate) -> Result<Vec<EventView>> {
        self.list(user_id, ParticipantFilter::UpcomingSlots { today }).await
    }

    /// Confirmed events `user_id` answered whose date has passed
    pub async fn get_past_events(&self, user_id: &str) -> Result<Vec<EventView>> {
        self.get_past_events_on(user_id, today_local()).await
    }

    pub async fn get_past_events_on(&self, user_id: &str, today: NaiveDate) -> Result<Vec<EventView>> {
        self.list(user_id, ParticipantFilter::ConfirmedBefore { today }).await
    }

    /// Confirmed events `user_id` answered, before or from today
    pub async fn get_attend_events(&self, before: bool, user_id: &str) -> Result<Vec<EventView>> {
        self.get_attend_events_on(before, user_id, today_local()).await
    }

    pub async fn get_attend_events_on(&self, before: bool, user_id: &str, today: NaiveDate) -> Result<Vec<EventView>> {
        let filter = if before {
            ParticipantFilter::ConfirmedBefore { today }
        } else {
            ParticipantFilter::ConfirmedOnOrAfter { today }
        };
        self.list(user_id, filter).await
    }

    async fn list(&self, user_id: &str, filter: ParticipantFilter) -> Result<Vec<EventView>> {
        let graphs = self.store.events_with_participant(user_id, filter).await?;
        Ok(graphs.iter().map(event_view).collect())
    }
}
