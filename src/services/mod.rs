//! Services module
//!
//! This module contains business logic services

pub mod cache;
pub mod identity;
pub mod lifecycle;
pub mod notification;
pub mod participation;
pub mod projection;
pub mod query;
pub mod user;

// Re-export commonly used services
pub use cache::{ListingCache, NoopListingCache, RedisListingCache};
pub use identity::{Identity, IdentityResolver, JwtSessionResolver, RequestContext};
pub use lifecycle::LifecycleService;
pub use notification::{DeliveryReport, FanOutReport, LineMessagingGateway, NotificationGateway, NotificationService, RecordingGateway};
pub use participation::ParticipationService;
pub use query::QueryService;
pub use user::UserService;

use std::sync::Arc;
use tracing::info;
use crate::config::settings::Settings;
use crate::database::store::{EventStore, UserStore};
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub lifecycle_service: LifecycleService,
    pub participation_service: ParticipationService,
    pub query_service: QueryService,
    pub user_service: UserService,
    pub identity_resolver: Arc<dyn IdentityResolver>,
    store: Arc<dyn EventStore>,
}

impl ServiceFactory {
    /// Wire services over the given store, cache and gateway
    pub fn new(
        settings: &Settings,
        events: Arc<dyn EventStore>,
        users: Arc<dyn UserStore>,
        cache: Arc<dyn ListingCache>,
        gateway: Arc<dyn NotificationGateway>,
    ) -> Self {
        let notification_service = NotificationService::new(gateway, &settings.line, &settings.notifications);

        Self {
            lifecycle_service: LifecycleService::new(events.clone(), cache.clone(), notification_service),
            participation_service: ParticipationService::new(events.clone(), cache.clone()),
            query_service: QueryService::new(events.clone(), cache),
            user_service: UserService::new(users),
            identity_resolver: Arc::new(JwtSessionResolver::new(&settings.auth)),
            store: events,
        }
    }

    /// Wire the production stack: LINE gateway and, when enabled, Redis cache
    pub async fn from_settings<S>(settings: &Settings, store: Arc<S>) -> Result<Self>
    where
        S: EventStore + UserStore + 'static,
    {
        let gateway = Arc::new(LineMessagingGateway::new(&settings.line, &settings.notifications)?);

        let cache: Arc<dyn ListingCache> = match (&settings.redis, settings.features.listing_cache) {
            (Some(redis), true) => {
                info!("Listing cache enabled");
                Arc::new(RedisListingCache::connect(redis).await?)
            }
            _ => Arc::new(NoopListingCache),
        };

        Ok(Self::new(settings, store.clone(), store, cache, gateway))
    }

    /// Health check for the backing store
    pub async fn health_check(&self) -> Result<()> {
        self.store.health_check().await
    }
}
