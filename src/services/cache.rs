//! Listing cache
//!
//! Creator listings are the one read view worth caching: they are fetched on
//! every visit to the organizer's page and change only when one of the
//! creator's events (or a response to it) changes. Every mutation calls
//! [`ListingCache::invalidate`] for the event's creator.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::debug;
use crate::config::settings::RedisConfig;
use crate::models::views::EventView;
use crate::utils::errors::{PlanlyError, Result};

#[async_trait]
pub trait ListingCache: Send + Sync {
    async fn get_creator_listing(&self, creator: &str) -> Result<Option<Vec<EventView>>>;

    async fn put_creator_listing(&self, creator: &str, listing: &[EventView]) -> Result<()>;

    /// Signal that listings involving `creator`'s events may be stale
    async fn invalidate(&self, creator: &str) -> Result<()>;
}

/// Cache used when Redis is not configured
#[derive(Debug, Clone, Default)]
pub struct NoopListingCache;

#[async_trait]
impl ListingCache for NoopListingCache {
    async fn get_creator_listing(&self, _creator: &str) -> Result<Option<Vec<EventView>>> {
        Ok(None)
    }

    async fn put_creator_listing(&self, _creator: &str, _listing: &[EventView]) -> Result<()> {
        Ok(())
    }

    async fn invalidate(&self, _creator: &str) -> Result<()> {
        Ok(())
    }
}

/// Redis-backed listing cache
#[derive(Clone)]
pub struct RedisListingCache {
    connection: ConnectionManager,
    prefix: String,
    ttl_seconds: u64,
}

impl RedisListingCache {
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str()).map_err(PlanlyError::Redis)?;
        let connection = ConnectionManager::new(client).await.map_err(PlanlyError::Redis)?;

        Ok(Self {
            connection,
            prefix: config.prefix.clone(),
            ttl_seconds: config.ttl_seconds,
        })
    }

    fn creator_key(&self, creator: &str) -> String {
        creator_listing_key(&self.prefix, creator)
    }
}

pub(crate) fn creator_listing_key(prefix: &str, creator: &str) -> String {
    format!("{}listing:creator:{}", prefix, creator)
}

#[async_trait]
impl ListingCache for RedisListingCache {
    async fn get_creator_listing(&self, creator: &str) -> Result<Option<Vec<EventView>>> {
        let mut conn = self.connection.clone();
        let key = self.creator_key(creator);

        let cached: Option<String> = conn.get(&key).await.map_err(PlanlyError::Redis)?;
        match cached {
            Some(data) => {
                let listing = serde_json::from_str::<Vec<EventView>>(&data)
                    .map_err(PlanlyError::Serialization)?;
                debug!(key = %key, "Creator listing served from cache");
                Ok(Some(listing))
            }
            None => Ok(None),
        }
    }

    async fn put_creator_listing(&self, creator: &str, listing: &[EventView]) -> Result<()> {
        let mut conn = self.connection.clone();
        let key = self.creator_key(creator);
        let serialized = serde_json::to_string(listing).map_err(PlanlyError::Serialization)?;

        let _: () = conn
            .set_ex(&key, serialized, self.ttl_seconds)
            .await
            .map_err(PlanlyError::Redis)?;

        debug!(key = %key, ttl = self.ttl_seconds, "Creator listing cached");
        Ok(())
    }

    async fn invalidate(&self, creator: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        let key = self.creator_key(creator);

        let deleted: i32 = conn.del(&key).await.map_err(PlanlyError::Redis)?;
        debug!(key = %key, deleted = deleted > 0, "Creator listing invalidated");
        Ok(())
    }
}
