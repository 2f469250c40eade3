//! User service implementation
//!
//! Keeps the user projection in step with the identity provider: a row is
//! upserted on each sign-in and the friend flag flips once the user links the
//! messaging channel.

use std::sync::Arc;
use tracing::{debug, info};
use crate::database::store::UserStore;
use crate::models::user::{User, UpsertUserRequest};
use crate::services::identity::RequestContext;
use crate::utils::errors::{PlanlyError, Result};
use crate::utils::helpers::non_blank;

/// User service for managing user operations
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    /// Create a new UserService instance
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Insert the user or refresh its display name
    pub async fn record_sign_in(&self, identity_id: &str, name: Option<String>) -> Result<User> {
        if identity_id.trim().is_empty() {
            return Err(PlanlyError::Validation("Identity id is required".to_string()));
        }

        let user = self
            .store
            .upsert_user(&UpsertUserRequest {
                id: identity_id.to_string(),
                name: non_blank(name),
            })
            .await?;

        debug!(user_id = %user.id, "User projection refreshed");
        Ok(user)
    }

    /// Flip the caller's friend flag; idempotent
    pub async fn mark_friend_added(&self, ctx: &RequestContext) -> Result<User> {
        let identity = ctx.require_identity()?;

        let user = self
            .store
            .set_friend_added(&identity.id)
            .await?
            .ok_or_else(|| PlanlyError::UserNotFound { user_id: identity.id.clone() })?;

        info!(user_id = %user.id, "Messaging channel linked");
        Ok(user)
    }

    /// The caller's own projection
    pub async fn get_user(&self, ctx: &RequestContext) -> Result<User> {
        let identity = ctx.require_identity()?;

        self.store
            .find_user(&identity.id)
            .await?
            .ok_or_else(|| PlanlyError::UserNotFound { user_id: identity.id.clone() })
    }
}
