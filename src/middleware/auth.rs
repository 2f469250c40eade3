//! Authentication extractors for axum.
//!
//! Identity is resolved per request from the request headers; nothing is
//! stored between requests.
//!
//! - `SessionContext` always succeeds and carries `Option<Identity>`
//! - `CurrentUser` rejects with 401 when no identity resolves

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use crate::handlers::ApiError;
use crate::services::identity::{Identity, RequestContext};
use crate::state::AppContext;
use crate::utils::errors::PlanlyError;

/// Per-request caller context, authenticated or not
#[derive(Debug, Clone)]
pub struct SessionContext(pub RequestContext);

#[async_trait]
impl FromRequestParts<AppContext> for SessionContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppContext) -> Result<Self, Self::Rejection> {
        let identity = state.services.identity_resolver.resolve(&parts.headers);
        let ctx = RequestContext::new(identity);
        tracing::debug!(
            request_id = %ctx.request_id,
            authenticated = ctx.identity.is_some(),
            "Request identity resolved"
        );
        Ok(SessionContext(ctx))
    }
}

/// Extractor that requires an authenticated caller
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppContext> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppContext) -> Result<Self, Self::Rejection> {
        state
            .services
            .identity_resolver
            .resolve(&parts.headers)
            .map(CurrentUser)
            .ok_or(ApiError(PlanlyError::Unauthenticated))
    }
}
