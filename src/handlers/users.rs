//! User endpoints

use axum::extract::State;
use axum::Json;
use crate::handlers::{ApiResponse, ApiResult};
use crate::middleware::auth::{CurrentUser, SessionContext};
use crate::models::user::User;
use crate::state::AppContext;

/// GET /api/users/me
pub async fn me(
    State(ctx): State<AppContext>,
    SessionContext(session): SessionContext,
) -> ApiResult<Json<ApiResponse<User>>> {
    let user = ctx.services.user_service.get_user(&session).await?;
    Ok(ApiResponse::ok("Current user", user))
}

/// POST /api/users/me/sign-in
///
/// Called by the client after each successful login.
pub async fn sign_in(
    State(ctx): State<AppContext>,
    CurrentUser(identity): CurrentUser,
) -> ApiResult<Json<ApiResponse<User>>> {
    let user = ctx
        .services
        .user_service
        .record_sign_in(&identity.id, identity.name.clone())
        .await?;
    Ok(ApiResponse::ok("Signed in", user))
}

/// POST /api/users/me/friend-added
pub async fn friend_added(
    State(ctx): State<AppContext>,
    SessionContext(session): SessionContext,
) -> ApiResult<Json<ApiResponse<User>>> {
    let user = ctx.services.user_service.mark_friend_added(&session).await?;
    Ok(ApiResponse::ok("Friend flag updated", user))
}
