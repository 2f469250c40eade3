//! HTTP handlers module
//!
//! Thin axum surface over the services. Every endpoint answers with the same
//! JSON envelope `{success, message, data?}`; failures map from
//! [`ErrorKind`] to a status code.

pub mod events;
pub mod health;
pub mod line;
pub mod participation;
pub mod users;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::state::AppContext;
use crate::utils::errors::{ErrorKind, PlanlyError};
use crate::utils::logging::log_api_error;

/// Response envelope shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
        })
    }
}

impl ApiResponse<()> {
    pub fn done(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: None,
        })
    }
}

/// Error returned from handlers
#[derive(Debug)]
pub struct ApiError(pub PlanlyError);

impl From<PlanlyError> for ApiError {
    fn from(error: PlanlyError) -> Self {
        Self(error)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Store | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        if matches!(kind, ErrorKind::Store | ErrorKind::Internal) {
            log_api_error("http", &self.0.to_string(), Some(&self.0.severity().to_string()));
        }

        let body = ApiResponse::<()> {
            success: false,
            message: self.0.public_message(),
            data: None,
        };
        (status_for(kind), Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Build the application router
pub fn router(ctx: AppContext) -> Router {
    let api = Router::new()
        .route("/events", post(events::create_event))
        .route("/events/mine", get(events::my_events))
        .route("/events/upcoming", get(events::upcoming_events))
        .route("/events/past", get(events::past_events))
        .route("/events/attending", get(events::attend_events))
        .route(
            "/events/:id",
            get(events::get_event).put(events::update_event).delete(events::delete_event),
        )
        .route("/events/:id/confirm", post(events::confirm_event))
        .route("/events/:id/participations", post(participation::submit_participation))
        .route("/users/me", get(users::me))
        .route("/users/me/sign-in", post(users::sign_in))
        .route("/users/me/friend-added", post(users::friend_added))
        .route("/line/webhook", get(line::webhook_status).post(line::webhook));

    Router::new()
        .nest("/api", api)
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::Store), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_envelope_omits_missing_data() {
        let json = serde_json::to_value(&*ApiResponse::done("Deleted")).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "message": "Deleted"}));
    }
}
