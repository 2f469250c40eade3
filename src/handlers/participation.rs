//! Participation endpoint

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use crate::handlers::{ApiResponse, ApiResult};
use crate::middleware::auth::SessionContext;
use crate::models::participation::SlotResponse;
use crate::models::views::SubmissionReceipt;
use crate::state::AppContext;

#[derive(Debug, Deserialize)]
pub struct SubmitParticipationRequest {
    pub responses: Vec<SlotResponse>,
}

/// POST /api/events/:id/participations
pub async fn submit_participation(
    State(ctx): State<AppContext>,
    SessionContext(session): SessionContext,
    Path(event_id): Path<i64>,
    Json(request): Json<SubmitParticipationRequest>,
) -> ApiResult<Json<ApiResponse<SubmissionReceipt>>> {
    let receipt = ctx
        .services
        .participation_service
        .submit_participation(&session, event_id, request.responses)
        .await?;

    Ok(ApiResponse::ok("Participation saved", receipt))
}
