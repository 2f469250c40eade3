//! LINE webhook endpoint
//!
//! The bot only records inbound traffic; replies go out through the push API
//! when events are confirmed.

use axum::Json;
use serde::Deserialize;
use tracing::{debug, info};
use crate::handlers::{ApiResponse, ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: Option<WebhookMessage>,
    #[serde(default)]
    pub source: Option<WebhookSource>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSource {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// GET /api/line/webhook
pub async fn webhook_status() -> Json<ApiResponse<()>> {
    ApiResponse::done("LINE webhook endpoint is active")
}

/// POST /api/line/webhook
pub async fn webhook(Json(payload): Json<WebhookPayload>) -> ApiResult<Json<ApiResponse<usize>>> {
    debug!(destination = ?payload.destination, events = payload.events.len(), "Webhook received");

    for event in &payload.events {
        let user_id = event.source.as_ref().and_then(|s| s.user_id.as_deref());
        match (&event.kind[..], &event.message) {
            ("message", Some(message)) if message.kind == "text" => {
                info!(
                    user_id = user_id,
                    text = message.text.as_deref().unwrap_or_default(),
                    "Text message received"
                );
            }
            (kind, _) => {
                debug!(user_id = user_id, kind = kind, "Webhook event ignored");
            }
        }
    }

    Ok(ApiResponse::ok("Webhook processed", payload.events.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_message_payload() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "destination": "U0000",
            "events": [{
                "type": "message",
                "message": {"type": "text", "id": "1", "text": "hello"},
                "source": {"type": "user", "userId": "U1234"}
            }, {
                "type": "follow",
                "source": {"type": "user", "userId": "U5678"}
            }]
        }))
        .unwrap();

        assert_eq!(payload.events.len(), 2);
        let first = &payload.events[0];
        assert_eq!(first.message.as_ref().unwrap().text.as_deref(), Some("hello"));
        assert_eq!(first.source.as_ref().unwrap().user_id.as_deref(), Some("U1234"));
        assert!(payload.events[1].message.is_none());
    }

    #[tokio::test]
    async fn test_webhook_counts_events() {
        let payload = WebhookPayload::default();
        let response = webhook(Json(payload)).await.unwrap();
        assert_eq!(response.data, Some(0));
    }
}
