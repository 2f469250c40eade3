//! Notification service implementation
//!
//! Renders the confirmation message every participant of the confirmed slot
//! receives and fans it out through a [`NotificationGateway`]. The gateway
//! only transports text; delivery failures are reported, never raised.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};
use crate::config::settings::{LineConfig, NotificationConfig};
use crate::models::event::Event;
use crate::models::participation::ParticipationStatus;
use crate::models::views::SlotGraph;
use crate::utils::errors::{PlanlyError, Result};
use crate::utils::helpers::{format_english_date, format_japanese_date, format_time_range, truncate_text};
use crate::utils::logging::log_notification_fanout;

/// LINE rejects text messages longer than this
const MAX_TEXT_LENGTH: usize = 5000;

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub delivered: bool,
    pub error: Option<String>,
}

impl DeliveryReport {
    pub fn delivered() -> Self {
        Self { delivered: true, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { delivered: false, error: Some(error.into()) }
    }
}

/// Transport for rendered messages
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send(&self, target: &str, text: &str) -> DeliveryReport;
}

#[derive(Serialize)]
struct PushMessage<'a> {
    to: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

struct PushFailure {
    retryable: bool,
    message: String,
}

/// Gateway posting push messages to the LINE Messaging API
pub struct LineMessagingGateway {
    client: Client,
    endpoint: String,
    channel_access_token: String,
    max_retries: u32,
    retry_backoff: Duration,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl LineMessagingGateway {
    pub fn new(line: &LineConfig, notifications: &NotificationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(notifications.timeout_seconds))
            .user_agent("Planly/1.0")
            .build()
            .map_err(PlanlyError::Http)?;

        let limiter = NonZeroU32::new(notifications.per_second)
            .map(|rate| Arc::new(RateLimiter::direct(Quota::per_second(rate))));

        Ok(Self {
            client,
            endpoint: line.push_api_url.clone(),
            channel_access_token: line.channel_access_token.clone(),
            max_retries: notifications.max_retries,
            retry_backoff: Duration::from_millis(250),
            limiter,
        })
    }

    /// Base delay between retries; attempt `n` waits `n` times this plus jitter
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    async fn push(&self, message: &PushMessage<'_>) -> std::result::Result<(), PushFailure> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.channel_access_token)
            .json(message)
            .send()
            .await
            .map_err(|e| PushFailure {
                retryable: e.is_timeout() || e.is_connect(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(PushFailure {
            retryable: status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
            message: format!("LINE push failed with status {}: {}", status, truncate_text(&body, 200)),
        })
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let jitter_ms = rand::thread_rng().gen_range(0..=self.retry_backoff.as_millis() as u64 / 2);
        self.retry_backoff * attempt + Duration::from_millis(jitter_ms)
    }
}

#[async_trait]
impl NotificationGateway for LineMessagingGateway {
    async fn send(&self, target: &str, text: &str) -> DeliveryReport {
        let text = truncate_text(text, MAX_TEXT_LENGTH);
        let message = PushMessage {
            to: target,
            messages: [TextMessage { kind: "text", text: &text }],
        };

        let mut attempt = 0;
        loop {
            if let Some(limiter) = &self.limiter {
                limiter.until_ready().await;
            }

            match self.push(&message).await {
                Ok(()) => {
                    debug!(recipient = target, attempt = attempt, "Push message delivered");
                    return DeliveryReport::delivered();
                }
                Err(failure) if failure.retryable && attempt < self.max_retries => {
                    attempt += 1;
                    debug!(recipient = target, attempt = attempt, error = %failure.message, "Retrying push message");
                    tokio::time::sleep(self.backoff(attempt)).await;
                }
                Err(failure) => {
                    warn!(recipient = target, error = %failure.message, "Failed to deliver push message");
                    return DeliveryReport::failed(failure.message);
                }
            }
        }
    }
}

/// Gateway that keeps messages in memory; used for dry runs and tests
#[derive(Debug, Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<(String, String)>>,
    failing: HashSet<String>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliveries to these targets fail
    pub fn failing_for<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: targets.into_iter().map(Into::into).collect(),
        }
    }

    /// Delivered messages as (target, text)
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn sent_to(&self, target: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(t, _)| t == target)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn send(&self, target: &str, text: &str) -> DeliveryReport {
        if self.failing.contains(target) {
            return DeliveryReport::failed(format!("delivery to {} refused", target));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((target.to_string(), text.to_string()));
        DeliveryReport::delivered()
    }
}

/// Outcome of a confirmation fan-out
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FanOutReport {
    pub sent: usize,
    pub total: usize,
    pub failed_recipients: Vec<String>,
}

/// Message templates keyed by template name, then language
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    content: HashMap<String, HashMap<String, String>>,
    default_language: String,
}

impl MessageTemplates {
    pub fn new(default_language: &str) -> Self {
        Self {
            content: Self::load_default_templates(),
            default_language: default_language.to_string(),
        }
    }

    /// Format message using template and parameters
    pub fn format_message(&self, template_key: &str, language: &str, parameters: &HashMap<&str, String>) -> Result<String> {
        let template = self.content.get(template_key)
            .ok_or_else(|| PlanlyError::Config(format!("Template not found: {}", template_key)))?;

        let content = template.get(language)
            .or_else(|| template.get(&self.default_language))
            .ok_or_else(|| PlanlyError::Config(format!("Template content not found for language: {}", language)))?;

        let mut formatted = content.clone();
        for (key, value) in parameters {
            let placeholder = format!("{{{}}}", key);
            formatted = formatted.replace(&placeholder, value);
        }

        Ok(formatted)
    }

    fn load_default_templates() -> HashMap<String, HashMap<String, String>> {
        let mut templates = HashMap::new();

        let mut insert = |key: &str, ja: &str, en: &str| {
            let mut content = HashMap::new();
            content.insert("ja".to_string(), ja.to_string());
            content.insert("en".to_string(), en.to_string());
            templates.insert(key.to_string(), content);
        };

        insert(
            "event_confirmed",
            "🎉 イベントが確定しました！\n\n📅 イベント名: {event_title}\n🕒 確定日時: {confirmed_date} {confirmed_time}\n🔗 確認URL: {app_url}",
            "🎉 Your event has been confirmed!\n\n📅 Event: {event_title}\n🕒 When: {confirmed_date} {confirmed_time}\n🔗 Details: {app_url}",
        );
        insert(
            "closing_yes",
            "ご参加ありがとうございました！",
            "Thank you for joining!",
        );
        insert(
            "closing_maybe",
            "あなたは△でしたが、どうするか作成者に言ってくださいね。",
            "You answered maybe. Please let the organizer know whether you can make it.",
        );
        insert(
            "closing_no",
            "確定しましたが不参加のようですね。またのご参加お待ちしております。",
            "The date is set, but it looks like you can't make it. We hope to see you next time.",
        );
        insert(
            "closing_absent",
            "アンケートにご参加ありがとうございました！",
            "Thank you for answering the poll!",
        );

        templates
    }
}

/// Renders and fans out confirmation notices
#[derive(Clone)]
pub struct NotificationService {
    gateway: Arc<dyn NotificationGateway>,
    templates: MessageTemplates,
    language: String,
    app_url: String,
    max_concurrency: usize,
}

impl NotificationService {
    pub fn new(gateway: Arc<dyn NotificationGateway>, line: &LineConfig, notifications: &NotificationConfig) -> Self {
        Self {
            gateway,
            templates: MessageTemplates::new(&notifications.default_language),
            language: notifications.default_language.clone(),
            app_url: line.app_url.trim_end_matches('/').to_string(),
            max_concurrency: notifications.max_concurrency.max(1),
        }
    }

    /// Confirmation text for a participant with the given status on the slot
    pub fn render_confirmation(&self, event: &Event, slot: &SlotGraph, status: Option<ParticipationStatus>) -> Result<String> {
        let confirmed_date = match self.language.as_str() {
            "en" => format_english_date(slot.slot.day),
            _ => format_japanese_date(slot.slot.day),
        };

        let mut parameters = HashMap::new();
        parameters.insert("event_title", event.title.clone());
        parameters.insert("confirmed_date", confirmed_date);
        parameters.insert("confirmed_time", format_time_range(&slot.slot.start_at, &slot.slot.end_at));
        parameters.insert("app_url", format!("{}/attendEvent", self.app_url));

        let base = self.templates.format_message("event_confirmed", &self.language, &parameters)?;
        let closing_key = match status {
            Some(ParticipationStatus::Yes) => "closing_yes",
            Some(ParticipationStatus::Maybe) => "closing_maybe",
            Some(ParticipationStatus::No) => "closing_no",
            None => "closing_absent",
        };
        let closing = self.templates.format_message(closing_key, &self.language, &parameters)?;

        Ok(format!("{}\n\n{}", base, closing))
    }

    /// Send one confirmation per distinct participant of the confirmed slot.
    ///
    /// Deliveries run concurrently up to `max_concurrency`; failures are
    /// collected in the report.
    pub async fn notify_confirmation(&self, event: &Event, slot: &SlotGraph) -> FanOutReport {
        let mut seen = HashSet::new();
        let mut messages = Vec::new();
        let mut unrendered = Vec::new();
        for record in &slot.participations {
            let user_id = &record.participation.user_id;
            if !seen.insert(user_id.clone()) {
                continue;
            }
            match self.render_confirmation(event, slot, Some(record.participation.status)) {
                Ok(text) => messages.push((user_id.clone(), text)),
                Err(e) => {
                    warn!(event_id = event.id, user_id = %user_id, error = %e, "Failed to render confirmation");
                    unrendered.push(user_id.clone());
                }
            }
        }

        let total = seen.len();
        let gateway = &self.gateway;
        let results: Vec<(String, DeliveryReport)> = stream::iter(messages)
            .map(|(user_id, text)| async move {
                let report = gateway.send(&user_id, &text).await;
                (user_id, report)
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut report = FanOutReport {
            total,
            failed_recipients: unrendered,
            ..FanOutReport::default()
        };
        for (user_id, delivery) in results {
            if delivery.delivered {
                report.sent += 1;
            } else {
                warn!(
                    event_id = event.id,
                    user_id = %user_id,
                    error = delivery.error.as_deref().unwrap_or("unknown"),
                    "Confirmation notice not delivered"
                );
                report.failed_recipients.push(user_id);
            }
        }
        report.failed_recipients.sort();

        log_notification_fanout(event.id, report.sent, report.total);
        report
    }
}
