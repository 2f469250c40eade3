//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use axum::Router;
use chrono::NaiveDate;
use planly::config::Settings;
use planly::database::InMemoryStore;
use planly::models::event::{CreateEventRequest, SlotFields};
use planly::models::participation::{ParticipationStatus, SlotResponse};
use planly::models::views::CreatedEvent;
use planly::services::{
    Identity, JwtSessionResolver, NoopListingCache, RecordingGateway, RequestContext, ServiceFactory,
};
use planly::state::AppContext;

pub const TEST_SECRET: &str = "planly-test-secret";

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.auth.session_secret = TEST_SECRET.to_string();
    settings.line.app_url = "https://planly.example/".to_string();
    settings.line.channel_access_token = "test-token".to_string();
    settings
}

pub fn day(year: i32, month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, d).unwrap()
}

/// Services wired over the in-memory store and a recording gateway
pub struct TestContext {
    pub settings: Settings,
    pub store: Arc<InMemoryStore>,
    pub gateway: Arc<RecordingGateway>,
    pub services: ServiceFactory,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_gateway(RecordingGateway::new())
    }

    pub fn with_gateway(gateway: RecordingGateway) -> Self {
        let settings = test_settings();
        let store = Arc::new(InMemoryStore::new());
        let gateway = Arc::new(gateway);
        let services = ServiceFactory::new(
            &settings,
            store.clone(),
            store.clone(),
            Arc::new(NoopListingCache),
            gateway.clone(),
        );

        Self {
            settings,
            store,
            gateway,
            services,
        }
    }

    pub fn as_user(&self, user_id: &str) -> RequestContext {
        RequestContext::authenticated(Identity::new(user_id, None))
    }

    pub fn anonymous(&self) -> RequestContext {
        RequestContext::anonymous()
    }

    /// Session token accepted by the router's resolver
    pub fn token_for(&self, user_id: &str, name: Option<&str>) -> String {
        JwtSessionResolver::new(&self.settings.auth)
            .issue_token(&Identity::new(user_id, name), chrono::Duration::hours(1))
            .unwrap()
    }

    pub fn app(&self) -> Router {
        planly::router(AppContext::new(self.settings.clone(), self.services.clone()))
    }

    /// "Tennis" by U1 with slots on 2025-08-10 and 2025-08-11
    pub async fn create_tennis(&self) -> CreatedEvent {
        self.services
            .lifecycle_service
            .create_event(
                &self.as_user("U1"),
                CreateEventRequest {
                    title: "Tennis".to_string(),
                    description: Some("Doubles at the park".to_string()),
                    candidate_slots: vec![
                        SlotFields::new(day(2025, 8, 10), "09:00", "10:00"),
                        SlotFields::new(day(2025, 8, 11), "13:00", "17:00"),
                    ],
                },
            )
            .await
            .unwrap()
    }

    pub async fn respond(&self, user_id: &str, event_id: i64, slot_id: i64, status: ParticipationStatus, comment: Option<&str>) {
        self.services
            .participation_service
            .submit_participation(
                &self.as_user(user_id),
                event_id,
                vec![SlotResponse::new(slot_id, status, comment)],
            )
            .await
            .unwrap();
    }
}
