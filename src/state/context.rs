//! Application context shared by every request handler

use std::sync::Arc;
use crate::config::Settings;
use crate::services::ServiceFactory;

/// Application-wide context containing services and settings
#[derive(Clone)]
pub struct AppContext {
    pub settings: Arc<Settings>,
    pub services: Arc<ServiceFactory>,
}

impl AppContext {
    /// Create a new AppContext from services
    pub fn new(settings: Settings, services: ServiceFactory) -> Self {
        Self {
            settings: Arc::new(settings),
            services: Arc::new(services),
        }
    }
}
