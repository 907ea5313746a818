//! Application state for session service.

use std::sync::Arc;

use common::config::AppConfig;
use common::middleware::auth::CookieAuth;
use common::models::server::ServerRegistry;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub auth: CookieAuth,
    pub registry: Arc<ServerRegistry>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: AppConfig) -> Self {
        Self {
            auth: CookieAuth::from_config(&config),
            registry: Arc::new(ServerRegistry::load()),
            config,
        }
    }
}
