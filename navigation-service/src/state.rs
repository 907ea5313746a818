//! Application state for navigation service.

use std::sync::Arc;

use common::config::AppConfig;
use common::middleware::auth::CookieAuth;
use common::models::server::ServerRegistry;

use crate::server_pool::ServerPool;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub auth: CookieAuth,
    pub pools: Arc<ServerPool>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: AppConfig) -> Self {
        let registry = Arc::new(ServerRegistry::load());
        Self {
            auth: CookieAuth::from_config(&config),
            pools: Arc::new(ServerPool::new(config.clone(), registry)),
            config,
        }
    }
}
