//! Application state for gateway service.

use common::config::{AppConfig, ServiceUrls};
use common::middleware::auth::{secret_from_config, CookieAuth};
use common::utils::UrlCipher;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub service_urls: ServiceUrls,
    pub http_client: reqwest::Client,
    pub auth: CookieAuth,
    pub url_cipher: UrlCipher,
}

impl AppState {
    /// Creates a new application state.
    ///
    /// Cookie auth and the URL cipher share one secret so a client can use
    /// either transport with the same key material.
    pub fn new(config: AppConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        let secret = secret_from_config(&config);
        Self {
            service_urls: ServiceUrls::load(),
            http_client,
            auth: CookieAuth::new(secret.clone()),
            url_cipher: UrlCipher::new(secret, config.url_encryption),
            config,
        }
    }
}
