//! Session service module.
//!
//! Credentials are validated the only way that is authoritative for this
//! system: by opening a real connection to the target MySQL server. On
//! success the credential pair is sealed into the per-server cookies; no
//! session state is kept server-side.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue};
use validator::Validate;

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::middleware::auth::CookieAuth;
use common::models::server::ServerRegistry;
use common::models::session::{Credentials, Identity, LoginRequest, SessionCheck};
use sqlx::mysql::MySqlConnectOptions;
use sqlx::{ConnectOptions, Connection};

/// Cookie login/logout handshake.
pub struct SessionService {
    config: AppConfig,
    registry: Arc<ServerRegistry>,
    auth: CookieAuth,
}

impl SessionService {
    pub fn new(config: AppConfig, registry: Arc<ServerRegistry>, auth: CookieAuth) -> Self {
        Self {
            config,
            registry,
            auth,
        }
    }

    /// Validates the login against the target server and mints the cookie
    /// pair. Incomplete or rejected credentials surface as the
    /// login-required signal so the client re-prompts.
    pub async fn login(&self, request: LoginRequest) -> AppResult<(Identity, Vec<HeaderValue>)> {
        if request.validate().is_err() {
            return Err(AppError::LoginRequired("please enter a username".into()));
        }

        let server = self
            .registry
            .get(request.server)
            .ok_or_else(|| AppError::ServerNotFound(request.server.to_string()))?;

        let options = MySqlConnectOptions::new()
            .host(&server.host)
            .port(server.port)
            .username(&request.username)
            .password(&request.password);

        let timeout = Duration::from_secs(self.config.connect_timeout_secs);
        let mut conn = tokio::time::timeout(timeout, options.connect())
            .await
            .map_err(|_| AppError::DatabaseConnection("connection timed out".into()))?
            .map_err(map_connect_error)?;
        conn.ping()
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;
        let _ = conn.close().await;

        let credentials = Credentials {
            server: request.server,
            username: request.username,
            password: request.password,
        };
        let cookies = self.auth.issue(&credentials);

        tracing::info!(
            server = credentials.server,
            user = %credentials.username,
            host = %server.host,
            "administrator logged in"
        );
        Ok((credentials.identity(), cookies))
    }

    /// Reports whether the request carries a valid cookie pair.
    pub fn check(&self, headers: &HeaderMap, server: u32) -> SessionCheck {
        match self.auth.verify(headers, server) {
            Some(credentials) => SessionCheck {
                authenticated: true,
                identity: Some(credentials.identity()),
            },
            None => SessionCheck {
                authenticated: false,
                identity: None,
            },
        }
    }

    /// Expires the cookie pair.
    pub fn logout(&self, server: u32) -> Vec<HeaderValue> {
        tracing::info!(server, "session cookies expired");
        CookieAuth::expire(server)
    }
}

/// Distinguishes "bad credentials" from "server unreachable".
fn map_connect_error(err: sqlx::Error) -> AppError {
    match &err {
        // SQLSTATE 28000: invalid authorization (access denied)
        sqlx::Error::Database(db) if db.code().as_deref() == Some("28000") => {
            AppError::LoginRequired(db.message().to_string())
        }
        _ => AppError::DatabaseConnection(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::server::ServerConfig;
    use common::utils::secret_box::{SecretBox, KEY_SIZE};

    fn service() -> SessionService {
        let mut config = AppConfig::load_with_service("session-service-test");
        config.connect_timeout_secs = 1;
        let registry = Arc::new(ServerRegistry::from_servers(vec![ServerConfig {
            id: 1,
            name: String::new(),
            host: "127.0.0.1".into(),
            port: 3306,
            only_db: vec![],
            hide_db: None,
            disable_information_schema: false,
        }]));
        let auth = CookieAuth::new(SecretBox::new(&[1u8; KEY_SIZE]));
        SessionService::new(config, registry, auth)
    }

    #[tokio::test]
    async fn test_login_requires_username() {
        let service = service();
        let request: LoginRequest =
            serde_json::from_str(r#"{"username": "", "password": "x"}"#).unwrap();
        match service.login(request).await {
            Err(AppError::LoginRequired(_)) => {}
            other => panic!("expected LoginRequired, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_login_unknown_server() {
        let service = service();
        let request: LoginRequest =
            serde_json::from_str(r#"{"server": 9, "username": "root"}"#).unwrap();
        match service.login(request).await {
            Err(AppError::ServerNotFound(_)) => {}
            other => panic!("expected ServerNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_check_without_cookies() {
        let service = service();
        let result = service.check(&HeaderMap::new(), 1);
        assert!(!result.authenticated);
        assert!(result.identity.is_none());
    }

    #[test]
    fn test_logout_expires_both_cookies() {
        let service = service();
        let cleared = service.logout(1);
        assert_eq!(cleared.len(), 2);
        for value in cleared {
            let s = value.to_str().unwrap();
            assert!(s.contains("Expires=Thu, 01 Jan 1970"));
        }
    }
}
