//! Per-server MySQL connection pools.
//!
//! Pools are keyed by server id plus account, created lazily from the
//! administrator's cookie credentials, and cached for the life of the
//! process. The first connection to a server also probes its capabilities
//! (version string, whether the information-schema catalog is usable),
//! which feed the navigation settings.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::navigation::NavigationConfig;
use common::models::server::ServerRegistry;
use common::models::session::Credentials;
use serde::Serialize;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{MySqlPool, Row};
use tokio::sync::RwLock;
use utoipa::ToSchema;

/// Probed facts about one server, cached per pool.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServerCapabilities {
    /// Raw VERSION() string.
    pub server_version: String,
    /// Whether `INFORMATION_SCHEMA.SCHEMATA` answered a probe query.
    pub catalog_usable: bool,
}

/// Manages MySQL pools for all configured servers.
pub struct ServerPool {
    config: AppConfig,
    registry: Arc<ServerRegistry>,
    /// Pools keyed by "server/account".
    pools: RwLock<HashMap<String, MySqlPool>>,
    /// Probe results, same key space as `pools`.
    capabilities: RwLock<HashMap<String, ServerCapabilities>>,
}

impl ServerPool {
    pub fn new(config: AppConfig, registry: Arc<ServerRegistry>) -> Self {
        Self {
            config,
            registry,
            pools: RwLock::new(HashMap::new()),
            capabilities: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &ServerRegistry {
        &self.registry
    }

    /// Number of configured servers.
    pub fn server_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of live pools.
    pub async fn pool_count(&self) -> usize {
        self.pools.read().await.len()
    }

    fn pool_key(credentials: &Credentials) -> String {
        format!("{}/{}", credentials.server, credentials.username)
    }

    /// Returns the pool for the given credentials, connecting on first use.
    ///
    /// A rejected MySQL account surfaces as the login-required signal so the
    /// client re-prompts instead of reporting a server fault.
    pub async fn pool(&self, credentials: &Credentials) -> AppResult<MySqlPool> {
        let key = Self::pool_key(credentials);
        if let Some(pool) = self.pools.read().await.get(&key) {
            return Ok(pool.clone());
        }

        let server = self
            .registry
            .get(credentials.server)
            .ok_or_else(|| AppError::ServerNotFound(credentials.server.to_string()))?;

        let options = MySqlConnectOptions::new()
            .host(&server.host)
            .port(server.port)
            .username(&credentials.username)
            .password(&credentials.password);

        let pool = MySqlPoolOptions::new()
            .max_connections(self.config.max_connections)
            .acquire_timeout(Duration::from_secs(self.config.connect_timeout_secs))
            .connect_with(options)
            .await
            .map_err(map_connect_error)?;

        let caps = probe_capabilities(&pool).await;
        tracing::info!(
            server = credentials.server,
            user = %credentials.username,
            version = %caps.server_version,
            catalog = caps.catalog_usable,
            "connected to server"
        );

        self.capabilities.write().await.insert(key.clone(), caps);
        self.pools.write().await.insert(key, pool.clone());
        Ok(pool)
    }

    /// Probed capabilities for the given credentials (connects if needed).
    pub async fn capabilities(&self, credentials: &Credentials) -> AppResult<ServerCapabilities> {
        let key = Self::pool_key(credentials);
        if let Some(caps) = self.capabilities.read().await.get(&key) {
            return Ok(caps.clone());
        }
        self.pool(credentials).await?;
        self.capabilities
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| AppError::Internal("capability probe missing after connect".into()))
    }

    /// Assembles the navigation settings for the target server.
    pub async fn navigation_config(&self, credentials: &Credentials) -> AppResult<NavigationConfig> {
        let server = self
            .registry
            .get(credentials.server)
            .ok_or_else(|| AppError::ServerNotFound(credentials.server.to_string()))?;
        let caps = self.capabilities(credentials).await?;
        Ok(NavigationConfig::assemble(
            &self.config,
            server,
            caps.catalog_usable,
        ))
    }

    /// Runs a composed listing statement and extracts the name column.
    pub async fn fetch_names(
        &self,
        pool: &MySqlPool,
        query: &crate::lister::BuiltQuery,
    ) -> AppResult<Vec<String>> {
        let rows = sqlx::query(&query.sql)
            .fetch_all(pool)
            .await
            .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;

        let mut names = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: Option<String> = match query.column {
                crate::lister::NameColumn::Index(i) => row.try_get(i).ok(),
                crate::lister::NameColumn::Named(n) => row.try_get(n).ok(),
            };
            if let Some(name) = name {
                names.push(name);
            }
        }
        Ok(names)
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

async fn probe_capabilities(pool: &MySqlPool) -> ServerCapabilities {
    let server_version = sqlx::query("SELECT VERSION()")
        .fetch_one(pool)
        .await
        .ok()
        .and_then(|row| row.try_get::<String, _>(0).ok())
        .unwrap_or_else(|| "unknown".to_string());

    let catalog_usable = sqlx::query(
        "SELECT `SCHEMA_NAME` FROM `INFORMATION_SCHEMA`.`SCHEMATA` \
         WHERE `SCHEMA_NAME` = 'information_schema'",
    )
    .fetch_optional(pool)
    .await
    .map(|row| row.is_some())
    .unwrap_or(false);

    ServerCapabilities {
        server_version,
        catalog_usable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_key_includes_account() {
        let a = Credentials {
            server: 1,
            username: "root".into(),
            password: "x".into(),
        };
        let b = Credentials {
            server: 1,
            username: "reader".into(),
            password: "x".into(),
        };
        assert_ne!(ServerPool::pool_key(&a), ServerPool::pool_key(&b));
        assert_eq!(ServerPool::pool_key(&a), "1/root");
    }
}
