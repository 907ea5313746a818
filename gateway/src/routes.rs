//! Gateway route module.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Creates the gateway routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/health/all", get(aggregated_health))
}

/// Gateway health check.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Gateway is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "gateway".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Aggregated health check across all services.
#[utoipa::path(
    get,
    path = "/api/health/all",
    tag = "health",
    responses(
        (status = 200, description = "Aggregated health state", body = AggregatedHealth)
    )
)]
pub async fn aggregated_health(State(state): State<AppState>) -> Json<AggregatedHealth> {
    let services = vec![
        check_service_health(
            &state.http_client,
            "session-service",
            &state.service_urls.session_service,
        )
        .await,
        check_service_health(
            &state.http_client,
            "navigation-service",
            &state.service_urls.navigation_service,
        )
        .await,
    ];

    let all_healthy = services.iter().all(|s| s.healthy);

    Json(AggregatedHealth {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        timestamp: Utc::now(),
        services,
    })
}

async fn check_service_health(client: &reqwest::Client, name: &str, url: &str) -> ServiceHealth {
    let health_url = format!("{}/api/health", url);

    match client.get(&health_url).send().await {
        Ok(response) if response.status().is_success() => ServiceHealth {
            name: name.to_string(),
            url: url.to_string(),
            healthy: true,
            error: None,
        },
        Ok(response) => ServiceHealth {
            name: name.to_string(),
            url: url.to_string(),
            healthy: false,
            error: Some(format!("HTTP {}", response.status())),
        },
        Err(e) => ServiceHealth {
            name: name.to_string(),
            url: url.to_string(),
            healthy: false,
            error: Some(e.to_string()),
        },
    }
}

/// Health check response.
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Current timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Aggregated health response.
#[derive(Serialize, ToSchema)]
pub struct AggregatedHealth {
    /// Overall status.
    pub status: String,
    /// Current timestamp.
    pub timestamp: DateTime<Utc>,
    /// Per-service health states.
    pub services: Vec<ServiceHealth>,
}

/// Health state of a single service.
#[derive(Serialize, ToSchema)]
pub struct ServiceHealth {
    /// Service name.
    pub name: String,
    /// Service base URL.
    pub url: String,
    /// Whether the service answered healthy.
    pub healthy: bool,
    /// Error detail when unhealthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
