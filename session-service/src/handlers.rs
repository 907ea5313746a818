//! Handler module.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::service::SessionService;
use crate::state::AppState;
use common::errors::AppError;
use common::models::session::{Identity, LoginRequest, SessionCheck};
use common::response::ApiResponse;

/// Query parameter selecting the target server.
#[derive(Debug, Deserialize)]
pub struct ServerParam {
    #[serde(default = "default_server")]
    pub server: u32,
}

fn default_server() -> u32 {
    1
}

/// Logs in to a configured server and sets the encrypted cookie pair.
#[utoipa::path(
    post,
    path = "/api/session/login",
    tag = "session",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login accepted, cookies set", body = ApiResponse<Identity>),
        (status = 401, description = "Credentials incomplete or rejected"),
        (status = 404, description = "Unknown server id")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<ApiResponse<Identity>>), AppError> {
    let service = SessionService::new(state.config.clone(), state.registry.clone(), state.auth.clone());
    let (identity, cookies) = service.login(request).await?;

    let mut headers = HeaderMap::new();
    for cookie in cookies {
        headers.append("set-cookie", cookie);
    }
    Ok((
        headers,
        Json(ApiResponse::ok_with_service(identity, "session-service")),
    ))
}

/// Expires the cookie pair for a server.
#[utoipa::path(
    post,
    path = "/api/session/logout",
    tag = "session",
    params(
        ("server" = Option<u32>, Query, description = "Target server id (default 1)")
    ),
    responses(
        (status = 200, description = "Cookies expired")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Query(params): Query<ServerParam>,
) -> (HeaderMap, Json<ApiResponse<()>>) {
    let service = SessionService::new(state.config.clone(), state.registry.clone(), state.auth.clone());

    let mut headers = HeaderMap::new();
    for cookie in service.logout(params.server) {
        headers.append("set-cookie", cookie);
    }
    (headers, Json(ApiResponse::success()))
}

/// Reports whether the request carries a valid cookie pair.
#[utoipa::path(
    get,
    path = "/api/session/check",
    tag = "session",
    params(
        ("server" = Option<u32>, Query, description = "Target server id (default 1)")
    ),
    responses(
        (status = 200, description = "Session state", body = ApiResponse<SessionCheck>)
    )
)]
pub async fn check(
    State(state): State<AppState>,
    Query(params): Query<ServerParam>,
    headers: HeaderMap,
) -> Json<ApiResponse<SessionCheck>> {
    let service = SessionService::new(state.config.clone(), state.registry.clone(), state.auth.clone());
    let result = service.check(&headers, params.server);
    Json(ApiResponse::ok_with_service(result, "session-service"))
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "session-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        servers: state.registry.len(),
    })
}

/// Health check response.
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    /// Number of configured servers.
    pub servers: usize,
}
