//! Handler module.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::server_pool::ServerCapabilities;
use crate::service::{NavigationService, NavigationServiceTrait};
use crate::state::AppState;
use common::errors::AppError;
use common::models::navigation::{DatabaseEntry, ListParams, TreeItem, TreeRequest};
use common::models::session::Credentials;
use common::response::{ApiResponse, PagedData};

/// One page of the database level, grouped when configured.
#[utoipa::path(
    get,
    path = "/api/navigation/databases",
    tag = "navigation",
    params(
        ("server" = Option<u32>, Query, description = "Target server id (default 1)"),
        ("search" = Option<String>, Query, description = "Substring filter on names"),
        ("pos" = Option<u32>, Query, description = "Offset of the first item")
    ),
    responses(
        (status = 200, description = "One page of databases", body = ApiResponse<PagedData<DatabaseEntry>>),
        (status = 401, description = "Missing or invalid session cookies")
    )
)]
pub async fn list_databases(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<PagedData<DatabaseEntry>>>, AppError> {
    let service = NavigationService::new(state.pools.clone());
    let data = service
        .databases(&credentials, params.search.as_deref(), params.pos)
        .await?;
    Ok(Json(ApiResponse::ok_with_service(data, "navigation-service")))
}

/// One page of a container level (tables, views, ...) under a database.
#[utoipa::path(
    get,
    path = "/api/navigation/databases/{db}/{container}",
    tag = "navigation",
    params(
        ("db" = String, Path, description = "Database name"),
        ("container" = String, Path, description = "tables | views | procedures | functions | events"),
        ("server" = Option<u32>, Query, description = "Target server id (default 1)"),
        ("search" = Option<String>, Query, description = "Substring filter on names"),
        ("pos" = Option<u32>, Query, description = "Offset of the first item")
    ),
    responses(
        (status = 200, description = "One page of object names", body = ApiResponse<PagedData<String>>),
        (status = 400, description = "Unknown container kind"),
        (status = 401, description = "Missing or invalid session cookies")
    )
)]
pub async fn list_children(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Path((db, container)): Path<(String, String)>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<PagedData<String>>>, AppError> {
    let kind = container.parse().map_err(AppError::Validation)?;
    let service = NavigationService::new(state.pools.clone());
    let data = service
        .children(&credentials, &db, kind, params.search.as_deref(), params.pos)
        .await?;
    Ok(Json(ApiResponse::ok_with_service(data, "navigation-service")))
}

/// Builds the navigation tree for a page of databases plus the requested
/// expansions, with both path encodings on every node.
#[utoipa::path(
    post,
    path = "/api/navigation/tree",
    tag = "navigation",
    request_body = TreeRequest,
    params(
        ("server" = Option<u32>, Query, description = "Target server id (default 1)")
    ),
    responses(
        (status = 200, description = "The rendered tree, rooted at 'root'", body = ApiResponse<TreeItem>),
        (status = 401, description = "Missing or invalid session cookies")
    )
)]
pub async fn build_tree(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
    Json(request): Json<TreeRequest>,
) -> Result<Json<ApiResponse<TreeItem>>, AppError> {
    let service = NavigationService::new(state.pools.clone());
    let data = service.tree(&credentials, request).await?;
    Ok(Json(ApiResponse::ok_with_service(data, "navigation-service")))
}

/// Internal endpoint exposing the probed server capabilities.
#[utoipa::path(
    get,
    path = "/internal/capabilities",
    tag = "internal",
    params(
        ("server" = Option<u32>, Query, description = "Target server id (default 1)")
    ),
    responses(
        (status = 200, description = "Probed capabilities", body = ApiResponse<ServerCapabilities>),
        (status = 401, description = "Missing or invalid session cookies")
    )
)]
pub async fn capabilities(
    State(state): State<AppState>,
    Extension(credentials): Extension<Credentials>,
) -> Result<Json<ApiResponse<ServerCapabilities>>, AppError> {
    let service = NavigationService::new(state.pools.clone());
    let data = service.capabilities(&credentials).await?;
    Ok(Json(ApiResponse::ok(data)))
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
        service: "navigation-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        servers: state.pools.server_count(),
        pools: state.pools.pool_count().await,
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
    /// Number of live connection pools.
    pub pools: usize,
}
