//! Route module.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Routes that require a valid cookie pair.
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/api/navigation/databases", get(handlers::list_databases))
        .route(
            "/api/navigation/databases/{db}/{container}",
            get(handlers::list_children),
        )
        .route("/api/navigation/tree", post(handlers::build_tree))
        .route("/internal/capabilities", get(handlers::capabilities))
}

/// Routes that answer without authentication.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/api/health", get(handlers::health_check))
}
