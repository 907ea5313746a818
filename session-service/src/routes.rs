//! Route module.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/session/login", post(handlers::login))
        .route("/api/session/logout", post(handlers::logout))
        .route("/api/session/check", get(handlers::check))
        .route("/api/health", get(handlers::health_check))
}
