//! Session service
//!
//! Owns the cookie-based login handshake:
//! - credential validation against the target MySQL server
//! - minting and expiring the encrypted per-server cookie pair
//! - session checks for clients that lost track of their state

mod handlers;
mod routes;
mod service;
mod state;

use axum::{middleware, routing::get, Json, Router};
use common::config::AppConfig;
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "session-service";
const DEFAULT_PORT: u16 = 8082;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Session service API",
        version = "0.1.0",
        description = "Cookie session backend for the web MySQL administration system"
    ),
    paths(
        handlers::login,
        handlers::logout,
        handlers::check,
        handlers::health_check,
    ),
    components(schemas(
        common::models::LoginRequest,
        common::models::Identity,
        common::models::session::SessionCheck,
        handlers::HealthResponse,
    )),
    tags(
        (name = "session", description = "Login/logout endpoints"),
        (name = "health", description = "Health check endpoints")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize logging and tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Load configuration
    let mut config = AppConfig::load_with_service(SERVICE_NAME);
    config.port = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    // Create application state
    let state = AppState::new(config.clone());

    // Create router
    let app = create_router(state);

    // Start the service
    let addr = format!("{}:{}", config.host, config.port);
    info!(service = SERVICE_NAME, address = %addr, "starting service");

    let listener = TcpListener::bind(&addr).await.expect("failed to bind address");
    axum::serve(listener, app).await.expect("server error");
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
