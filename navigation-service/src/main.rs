//! Navigation service
//!
//! Serves the navigation tree of the administered MySQL/MariaDB servers:
//! - paged database listings with three capability-driven fetch strategies
//! - per-database container listings (tables, views, routines, events)
//! - full tree builds with real/virtual path encodings per node

mod handlers;
mod lister;
mod node;
mod routes;
mod server_pool;
mod service;
mod state;

use axum::{middleware, routing::get, Json, Router};
use common::config::AppConfig;
use common::middleware::auth::cookie_auth_middleware;
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "navigation-service";
const DEFAULT_PORT: u16 = 8081;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Navigation service API",
        version = "0.1.0",
        description = "Navigation tree backend for the web MySQL administration system"
    ),
    paths(
        handlers::list_databases,
        handlers::list_children,
        handlers::build_tree,
        handlers::capabilities,
        handlers::health_check,
    ),
    components(schemas(
        common::models::DatabaseEntry,
        common::models::ContainerKind,
        common::models::TreeItem,
        common::models::TreeRequest,
        common::models::TableRef,
        server_pool::ServerCapabilities,
        handlers::HealthResponse,
    )),
    tags(
        (name = "navigation", description = "Navigation tree endpoints"),
        (name = "internal", description = "Service-to-service endpoints"),
        (name = "health", description = "Health check endpoints")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Load .env file (if present) before anything else
    load_dotenv();

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

    // Create application state (server registry + lazy pools)
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

    // Everything except health requires the cookie pair
    let protected = routes::protected_router().layer(middleware::from_fn_with_state(
        state.auth.clone(),
        cookie_auth_middleware,
    ));

    Router::new()
        .merge(protected)
        .merge(routes::public_router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Load .env file from the working directory (best-effort, no error if missing).
fn load_dotenv() {
    let env_path = std::path::Path::new(".env");
    if env_path.exists() {
        if let Ok(content) = std::fs::read_to_string(env_path) {
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim();
                    // Only set if not already set by the environment
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
        }
    }
}
