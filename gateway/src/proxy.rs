//! Reverse proxy to the backend services.
//!
//! Session routes pass through untouched (the client has no cookies yet
//! when it calls login). Navigation routes are gated on a valid cookie
//! pair, and their `eq` query parameter is opened here so the backend
//! services only ever see plaintext query strings.

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;

use common::errors::AppError;
use common::middleware::auth::server_from_query;

use crate::state::AppState;

/// Request bodies past this size are rejected before forwarding.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Response headers worth mirroring back to the client.
const MIRRORED_HEADERS: [&str; 3] = ["content-type", "set-cookie", "x-request-id"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/session/{*path}", any(proxy_session))
        .route("/api/navigation/{*path}", any(proxy_navigation))
}

async fn proxy_session(
    State(state): State<AppState>,
    req: Request<Body>,
) -> Result<Response, AppError> {
    let base = state.service_urls.session_service.clone();
    forward(&state, &base, req, None).await
}

async fn proxy_navigation(
    State(state): State<AppState>,
    req: Request<Body>,
) -> Result<Response, AppError> {
    // Open encrypted URL parameters first so the auth check can read `server`
    let query = req.uri().query().unwrap_or("");
    let query = state
        .url_cipher
        .decrypt_query_string(query)
        .ok_or_else(|| AppError::LoginRequired("undecryptable eq parameter".into()))?;

    let server = server_from_query(Some(query.as_str()));
    if state.auth.verify(req.headers(), server).is_none() {
        return Err(AppError::LoginRequired(
            "missing or invalid session cookies".into(),
        ));
    }

    let base = state.service_urls.navigation_service.clone();
    forward(&state, &base, req, Some(query)).await
}

/// Forwards one request to a backend service and mirrors the response.
async fn forward(
    state: &AppState,
    base: &str,
    req: Request<Body>,
    override_query: Option<String>,
) -> Result<Response, AppError> {
    let (parts, body) = req.into_parts();
    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::Validation(format!("unreadable request body: {}", e)))?;

    let query = match override_query {
        Some(q) => {
            if q.is_empty() {
                None
            } else {
                Some(q)
            }
        }
        None => parts.uri.query().map(String::from),
    };
    let mut url = format!("{}{}", base, parts.uri.path());
    if let Some(query) = query {
        url.push('?');
        url.push_str(&query);
    }

    let method = reqwest::Method::from_bytes(parts.method.as_str().as_bytes())
        .map_err(|_| AppError::Validation("unsupported method".into()))?;

    let mut builder = state.http_client.request(method, &url);
    for name in ["cookie", "content-type", "accept", "x-request-id"] {
        if let Some(value) = parts.headers.get(name) {
            if let Ok(value) = value.to_str() {
                builder = builder.header(name, value);
            }
        }
    }

    let upstream = builder
        .body(body.to_vec())
        .send()
        .await
        .map_err(|e| AppError::ExternalService(format!("upstream request failed: {}", e)))?;

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut headers = HeaderMap::new();
    for (name, value) in upstream.headers() {
        if !MIRRORED_HEADERS.contains(&name.as_str()) {
            continue;
        }
        let name = HeaderName::try_from(name.as_str());
        let value = HeaderValue::from_bytes(value.as_bytes());
        if let (Ok(name), Ok(value)) = (name, value) {
            headers.append(name, value);
        }
    }

    let bytes = upstream
        .bytes()
        .await
        .map_err(|e| AppError::ExternalService(format!("unreadable upstream body: {}", e)))?;

    Ok((status, headers, bytes.to_vec()).into_response())
}
