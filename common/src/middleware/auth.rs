//! Cookie authentication.
//!
//! Credentials live in two encrypted cookies per server: `pmaUser-<server>`
//! carries the account name, `pmaAuth-<server>` carries a JSON payload with
//! the password. Both are sealed with the shared secret box; a missing or
//! unopenable cookie means "re-authenticate", so verification returns
//! `Option` and the middleware maps `None` to the login-required error.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::session::{AuthCookiePayload, Credentials};
use crate::utils::secret_box::SecretBox;

/// Seals and opens the per-server credential cookie pair.
#[derive(Clone)]
pub struct CookieAuth {
    secret: SecretBox,
}

impl CookieAuth {
    pub fn new(secret: SecretBox) -> Self {
        Self { secret }
    }

    /// Builds the auth layer from configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(secret_from_config(config))
    }

    /// Name of the username cookie for a server.
    pub fn user_cookie(server: u32) -> String {
        format!("pmaUser-{}", server)
    }

    /// Name of the password cookie for a server.
    pub fn auth_cookie(server: u32) -> String {
        format!("pmaAuth-{}", server)
    }

    /// Mints the Set-Cookie values for a successful login.
    pub fn issue(&self, credentials: &Credentials) -> Vec<HeaderValue> {
        let user = self.secret.seal(credentials.username.as_bytes());
        let payload = serde_json::to_string(&AuthCookiePayload {
            password: credentials.password.clone(),
        })
        .expect("auth payload serializes");
        let auth = self.secret.seal(payload.as_bytes());

        vec![
            set_cookie(&Self::user_cookie(credentials.server), &user),
            set_cookie(&Self::auth_cookie(credentials.server), &auth),
        ]
    }

    /// Set-Cookie values that expire the pair on logout.
    pub fn expire(server: u32) -> Vec<HeaderValue> {
        vec![
            clear_cookie(&Self::user_cookie(server)),
            clear_cookie(&Self::auth_cookie(server)),
        ]
    }

    /// Recovers the credentials for a server from the request cookies.
    /// Any missing or unopenable part yields `None`.
    pub fn verify(&self, headers: &HeaderMap, server: u32) -> Option<Credentials> {
        let username = self
            .secret
            .open_str(&parse_cookie(headers, &Self::user_cookie(server))?)?;
        let packed = self
            .secret
            .open_str(&parse_cookie(headers, &Self::auth_cookie(server))?)?;
        let payload: AuthCookiePayload = serde_json::from_str(&packed).ok()?;

        Some(Credentials {
            server,
            username,
            password: payload.password,
        })
    }
}

/// The configured cookie key, or a process-local one. Without a configured
/// `COOKIE_SECRET`, cookies minted by one process are invisible to every
/// other one.
pub fn secret_from_config(config: &AppConfig) -> SecretBox {
    match config.cookie_secret.as_deref().and_then(SecretBox::from_base64) {
        Some(secret) => secret,
        None => {
            let (secret, _) = SecretBox::generate();
            tracing::warn!(
                "COOKIE_SECRET not set or invalid, generated a process-local cookie key"
            );
            secret
        }
    }
}

/// Extracts a named cookie from the Cookie header.
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("cookie").or_else(|| headers.get("Cookie"))?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some(eq) = p.find('=') {
            let (k, v) = p.split_at(eq);
            if k == name {
                return Some(v[1..].to_string());
            }
        }
    }
    None
}

/// Reads the `server` query parameter, defaulting to server 1.
pub fn server_from_query(query: Option<&str>) -> u32 {
    let Some(query) = query else { return 1 };
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix("server=") {
            if let Ok(id) = value.parse() {
                return id;
            }
        }
    }
    1
}

fn set_cookie(name: &str, value: &str) -> HeaderValue {
    // HttpOnly cookie scoped to path / with SameSite=Strict
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/",
        name, value
    ))
    .unwrap()
}

fn clear_cookie(name: &str) -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Strict; Path=/",
        name
    ))
    .unwrap()
}

/// Axum middleware enforcing a valid cookie pair.
///
/// On success the recovered [`Credentials`] are attached to the request
/// extensions for handlers to use.
pub async fn cookie_auth_middleware(
    State(auth): State<CookieAuth>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let server = server_from_query(req.uri().query());
    let credentials = auth
        .verify(req.headers(), server)
        .ok_or_else(|| AppError::LoginRequired("missing or invalid session cookies".into()))?;

    req.extensions_mut().insert(credentials);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::secret_box::KEY_SIZE;

    fn auth() -> CookieAuth {
        CookieAuth::new(SecretBox::new(&[5u8; KEY_SIZE]))
    }

    fn creds() -> Credentials {
        Credentials {
            server: 2,
            username: "root".into(),
            password: "s3cret".into(),
        }
    }

    /// Rebuilds the request Cookie header from issued Set-Cookie values.
    fn headers_from_issued(issued: &[HeaderValue]) -> HeaderMap {
        let cookie = issued
            .iter()
            .map(|v| {
                let s = v.to_str().unwrap();
                s.split(';').next().unwrap().to_string()
            })
            .collect::<Vec<_>>()
            .join("; ");
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_str(&cookie).unwrap());
        headers
    }

    #[test]
    fn test_cookie_names() {
        assert_eq!(CookieAuth::user_cookie(1), "pmaUser-1");
        assert_eq!(CookieAuth::auth_cookie(3), "pmaAuth-3");
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let auth = auth();
        let issued = auth.issue(&creds());
        assert_eq!(issued.len(), 2);

        let headers = headers_from_issued(&issued);
        let recovered = auth.verify(&headers, 2).unwrap();
        assert_eq!(recovered.username, "root");
        assert_eq!(recovered.password, "s3cret");
        assert_eq!(recovered.server, 2);

        // Wrong server id looks up different cookie names
        assert!(auth.verify(&headers, 1).is_none());
    }

    #[test]
    fn test_verify_wrong_key_is_none() {
        let issued = auth().issue(&creds());
        let headers = headers_from_issued(&issued);
        let other = CookieAuth::new(SecretBox::new(&[6u8; KEY_SIZE]));
        assert!(other.verify(&headers, 2).is_none());
    }

    #[test]
    fn test_verify_missing_cookie_is_none() {
        assert!(auth().verify(&HeaderMap::new(), 1).is_none());
    }

    #[test]
    fn test_server_from_query() {
        assert_eq!(server_from_query(None), 1);
        assert_eq!(server_from_query(Some("pos=5&server=3")), 3);
        assert_eq!(server_from_query(Some("server=bad")), 1);
    }

    #[test]
    fn test_parse_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("a=1; pmaUser-1=abc; b=2"),
        );
        assert_eq!(parse_cookie(&headers, "pmaUser-1").as_deref(), Some("abc"));
        assert_eq!(parse_cookie(&headers, "pmaUser-2"), None);
    }
}
