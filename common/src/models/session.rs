//! Session and authentication models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for logging in to a configured server.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Id of the server to log in to.
    #[serde(default = "default_server")]
    pub server: u32,

    /// MySQL account name.
    #[validate(length(min = 1, max = 128, message = "Username is required"))]
    pub username: String,

    /// MySQL account password (may legitimately be empty).
    #[serde(default)]
    pub password: String,
}

fn default_server() -> u32 {
    1
}

/// Authenticated identity, as exposed to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    /// Server the session is bound to.
    pub server: u32,
    /// Account name recovered from the user cookie.
    pub username: String,
}

/// Full credentials recovered from the cookie pair.
///
/// Never serialized into responses; carried through request extensions so
/// handlers can open connections on the administrator's behalf.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub server: u32,
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// The client-visible part of the credentials.
    pub fn identity(&self) -> Identity {
        Identity {
            server: self.server,
            username: self.username.clone(),
        }
    }
}

/// Payload sealed into the auth cookie.
///
/// JSON-packed before encryption so the format can grow fields without
/// breaking existing cookies.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthCookiePayload {
    pub password: String,
}

/// Result of a session check.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionCheck {
    /// Whether a valid cookie pair was presented.
    pub authenticated: bool,
    /// The recovered identity, when authenticated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_login_request_requires_username() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"username": "", "password": "x"}"#).unwrap();
        assert!(req.validate().is_err());

        let req: LoginRequest = serde_json::from_str(r#"{"username": "root"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.server, 1);
        assert_eq!(req.password, "");
    }
}
