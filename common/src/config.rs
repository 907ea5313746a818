//! Application configuration.
//!
//! All settings are environment-driven with sensible defaults, so the
//! services run out of the box and deployments override what they need.

/// Process-wide configuration shared by all services.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name of the service this process runs as.
    pub service: String,
    /// Bind host for the HTTP listener.
    pub host: String,
    /// Bind port for the HTTP listener (service mains override this).
    pub port: u16,
    /// Timeout for acquiring a MySQL connection, in seconds.
    pub connect_timeout_secs: u64,
    /// Maximum connections per MySQL pool.
    pub max_connections: u32,
    /// Base64-encoded 32-byte cookie encryption key. When unset, each
    /// process generates its own key at startup (cookies then survive only
    /// as long as the process, and all services must share one process or
    /// one key).
    pub cookie_secret: Option<String>,
    /// Whether sensitive URL query parameters are transported encrypted.
    pub url_encryption: bool,
    /// Whether the navigation tree folds databases into groups.
    pub nav_grouping: bool,
    /// Separator character used for database grouping.
    pub nav_separator: String,
    /// Page size for navigation listings.
    pub nav_page_size: u32,
}

impl AppConfig {
    /// Loads the configuration from the environment for a named service.
    pub fn load_with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
            host: env_or("SERVER_HOST", "0.0.0.0"),
            port: 0,
            connect_timeout_secs: env_parse("DB_CONNECT_TIMEOUT_SECS", 10),
            max_connections: env_parse("DB_MAX_CONNECTIONS", 5),
            cookie_secret: std::env::var("COOKIE_SECRET").ok(),
            url_encryption: env_bool("URL_ENCRYPTION", false),
            nav_grouping: env_bool("NAV_GROUP_DBS", true),
            nav_separator: env_or("NAV_DB_SEPARATOR", "_"),
            nav_page_size: env_parse("NAV_PAGE_SIZE", 50),
        }
    }
}

/// Base URLs of the backend services, used by the gateway.
#[derive(Debug, Clone)]
pub struct ServiceUrls {
    /// Session service base URL.
    pub session_service: String,
    /// Navigation service base URL.
    pub navigation_service: String,
}

impl ServiceUrls {
    /// Loads service URLs from the environment.
    pub fn load() -> Self {
        Self {
            session_service: env_or("SESSION_SERVICE_URL", "http://127.0.0.1:8082"),
            navigation_service: env_or("NAVIGATION_SERVICE_URL", "http://127.0.0.1:8081"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => parse_bool(&v, default),
        Err(_) => default,
    }
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_variants() {
        assert!(parse_bool("1", false));
        assert!(parse_bool("TRUE", false));
        assert!(parse_bool("on", false));
        assert!(!parse_bool("0", true));
        assert!(!parse_bool("off", true));
        // Unrecognized values keep the default
        assert!(parse_bool("maybe", true));
        assert!(!parse_bool("maybe", false));
    }
}
