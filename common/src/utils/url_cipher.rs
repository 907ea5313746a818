//! Symmetric encryption of sensitive URL query parameters.
//!
//! When enabled, a fixed allow-list of parameter names (database and table
//! names, SQL text, privilege-check targets) never travels in clear text:
//! the matching entries are packed as a JSON object, sealed with the secret
//! box, and carried in a single `eq` parameter. Everything else passes
//! through untouched.

use std::collections::BTreeMap;

use crate::utils::secret_box::SecretBox;

/// Parameter names that are encrypted in transit.
pub const SENSITIVE_PARAMS: [&str; 8] = [
    "db",
    "table",
    "sql_query",
    "where_clause",
    "username",
    "hostname",
    "checkprivsdb",
    "checkprivstable",
];

/// Name of the parameter carrying the sealed bundle.
pub const ENCRYPTED_PARAM: &str = "eq";

/// Encrypts/decrypts the sensitive subset of a query-parameter map.
#[derive(Clone)]
pub struct UrlCipher {
    secret: SecretBox,
    enabled: bool,
}

impl UrlCipher {
    pub fn new(secret: SecretBox, enabled: bool) -> Self {
        Self { secret, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_sensitive(name: &str) -> bool {
        SENSITIVE_PARAMS.contains(&name)
    }

    /// Moves allow-listed entries into a sealed `eq` parameter.
    /// The identity when disabled or when no sensitive entry is present.
    pub fn encrypt_params(&self, params: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        if !self.enabled {
            return params.clone();
        }

        let mut sensitive = BTreeMap::new();
        let mut rest = BTreeMap::new();
        for (key, value) in params {
            if Self::is_sensitive(key) {
                sensitive.insert(key.clone(), value.clone());
            } else {
                rest.insert(key.clone(), value.clone());
            }
        }
        if sensitive.is_empty() {
            return rest;
        }

        // BTreeMap keys serialize in a stable order
        let packed = serde_json::to_string(&sensitive).expect("param map serializes");
        rest.insert(ENCRYPTED_PARAM.to_string(), self.secret.seal(packed.as_bytes()));
        rest
    }

    /// Opens the `eq` parameter and merges the recovered entries back.
    /// Plaintext entries win on collision. Returns `None` when an `eq`
    /// parameter is present but cannot be opened or parsed.
    pub fn decrypt_params(
        &self,
        params: &BTreeMap<String, String>,
    ) -> Option<BTreeMap<String, String>> {
        let Some(sealed) = params.get(ENCRYPTED_PARAM) else {
            return Some(params.clone());
        };

        let packed = self.secret.open_str(sealed)?;
        let recovered: BTreeMap<String, String> = serde_json::from_str(&packed).ok()?;

        let mut merged = recovered;
        for (key, value) in params {
            if key != ENCRYPTED_PARAM {
                merged.insert(key.clone(), value.clone());
            }
        }
        Some(merged)
    }

    /// `encrypt_params` over a raw query string.
    pub fn encrypt_query_string(&self, query: &str) -> String {
        build_query(&self.encrypt_params(&parse_query(query)))
    }

    /// `decrypt_params` over a raw query string.
    pub fn decrypt_query_string(&self, query: &str) -> Option<String> {
        self.decrypt_params(&parse_query(query)).map(|m| build_query(&m))
    }
}

/// Parses an urlencoded query string. Later duplicates win.
pub fn parse_query(query: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = match pair.split_once('=') {
            Some((k, v)) => (k, v),
            None => (pair, ""),
        };
        let key = urlencoding::decode(key).map(|c| c.into_owned());
        let value = urlencoding::decode(value).map(|c| c.into_owned());
        if let (Ok(key), Ok(value)) = (key, value) {
            map.insert(key, value);
        }
    }
    map
}

/// Builds an urlencoded query string in key order.
pub fn build_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::secret_box::KEY_SIZE;

    fn cipher(enabled: bool) -> UrlCipher {
        UrlCipher::new(SecretBox::new(&[3u8; KEY_SIZE]), enabled)
    }

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_round_trip() {
        let cipher = cipher(true);
        let original = params(&[
            ("db", "sakila"),
            ("table", "film"),
            ("pos", "50"),
            ("sql_query", "SELECT 1"),
        ]);

        let encrypted = cipher.encrypt_params(&original);
        assert!(encrypted.contains_key(ENCRYPTED_PARAM));
        assert!(!encrypted.contains_key("db"));
        assert!(!encrypted.contains_key("table"));
        assert!(!encrypted.contains_key("sql_query"));
        assert_eq!(encrypted.get("pos").map(String::as_str), Some("50"));

        let decrypted = cipher.decrypt_params(&encrypted).unwrap();
        assert_eq!(decrypted, original);
    }

    #[test]
    fn test_disabled_is_identity() {
        let cipher = cipher(false);
        let original = params(&[("db", "sakila"), ("pos", "0")]);
        assert_eq!(cipher.encrypt_params(&original), original);
        assert_eq!(cipher.decrypt_params(&original).unwrap(), original);
    }

    #[test]
    fn test_no_sensitive_params_no_eq() {
        let cipher = cipher(true);
        let original = params(&[("pos", "25"), ("search", "inv")]);
        let encrypted = cipher.encrypt_params(&original);
        assert!(!encrypted.contains_key(ENCRYPTED_PARAM));
        assert_eq!(encrypted, original);
    }

    #[test]
    fn test_bad_eq_is_none() {
        let cipher = cipher(true);
        let bad = params(&[(ENCRYPTED_PARAM, "garbage")]);
        assert!(cipher.decrypt_params(&bad).is_none());

        // Sealed under a different key
        let other = UrlCipher::new(SecretBox::new(&[9u8; KEY_SIZE]), true);
        let foreign = other.encrypt_params(&params(&[("db", "x")]));
        assert!(cipher.decrypt_params(&foreign).is_none());
    }

    #[test]
    fn test_plaintext_wins_on_collision() {
        let cipher = cipher(true);
        let mut encrypted = cipher.encrypt_params(&params(&[("db", "sealed")]));
        encrypted.insert("db".to_string(), "plain".to_string());
        let merged = cipher.decrypt_params(&encrypted).unwrap();
        assert_eq!(merged.get("db").map(String::as_str), Some("plain"));
    }

    #[test]
    fn test_query_string_round_trip() {
        let cipher = cipher(true);
        let qs = "db=world%20x&pos=10&search=co";
        let enc = cipher.encrypt_query_string(qs);
        assert!(enc.contains("eq="));
        assert!(!enc.contains("db="));
        let dec = cipher.decrypt_query_string(&enc).unwrap();
        assert_eq!(parse_query(&dec), parse_query(qs));
    }

    #[test]
    fn test_parse_query_shapes() {
        let map = parse_query("a=1&b&c=x%2Fy&&a=2");
        assert_eq!(map.get("a").map(String::as_str), Some("2"));
        assert_eq!(map.get("b").map(String::as_str), Some(""));
        assert_eq!(map.get("c").map(String::as_str), Some("x/y"));
    }
}
