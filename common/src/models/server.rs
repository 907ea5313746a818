//! Target server configuration models.
//!
//! Every MySQL/MariaDB server administrators may log in to is declared up
//! front; requests address servers by their numeric id.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One administrable MySQL/MariaDB server.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServerConfig {
    /// Numeric server id (also the cookie name suffix).
    pub id: u32,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Server host.
    pub host: String,
    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Explicit allow-list of database name patterns (LIKE syntax). When
    /// non-empty and the catalog view is unusable, databases are enumerated
    /// one SHOW command per pattern.
    #[serde(default)]
    pub only_db: Vec<String>,
    /// Regular expression for databases hidden from navigation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_db: Option<String>,
    /// Force the SHOW-based strategies even when the server has a usable
    /// information-schema catalog.
    #[serde(default)]
    pub disable_information_schema: bool,
}

fn default_port() -> u16 {
    3306
}

impl ServerConfig {
    /// Display name, falling back to host:port.
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("{}:{}", self.host, self.port)
        } else {
            self.name.clone()
        }
    }
}

/// The set of configured servers.
#[derive(Debug, Clone)]
pub struct ServerRegistry {
    servers: Vec<ServerConfig>,
}

impl ServerRegistry {
    /// Loads the registry from the `SERVERS_JSON` environment variable
    /// (a JSON array of server objects). Falls back to a single local
    /// server with id 1 when unset or unparsable.
    pub fn load() -> Self {
        let servers = std::env::var("SERVERS_JSON")
            .ok()
            .and_then(|raw| match serde_json::from_str::<Vec<ServerConfig>>(&raw) {
                Ok(list) if !list.is_empty() => Some(list),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "SERVERS_JSON is not valid, using default server");
                    None
                }
            })
            .unwrap_or_else(|| vec![Self::default_server()]);
        Self { servers }
    }

    /// Builds a registry from an explicit list (used by tests).
    pub fn from_servers(servers: Vec<ServerConfig>) -> Self {
        Self { servers }
    }

    fn default_server() -> ServerConfig {
        ServerConfig {
            id: 1,
            name: String::new(),
            host: "127.0.0.1".to_string(),
            port: 3306,
            only_db: Vec::new(),
            hide_db: None,
            disable_information_schema: false,
        }
    }

    /// Looks up a server by id.
    pub fn get(&self, id: u32) -> Option<&ServerConfig> {
        self.servers.iter().find(|s| s.id == id)
    }

    /// All configured servers.
    pub fn all(&self) -> &[ServerConfig] {
        &self.servers
    }

    /// Number of configured servers.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Whether no servers are configured.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let registry = ServerRegistry::from_servers(vec![
            ServerConfig {
                id: 1,
                name: "primary".into(),
                host: "db1".into(),
                port: 3306,
                only_db: vec![],
                hide_db: None,
                disable_information_schema: false,
            },
            ServerConfig {
                id: 2,
                name: String::new(),
                host: "db2".into(),
                port: 3307,
                only_db: vec!["app\\_%".into()],
                hide_db: Some("^secret".into()),
                disable_information_schema: true,
            },
        ]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(1).unwrap().label(), "primary");
        assert_eq!(registry.get(2).unwrap().label(), "db2:3307");
        assert!(registry.get(3).is_none());
    }

    #[test]
    fn test_server_json_defaults() {
        let cfg: ServerConfig =
            serde_json::from_str(r#"{"id": 1, "host": "localhost"}"#).unwrap();
        assert_eq!(cfg.port, 3306);
        assert!(cfg.only_db.is_empty());
        assert!(cfg.hide_db.is_none());
        assert!(!cfg.disable_information_schema);
    }
}
