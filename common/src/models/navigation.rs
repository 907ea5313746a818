//! Navigation tree models.
//!
//! Request/response shapes for the navigation service plus the read-only
//! settings that select between the data-fetch strategies.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::AppConfig;
use crate::models::server::ServerConfig;

/// Read-only settings controlling how database listings are fetched and
/// displayed. Assembled per request from the process configuration, the
/// target server's entry, and the probed server capabilities; never owned
/// by any tree node.
#[derive(Debug, Clone)]
pub struct NavigationConfig {
    /// Whether the information-schema catalog view is usable.
    pub has_information_schema: bool,
    /// Whether names are folded into groups by separator.
    pub grouping: bool,
    /// Group separator.
    pub separator: String,
    /// Page size for all tree levels.
    pub page_size: u32,
    /// Regex for databases hidden from navigation.
    pub hide_db: Option<String>,
    /// Explicit database pattern allow-list.
    pub only_db: Vec<String>,
}

impl NavigationConfig {
    /// Assembles the settings for one server.
    ///
    /// `catalog_usable` is the probed capability; the server entry may still
    /// veto it with `disable_information_schema`.
    pub fn assemble(app: &AppConfig, server: &ServerConfig, catalog_usable: bool) -> Self {
        Self {
            has_information_schema: catalog_usable && !server.disable_information_schema,
            grouping: app.nav_grouping && !app.nav_separator.is_empty(),
            separator: app.nav_separator.clone(),
            page_size: app.nav_page_size.max(1),
            hide_db: server.hide_db.clone(),
            only_db: server.only_db.clone(),
        }
    }
}

/// One entry in a database listing page.
///
/// Either a concrete database or a distinct group prefix folding several
/// databases of the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DatabaseEntry {
    /// Database name, or the group prefix for a group entry.
    pub name: String,
    /// Whether this entry folds several names sharing a prefix.
    pub is_group: bool,
    /// Number of names folded into the group (1 for plain entries).
    pub count: u32,
}

impl DatabaseEntry {
    /// A plain, ungrouped database entry.
    pub fn database(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_group: false,
            count: 1,
        }
    }

    /// A group entry folding `count` names under a shared prefix.
    pub fn group(prefix: impl Into<String>, count: u32) -> Self {
        Self {
            name: prefix.into(),
            is_group: true,
            count,
        }
    }
}

/// The container levels under a database node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    Tables,
    Views,
    Procedures,
    Functions,
    Events,
}

impl ContainerKind {
    /// Display label used for the container node.
    pub fn label(&self) -> &'static str {
        match self {
            ContainerKind::Tables => "Tables",
            ContainerKind::Views => "Views",
            ContainerKind::Procedures => "Procedures",
            ContainerKind::Functions => "Functions",
            ContainerKind::Events => "Events",
        }
    }

    /// All container levels, in display order.
    pub fn all() -> [ContainerKind; 5] {
        [
            ContainerKind::Tables,
            ContainerKind::Views,
            ContainerKind::Procedures,
            ContainerKind::Functions,
            ContainerKind::Events,
        ]
    }
}

impl std::str::FromStr for ContainerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tables" => Ok(ContainerKind::Tables),
            "views" => Ok(ContainerKind::Views),
            "procedures" => Ok(ContainerKind::Procedures),
            "functions" => Ok(ContainerKind::Functions),
            "events" => Ok(ContainerKind::Events),
            other => Err(format!("unknown container: {}", other)),
        }
    }
}

/// Query parameters for paged listings.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ListParams {
    /// Search substring applied to names.
    #[serde(default)]
    pub search: Option<String>,
    /// Offset of the first item to return.
    #[serde(default)]
    pub pos: u32,
}

/// One table addressed by database and name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct TableRef {
    pub db: String,
    pub table: String,
}

/// Request body for building the navigation tree.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TreeRequest {
    /// Search substring applied at the database level.
    #[serde(default)]
    pub search: Option<String>,
    /// Offset into the database level.
    #[serde(default)]
    pub pos: u32,
    /// Databases whose containers should be expanded.
    #[serde(default)]
    pub expanded: Vec<String>,
    /// Offset into each expanded container's children (second level).
    #[serde(default)]
    pub pos2: u32,
    /// Tables whose column/index containers should be expanded.
    #[serde(default)]
    pub expanded_tables: Vec<TableRef>,
    /// Offset into the third level (columns/indexes).
    #[serde(default)]
    pub pos3: u32,
}

/// One rendered node of the navigation tree.
#[derive(Debug, Serialize, ToSchema)]
pub struct TreeItem {
    /// Display name (group remainder for grouped databases).
    pub name: String,
    /// Real, unescaped object name (containers carry their label here).
    pub real_name: String,
    /// "container" or "object".
    pub kind: String,
    /// Whether this is a separator-folded group node.
    pub is_group: bool,
    /// Icon hint for the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Route the client opens for this node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Dot-joined base64 path over real names.
    pub apath: String,
    /// Dot-joined base64 path over display names, groups folded out.
    pub vpath: String,
    /// Child nodes.
    #[schema(no_recursion)]
    pub children: Vec<TreeItem>,
}
