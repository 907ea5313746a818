//! Navigation service module.

use std::sync::Arc;

use async_trait::async_trait;

use common::errors::AppResult;
use common::models::navigation::{
    ContainerKind, DatabaseEntry, NavigationConfig, TreeItem, TreeRequest,
};
use common::models::session::Credentials;
use common::response::{PageInfo, PagedData};

use crate::lister::{
    apply_hidden_filter, catalog_databases_query, choose_strategy, columns_query, container_query,
    group_page, indexes_query, paginate, show_databases_like_queries, show_databases_query,
    FetchStrategy,
};
use crate::node::{Node, NodeId, NodeKind, NodeTree};
use crate::server_pool::{ServerCapabilities, ServerPool};

/// Navigation operations exposed over HTTP.
#[async_trait]
pub trait NavigationServiceTrait: Send + Sync {
    /// One page of the database level, grouped when configured.
    async fn databases(
        &self,
        credentials: &Credentials,
        search: Option<&str>,
        pos: u32,
    ) -> AppResult<PagedData<DatabaseEntry>>;

    /// One page of a container level under a database.
    async fn children(
        &self,
        credentials: &Credentials,
        db: &str,
        kind: ContainerKind,
        search: Option<&str>,
        pos: u32,
    ) -> AppResult<PagedData<String>>;

    /// Builds the tree for the requested page and expansions.
    async fn tree(&self, credentials: &Credentials, request: TreeRequest) -> AppResult<TreeItem>;

    /// Probed capabilities of the target server.
    async fn capabilities(&self, credentials: &Credentials) -> AppResult<ServerCapabilities>;
}

/// Navigation tree backend.
pub struct NavigationService {
    pools: Arc<ServerPool>,
}

impl NavigationService {
    pub fn new(pools: Arc<ServerPool>) -> Self {
        Self { pools }
    }

    /// Fetches one raw (ungrouped) page of database names.
    ///
    /// Returns the page plus the total count when the strategy had to
    /// enumerate everything anyway; the catalog strategy pages server-side
    /// and leaves the total unknown.
    async fn database_page(
        &self,
        credentials: &Credentials,
        cfg: &NavigationConfig,
        search: Option<&str>,
        pos: u32,
    ) -> AppResult<(Vec<String>, Option<u64>)> {
        let pool = self.pools.pool(credentials).await?;

        match choose_strategy(cfg) {
            FetchStrategy::Catalog => {
                let query = catalog_databases_query(cfg, search, pos);
                let names = self.pools.fetch_names(&pool, &query).await?;
                Ok((names, None))
            }
            FetchStrategy::ShowFiltered => {
                let query = show_databases_query(cfg, search);
                let all = self.pools.fetch_names(&pool, &query).await?;
                let (page, total) = paginate(&all, pos, cfg.page_size);
                Ok((page, Some(total)))
            }
            FetchStrategy::ShowPerPattern => {
                let mut all = Vec::new();
                for query in show_databases_like_queries(cfg) {
                    all.extend(self.pools.fetch_names(&pool, &query).await?);
                }
                all.sort();
                all.dedup();
                // Hidden databases are dropped after the fetch here; the
                // other strategies push the filter into the query
                let mut all = apply_hidden_filter(all, cfg.hide_db.as_deref());
                if let Some(s) = search.filter(|s| !s.is_empty()) {
                    all.retain(|name| name.contains(s));
                }
                let (page, total) = paginate(&all, pos, cfg.page_size);
                Ok((page, Some(total)))
            }
        }
    }

    /// Attaches the column and index containers under an expanded table.
    async fn attach_table_detail(
        &self,
        tree: &mut NodeTree,
        pool: &sqlx::MySqlPool,
        cfg: &NavigationConfig,
        db: &str,
        table: &str,
        table_id: NodeId,
        pos3: u32,
    ) -> AppResult<()> {
        tree.get_mut(table_id).pos3 = pos3;

        let columns_container = tree.add_child(table_id, Node::container("Columns"));
        let query = columns_query(cfg, db, table, pos3);
        let columns = if query.server_side_page {
            self.pools.fetch_names(pool, &query).await?
        } else {
            let all = self.pools.fetch_names(pool, &query).await?;
            paginate(&all, pos3, cfg.page_size).0
        };
        for column in columns {
            tree.add_child(columns_container, Node::object(column).with_icon("column"));
        }

        let indexes_container = tree.add_child(table_id, Node::container("Indexes"));
        let all_keys = self
            .pools
            .fetch_names(pool, &indexes_query(db, table))
            .await?;
        // SHOW INDEX repeats the key name per indexed column
        let mut keys: Vec<String> = Vec::new();
        for key in all_keys {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        let (page, _) = paginate(&keys, pos3, cfg.page_size);
        for key in page {
            tree.add_child(indexes_container, Node::object(key).with_icon("index"));
        }

        Ok(())
    }
}

#[async_trait]
impl NavigationServiceTrait for NavigationService {
    async fn databases(
        &self,
        credentials: &Credentials,
        search: Option<&str>,
        pos: u32,
    ) -> AppResult<PagedData<DatabaseEntry>> {
        let cfg = self.pools.navigation_config(credentials).await?;
        let (page_names, total) = self.database_page(credentials, &cfg, search, pos).await?;

        // has_more reflects the raw page, not the grouped entry count
        let has_more = match total {
            Some(total) => (pos as u64 + page_names.len() as u64) < total,
            None => page_names.len() as u32 == cfg.page_size,
        };

        let items = if cfg.grouping {
            group_page(&page_names, &cfg.separator)
        } else {
            page_names.into_iter().map(DatabaseEntry::database).collect()
        };

        Ok(PagedData {
            items,
            page: PageInfo {
                pos,
                page_size: cfg.page_size,
                total,
                has_more,
            },
        })
    }

    async fn children(
        &self,
        credentials: &Credentials,
        db: &str,
        kind: ContainerKind,
        search: Option<&str>,
        pos: u32,
    ) -> AppResult<PagedData<String>> {
        let cfg = self.pools.navigation_config(credentials).await?;
        let pool = self.pools.pool(credentials).await?;

        let query = container_query(&cfg, db, kind, search, pos);
        if query.server_side_page {
            let names = self.pools.fetch_names(&pool, &query).await?;
            let has_more = names.len() as u32 == cfg.page_size;
            Ok(PagedData::open_ended(names, pos, cfg.page_size, has_more))
        } else {
            let all = self.pools.fetch_names(&pool, &query).await?;
            let (page, total) = paginate(&all, pos, cfg.page_size);
            Ok(PagedData::with_total(page, pos, cfg.page_size, total))
        }
    }

    async fn tree(&self, credentials: &Credentials, request: TreeRequest) -> AppResult<TreeItem> {
        let cfg = self.pools.navigation_config(credentials).await?;
        let pool = self.pools.pool(credentials).await?;
        let (page_names, _) = self
            .database_page(credentials, &cfg, request.search.as_deref(), request.pos)
            .await?;

        let mut tree = NodeTree::new();
        for name in &page_names {
            let db_id = attach_database_node(&mut tree, &cfg, name);
            if !request.expanded.iter().any(|d| d == name) {
                continue;
            }

            tree.get_mut(db_id).pos2 = request.pos2;
            for kind in ContainerKind::all() {
                let container_id = tree.add_child(db_id, Node::container(kind.label()));
                let query = container_query(&cfg, name, kind, None, request.pos2);
                let objects = if query.server_side_page {
                    self.pools.fetch_names(&pool, &query).await?
                } else {
                    let all = self.pools.fetch_names(&pool, &query).await?;
                    paginate(&all, request.pos2, cfg.page_size).0
                };

                for object in objects {
                    let object_id = tree.add_child(
                        container_id,
                        Node::object(&object)
                            .with_icon(object_icon(kind))
                            .with_link(format!("/database/{}/{}/{}", name, kind.label(), object)),
                    );

                    let expand_table = kind == ContainerKind::Tables
                        && request
                            .expanded_tables
                            .iter()
                            .any(|t| &t.db == name && t.table == object);
                    if expand_table {
                        self.attach_table_detail(
                            &mut tree,
                            &pool,
                            &cfg,
                            name,
                            &object,
                            object_id,
                            request.pos3,
                        )
                        .await?;
                    }
                }
            }
        }

        Ok(render_item(&tree, tree.root()))
    }

    async fn capabilities(&self, credentials: &Credentials) -> AppResult<ServerCapabilities> {
        self.pools.capabilities(credentials).await
    }
}

/// Attaches one database under the root, folding it into a group node when
/// grouping is on and the name carries the separator past position zero.
/// Grouped databases display only the remainder; the real name stays whole.
fn attach_database_node(tree: &mut NodeTree, cfg: &NavigationConfig, name: &str) -> NodeId {
    let root = tree.root();
    if cfg.grouping {
        if let Some(idx) = name.find(&cfg.separator).filter(|&i| i > 0) {
            let prefix = &name[..idx];
            let existing = tree
                .get(root)
                .children()
                .iter()
                .copied()
                .find(|&c| tree.get(c).is_group && tree.get(c).name == prefix);
            let group_id = match existing {
                Some(id) => id,
                None => tree.add_child(root, Node::group(prefix)),
            };
            let display = name[idx + cfg.separator.len()..].to_string();
            return tree.add_child(
                group_id,
                Node::object_with_real(display, name)
                    .with_icon("database")
                    .with_link(format!("/database/{}", name)),
            );
        }
    }
    tree.add_child(
        root,
        Node::object(name)
            .with_icon("database")
            .with_link(format!("/database/{}", name)),
    )
}

fn object_icon(kind: ContainerKind) -> &'static str {
    match kind {
        ContainerKind::Tables => "table",
        ContainerKind::Views => "view",
        ContainerKind::Procedures => "procedure",
        ContainerKind::Functions => "function",
        ContainerKind::Events => "event",
    }
}

/// Renders the arena into the serializable response shape, computing both
/// path encodings per node.
fn render_item(tree: &NodeTree, id: NodeId) -> TreeItem {
    let node = tree.get(id);
    let paths = tree.paths(id);
    TreeItem {
        name: node.name.clone(),
        real_name: node.real_name.clone(),
        kind: match node.kind {
            NodeKind::Container => "container",
            NodeKind::Object => "object",
        }
        .to_string(),
        is_group: node.is_group,
        icon: node.icon.clone(),
        link: node.link.clone(),
        apath: paths.apath,
        vpath: paths.vpath,
        children: node
            .children()
            .iter()
            .map(|&child| render_item(tree, child))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(grouping: bool) -> NavigationConfig {
        NavigationConfig {
            has_information_schema: true,
            grouping,
            separator: "_".to_string(),
            page_size: 50,
            hide_db: None,
            only_db: vec![],
        }
    }

    #[test]
    fn test_attach_database_node_grouping() {
        let mut tree = NodeTree::new();
        let cfg = cfg(true);
        let eu = attach_database_node(&mut tree, &cfg, "customer_eu");
        let us = attach_database_node(&mut tree, &cfg, "customer_us");
        let plain = attach_database_node(&mut tree, &cfg, "sakila");

        // Both grouped databases share one group node
        let group = tree.get(eu).parent().unwrap();
        assert_eq!(tree.get(us).parent(), Some(group));
        assert!(tree.get(group).is_group);
        assert_eq!(tree.get(group).name, "customer");

        assert_eq!(tree.get(eu).name, "eu");
        assert_eq!(tree.get(eu).real_name, "customer_eu");
        assert_eq!(tree.get(plain).parent(), Some(tree.root()));
    }

    #[test]
    fn test_attach_database_node_group_does_not_capture_plain_twin() {
        let mut tree = NodeTree::new();
        let cfg = cfg(true);
        // A database named exactly like a later group prefix
        let plain = attach_database_node(&mut tree, &cfg, "customer");
        let eu = attach_database_node(&mut tree, &cfg, "customer_eu");

        let group = tree.get(eu).parent().unwrap();
        assert_ne!(group, plain);
        assert!(tree.get(group).is_group);
        assert!(!tree.get(plain).is_group);
    }

    #[test]
    fn test_attach_database_node_without_grouping() {
        let mut tree = NodeTree::new();
        let cfg = cfg(false);
        let id = attach_database_node(&mut tree, &cfg, "customer_eu");
        assert_eq!(tree.get(id).parent(), Some(tree.root()));
        assert_eq!(tree.get(id).name, "customer_eu");
    }

    #[test]
    fn test_render_item_paths_fold_groups() {
        let mut tree = NodeTree::new();
        let cfg = cfg(true);
        let eu = attach_database_node(&mut tree, &cfg, "customer_eu");
        let tables = tree.add_child(eu, Node::container("Tables"));
        tree.add_child(tables, Node::object("orders"));

        let rendered = render_item(&tree, tree.root());
        assert_eq!(rendered.name, "root");
        let group = &rendered.children[0];
        assert!(group.is_group);

        let db = &group.children[0];
        assert_eq!(db.name, "eu");
        assert_eq!(db.real_name, "customer_eu");
        // The group node never appears in either encoding
        assert_eq!(db.apath, "cm9vdA==.Y3VzdG9tZXJfZXU=");
        assert_eq!(db.vpath, "cm9vdA==.ZXU=");

        let table = &db.children[0].children[0];
        assert_eq!(table.kind, "object");
        assert_eq!(table.apath, "cm9vdA==.Y3VzdG9tZXJfZXU=.VGFibGVz.b3JkZXJz");
    }
}
