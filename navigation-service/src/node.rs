//! Navigation tree node arena.
//!
//! Nodes live in a per-request arena and point at each other by index, so
//! the parent back-reference plus owned child list never needs shared
//! ownership. The tree is built while rendering one response and dropped
//! with it; nothing here is persisted.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Index of a node within its [`NodeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Whether a node stands for a concrete database object or a grouping
/// level ("Tables", "Views") with no database identity of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Container,
    Object,
}

/// One entry of the navigation tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Display name (for grouped databases: the part after the prefix).
    pub name: String,
    /// Real, unescaped identifying name.
    pub real_name: String,
    pub kind: NodeKind,
    /// Separator-folded group node.
    pub is_group: bool,
    /// Icon hint for the client.
    pub icon: Option<String>,
    /// Route template the client opens for this node.
    pub link: Option<String>,
    /// Pagination offset of this node's second-level children.
    pub pos2: u32,
    /// Pagination offset of this node's third-level children.
    pub pos3: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(name: impl Into<String>, real_name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            real_name: real_name.into(),
            kind,
            is_group: false,
            icon: None,
            link: None,
            pos2: 0,
            pos3: 0,
            parent: None,
            children: Vec::new(),
        }
    }

    /// A database object node whose display and real name coincide.
    pub fn object(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name, NodeKind::Object)
    }

    /// A database object node with distinct display and real names
    /// (grouped databases display only the remainder after the prefix).
    pub fn object_with_real(name: impl Into<String>, real_name: impl Into<String>) -> Self {
        Self::new(name, real_name, NodeKind::Object)
    }

    /// A container node ("Tables", "Views", ...).
    pub fn container(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name, NodeKind::Container)
    }

    /// A separator-folded group node.
    pub fn group(prefix: impl Into<String>) -> Self {
        let mut node = Self::container(prefix);
        node.is_group = true;
        node
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_pos2(mut self, pos2: u32) -> Self {
        self.pos2 = pos2;
        self
    }

    pub fn with_pos3(mut self, pos3: u32) -> Self {
        self.pos3 = pos3;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// The two path encodings of a node.
///
/// The real path runs over real names, the virtual path over display names
/// with groups folded out. Both include containers, both exclude group
/// nodes, both are root-first. The encoded forms base64 each segment and
/// join with dots so names may contain any character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePaths {
    pub apath: String,
    pub apath_parts: Vec<String>,
    pub vpath: String,
    pub vpath_parts: Vec<String>,
}

/// Arena holding one request's navigation tree.
#[derive(Debug)]
pub struct NodeTree {
    nodes: Vec<Node>,
}

impl NodeTree {
    /// Creates a tree containing only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::container("root")],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Attaches `node` under `parent`.
    ///
    /// The child's parent pointer and the parent's child list are written
    /// here and nowhere else, so the two sides cannot drift apart.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        node.parent = Some(parent);
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Finds a direct child by display name.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.get(parent)
            .children
            .iter()
            .copied()
            .find(|&c| self.get(c).name == name)
    }

    /// Ancestors of `id`, nearest-first.
    ///
    /// `include_self` also yields the starting node, subject to the same
    /// filters. Containers are skipped unless `include_containers`; group
    /// nodes are skipped unless `include_groups`. The root returns an
    /// empty chain when `include_self` is false.
    pub fn parents(
        &self,
        id: NodeId,
        include_self: bool,
        include_containers: bool,
        include_groups: bool,
    ) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = if include_self {
            Some(id)
        } else {
            self.get(id).parent
        };

        while let Some(node_id) = current {
            let node = self.get(node_id);
            let skip = (node.kind == NodeKind::Container && !include_containers)
                || (node.is_group && !include_groups);
            if !skip {
                out.push(node_id);
            }
            current = node.parent;
        }
        out
    }

    /// Computes the real and virtual path encodings for a node by walking
    /// its parent links to the root.
    pub fn paths(&self, id: NodeId) -> NodePaths {
        // Containers always included, group nodes always excluded
        let mut chain = self.parents(id, true, true, false);
        chain.reverse();

        let apath_parts: Vec<String> = chain
            .iter()
            .map(|&n| self.get(n).real_name.clone())
            .collect();
        let vpath_parts: Vec<String> = chain.iter().map(|&n| self.get(n).name.clone()).collect();

        NodePaths {
            apath: encode_path(&apath_parts),
            apath_parts,
            vpath: encode_path(&vpath_parts),
            vpath_parts,
        }
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_path(parts: &[String]) -> String {
    parts
        .iter()
        .map(|p| BASE64.encode(p.as_bytes()))
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root > group "customer" > db "customer_eu" (shown as "eu")
    ///      > container "Tables" > table "orders"
    fn sample_tree() -> (NodeTree, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = NodeTree::new();
        let root = tree.root();
        let group = tree.add_child(root, Node::group("customer"));
        let db = tree.add_child(group, Node::object_with_real("eu", "customer_eu"));
        let tables = tree.add_child(db, Node::container("Tables"));
        let table = tree.add_child(tables, Node::object("orders"));
        (tree, group, db, tables, table)
    }

    #[test]
    fn test_add_child_links_both_sides() {
        let (tree, group, db, _, _) = sample_tree();
        assert_eq!(tree.get(db).parent(), Some(group));
        assert!(tree.get(group).children().contains(&db));
        assert_eq!(tree.get(group).parent(), Some(tree.root()));
    }

    #[test]
    fn test_parents_nearest_first() {
        let (tree, group, db, tables, table) = sample_tree();
        let chain = tree.parents(table, false, true, true);
        assert_eq!(chain, vec![tables, db, group, tree.root()]);
    }

    #[test]
    fn test_parents_filters() {
        let (tree, _group, db, tables, table) = sample_tree();

        // Containers excluded: drops "Tables", the group, and the root
        let chain = tree.parents(table, false, false, true);
        assert_eq!(chain, vec![db]);

        // Groups excluded, containers kept
        let chain = tree.parents(table, false, true, false);
        assert_eq!(chain, vec![tables, db, tree.root()]);

        // include_self applies the same filters to the starting node
        let chain = tree.parents(tables, true, false, true);
        assert_eq!(chain, vec![db]);
    }

    #[test]
    fn test_parents_empty_at_root() {
        let tree = NodeTree::new();
        assert!(tree.parents(tree.root(), false, true, true).is_empty());
    }

    #[test]
    fn test_paths_exclude_groups_include_containers() {
        let (tree, _, _, _, table) = sample_tree();
        let paths = tree.paths(table);

        assert_eq!(
            paths.apath_parts,
            vec!["root", "customer_eu", "Tables", "orders"]
        );
        assert_eq!(paths.vpath_parts, vec!["root", "eu", "Tables", "orders"]);

        // base64("root") . base64("customer_eu") . base64("Tables") . base64("orders")
        assert_eq!(paths.apath, "cm9vdA==.Y3VzdG9tZXJfZXU=.VGFibGVz.b3JkZXJz");
        assert_eq!(paths.vpath, "cm9vdA==.ZXU=.VGFibGVz.b3JkZXJz");
    }

    #[test]
    fn test_paths_at_root() {
        let tree = NodeTree::new();
        let paths = tree.paths(tree.root());
        assert_eq!(paths.apath_parts, vec!["root"]);
        assert_eq!(paths.apath, "cm9vdA==");
    }

    #[test]
    fn test_find_child() {
        let (tree, group, _, _, _) = sample_tree();
        assert_eq!(tree.find_child(tree.root(), "customer"), Some(group));
        assert_eq!(tree.find_child(tree.root(), "missing"), None);
    }
}
