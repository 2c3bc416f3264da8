//! Arena-based dependency graph (spec §3 "DependencyNode", §9 design notes).
//!
//! Cyclic graphs with shared children cannot use exclusive ownership of
//! children by one parent, so nodes live in a flat arena keyed by a stable
//! integer id; edges are `(parentId, childId)` lists. The conflict resolver
//! builds a second arena holding the pruned DAG rather than mutating this
//! one in place.

use std::collections::HashMap;

use resolver_model::coordinate::Artifact;
use resolver_model::dependency::Dependency;
use resolver_version::Version;

pub type NodeId = usize;

/// A node in the raw (possibly cyclic) collected graph (spec §3).
#[derive(Debug, Clone)]
pub struct DependencyNode {
    pub id: NodeId,
    /// `None` only for the root.
    pub dependency: Option<Dependency>,
    pub version: Option<Version>,
    pub children: Vec<NodeId>,
    /// Coordinates this node relocated from, oldest first (spec §4.2 step 6,
    /// scenario 4: the final node at the relocation target carries the
    /// chain of coordinates it was reached through).
    pub relocations: Vec<Artifact>,
    pub aliases: Vec<(String, String)>,
    pub repositories: Vec<String>,
    pub request_context: String,
    pub data: HashMap<String, String>,
    /// Set when this node repeats an ancestor's `(groupId, artifactId,
    /// baseVersion)` on the root-to-here path; it is included in the graph
    /// but was not recursed into (spec §4.2 "Cycle handling").
    pub cycle_terminator: bool,
    /// Errors recorded on this node rather than aborting collection, e.g. an
    /// empty version-filter result (spec §4.2 step 4) or a descriptor read
    /// failure under a non-`Strict` policy (spec §4.2 "Failure semantics").
    pub errors: Vec<String>,
}

impl DependencyNode {
    fn leaf(id: NodeId, dependency: Option<Dependency>) -> Self {
        Self {
            id,
            dependency,
            version: None,
            children: Vec::new(),
            relocations: Vec::new(),
            aliases: Vec::new(),
            repositories: Vec::new(),
            request_context: String::new(),
            data: HashMap::new(),
            cycle_terminator: false,
            errors: Vec::new(),
        }
    }

    /// The artifact this node resolved to, if any (root has none until a
    /// caller assigns `dependency`).
    pub fn artifact(&self) -> Option<&Artifact> {
        self.dependency.as_ref().map(|d| &d.artifact)
    }
}

/// Arena holding every node produced by a single collection run.
pub struct DependencyGraph {
    arena: Vec<DependencyNode>,
    root: NodeId,
}

impl DependencyGraph {
    /// Create a graph with just a root node (no `Dependency` of its own).
    pub fn new() -> Self {
        let root = DependencyNode::leaf(0, None);
        Self {
            arena: vec![root],
            root: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Allocate a new node and return its id.
    pub fn alloc(&mut self, dependency: Dependency) -> NodeId {
        let id = self.arena.len();
        self.arena.push(DependencyNode::leaf(id, Some(dependency)));
        id
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.arena[parent].children.contains(&child) {
            self.arena[parent].children.push(child);
        }
    }

    pub fn node(&self, id: NodeId) -> &DependencyNode {
        &self.arena[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut DependencyNode {
        &mut self.arena[id]
    }

    /// All node ids except the root, in allocation order.
    pub fn non_root_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.arena.len()).filter(move |&id| id != self.root)
    }

    pub fn len(&self) -> usize {
        self.arena.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total node count including the root (used internally by the
    /// conflict resolver to size its rewritten arena).
    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver_model::dependency::Scope;

    fn dep(g: &str, a: &str, v: &str) -> Dependency {
        Dependency::new(Artifact::new(g, a, v), Scope::compile())
    }

    #[test]
    fn root_has_no_dependency() {
        let g = DependencyGraph::new();
        assert!(g.node(g.root()).dependency.is_none());
        assert!(g.is_empty());
    }

    #[test]
    fn alloc_and_link_children() {
        let mut g = DependencyGraph::new();
        let root = g.root();
        let a = g.alloc(dep("org.example", "a", "1.0"));
        g.add_child(root, a);
        assert_eq!(g.node(root).children, vec![a]);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn add_child_is_idempotent() {
        let mut g = DependencyGraph::new();
        let root = g.root();
        let a = g.alloc(dep("org.example", "a", "1.0"));
        g.add_child(root, a);
        g.add_child(root, a);
        assert_eq!(g.node(root).children.len(), 1);
    }

    #[test]
    fn distinct_dependency_coordinates_get_distinct_nodes() {
        let mut g = DependencyGraph::new();
        let a = g.alloc(dep("org.example", "a", "1.0"));
        let b = g.alloc(dep("org.example", "a", "2.0"));
        assert_ne!(a, b);
        assert_eq!(g.len(), 2);
    }
}
