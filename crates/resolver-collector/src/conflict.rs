//! The conflict resolver (spec §4.3): collapses the raw, possibly cyclic
//! graph produced by the collector into a DAG with exactly one node per
//! conflict group, via the six phases (a)-(f).

use std::collections::{BTreeMap, HashMap, HashSet};

use resolver_model::dependency::Scope;
use resolver_util::errors::ResolverError;
use resolver_version::{Version, VersionConstraint, VersionRange};

use crate::graph::{DependencyGraph, NodeId};
use crate::policy::{ScopeDeriver, ScopeSelector};

/// `(groupId, artifactId, classifier, extension)` — the conflict-group key.
type ConflictKey = (String, String, String, String);

/// Union-find over conflict keys, used to coalesce relocation/alias targets
/// into the same group as the coordinate that was actually requested
/// (spec §4.3a).
struct UnionFind {
    parent: HashMap<ConflictKey, ConflictKey>,
}

impl UnionFind {
    fn new() -> Self {
        Self {
            parent: HashMap::new(),
        }
    }

    fn find(&mut self, key: &ConflictKey) -> ConflictKey {
        if !self.parent.contains_key(key) {
            self.parent.insert(key.clone(), key.clone());
            return key.clone();
        }
        let parent = self.parent[key].clone();
        if &parent == key {
            return key.clone();
        }
        let root = self.find(&parent);
        self.parent.insert(key.clone(), root.clone());
        root
    }

    fn union(&mut self, a: &ConflictKey, b: &ConflictKey) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent.insert(ra, rb);
        }
    }
}

/// One occurrence of a conflict group somewhere in the raw graph: the node,
/// its depth from the root, and the path of node ids leading to it (used to
/// describe contributing paths on an unsolvable conflict).
#[derive(Clone)]
struct Occurrence {
    node: NodeId,
    depth: usize,
    path: Vec<NodeId>,
}

/// The winner chosen for one conflict group, plus enough bookkeeping for the
/// graph-rewrite phase.
struct Resolution {
    winner: NodeId,
    scope: Scope,
    optional: bool,
}

/// Resolve `graph`'s conflicts, returning a new DAG with one node per
/// conflict group (spec §4.3f) — structurally a `DependencyGraph` whose
/// `children` lists never repeat a conflict group and never cycle.
pub fn resolve(
    graph: &DependencyGraph,
    scope_deriver: &dyn ScopeDeriver,
    scope_selector: &dyn ScopeSelector,
) -> miette::Result<DependencyGraph> {
    // Phase (a): conflict marker via union-find with relocation/alias coalescing.
    let mut uf = UnionFind::new();
    for id in graph.non_root_ids() {
        let node = graph.node(id);
        let Some(artifact) = node.artifact() else {
            continue;
        };
        let key = artifact.conflict_key();
        uf.find(&key);
        for reloc in &node.relocations {
            uf.union(&key, &reloc.conflict_key());
        }
        for (g, a) in &node.aliases {
            uf.union(&key, &(g.clone(), a.clone(), artifact.classifier.clone(), artifact.extension.clone()));
        }
    }

    // Collect occurrences per conflict group via a BFS from the root so
    // depth and path are well defined even though the raw graph may be
    // cyclic (we simply don't revisit a node already placed on the walk).
    let mut occurrences: HashMap<ConflictKey, Vec<Occurrence>> = HashMap::new();
    let mut group_order: Vec<ConflictKey> = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut queue: std::collections::VecDeque<(NodeId, usize, Vec<NodeId>)> = std::collections::VecDeque::new();
    queue.push_back((graph.root(), 0, Vec::new()));

    while let Some((id, depth, path)) = queue.pop_front() {
        let node = graph.node(id);
        if let Some(artifact) = node.artifact() {
            let key = uf.find(&artifact.conflict_key());
            if !occurrences.contains_key(&key) {
                group_order.push(key.clone());
            }
            occurrences.entry(key).or_default().push(Occurrence {
                node: id,
                depth,
                path: path.clone(),
            });
        }
        if node.cycle_terminator || !visited.insert(id) {
            continue;
        }
        let mut child_path = path.clone();
        child_path.push(id);
        for &child in &node.children {
            queue.push_back((child, depth + 1, child_path.clone()));
        }
    }

    // Phase (b): topological sort of groups by "A precedes B if some
    // occurrence of A has some occurrence of B as a child". Implemented as
    // a DFS post-order over the group-level edges, breaking cycles at the
    // deepest occurrence's edge (the edge out of the occurrence with the
    // greatest depth is skipped when it would close a cycle).
    let node_to_group: HashMap<NodeId, ConflictKey> = occurrences
        .iter()
        .flat_map(|(key, occs)| occs.iter().map(move |o| (o.node, key.clone())))
        .collect();

    let mut group_edges: BTreeMap<ConflictKey, Vec<(ConflictKey, usize)>> = BTreeMap::new();
    for (key, occs) in &occurrences {
        let mut edges = Vec::new();
        for occ in occs {
            for &child in &graph.node(occ.node).children {
                if let Some(child_key) = node_to_group.get(&child) {
                    if child_key != key {
                        edges.push((child_key.clone(), occ.depth));
                    }
                }
            }
        }
        group_edges.insert(key.clone(), edges);
    }

    let order = topo_sort_breaking_cycles(&group_order, &group_edges);

    // Phase (c): nearest-wins version selection with range intersection.
    let mut resolutions: HashMap<ConflictKey, Resolution> = HashMap::new();
    for key in &order {
        let occs = &occurrences[key];
        let resolved = select_version(graph, key, occs)?;
        resolutions.insert(key.clone(), resolved);
    }

    // Phase (d) + (e): scope and optionality selection, folded into the same
    // per-group pass since both only need the occurrence list.
    for key in &order {
        let occs = &occurrences[key];
        let resolution = resolutions.get_mut(key).unwrap();
        resolution.scope = select_scope(graph, occs, scope_deriver, scope_selector);
        resolution.optional = select_optional(graph, occs);
    }

    // Phase (f): graph rewrite into a DAG with one node per group.
    rewrite(graph, &order, &occurrences, &resolutions, &node_to_group)
}

/// Kahn-style topological sort of conflict groups; when no group with
/// in-degree zero remains (a cycle), the edge out of the occurrence with the
/// greatest recorded depth is dropped and the sort continues.
fn topo_sort_breaking_cycles(
    group_order: &[ConflictKey],
    edges: &BTreeMap<ConflictKey, Vec<(ConflictKey, usize)>>,
) -> Vec<ConflictKey> {
    let mut remaining: BTreeMap<ConflictKey, Vec<ConflictKey>> = edges
        .iter()
        .map(|(k, v)| (k.clone(), v.iter().map(|(c, _)| c.clone()).collect()))
        .collect();
    let mut depths: BTreeMap<(ConflictKey, ConflictKey), usize> = BTreeMap::new();
    for (parent, children) in edges {
        for (child, depth) in children {
            depths.insert((parent.clone(), child.clone()), *depth);
        }
    }

    let mut result = Vec::new();
    let mut placed: HashSet<ConflictKey> = HashSet::new();

    while placed.len() < group_order.len() {
        let mut indegree: HashMap<ConflictKey, usize> = group_order
            .iter()
            .filter(|k| !placed.contains(*k))
            .map(|k| (k.clone(), 0))
            .collect();
        for children in remaining.values() {
            for child in children {
                if let Some(d) = indegree.get_mut(child) {
                    *d += 1;
                }
            }
        }

        let ready: Vec<ConflictKey> = group_order
            .iter()
            .filter(|k| !placed.contains(*k) && indegree.get(*k).copied() == Some(0))
            .cloned()
            .collect();

        if !ready.is_empty() {
            for key in ready {
                placed.insert(key.clone());
                result.push(key);
            }
            continue;
        }

        // Cycle: find the deepest edge among the remaining groups and drop it.
        let mut deepest: Option<(ConflictKey, ConflictKey, usize)> = None;
        for (parent, children) in &remaining {
            if placed.contains(parent) {
                continue;
            }
            for child in children {
                if placed.contains(child) {
                    continue;
                }
                let depth = depths
                    .get(&(parent.clone(), child.clone()))
                    .copied()
                    .unwrap_or(0);
                if deepest.as_ref().map(|(_, _, d)| depth > *d).unwrap_or(true) {
                    deepest = Some((parent.clone(), child.clone(), depth));
                }
            }
        }
        match deepest {
            Some((parent, child, _)) => {
                if let Some(children) = remaining.get_mut(&parent) {
                    children.retain(|c| c != &child);
                }
            }
            None => break,
        }
    }

    result
}

fn select_version(
    graph: &DependencyGraph,
    key: &ConflictKey,
    occs: &[Occurrence],
) -> miette::Result<Resolution> {
    let mut ranges: Vec<VersionRange> = Vec::new();
    let mut candidates: Vec<(Version, usize)> = Vec::new(); // (version, depth)
    let mut contributing_paths: Vec<String> = Vec::new();

    for occ in occs {
        let node = graph.node(occ.node);
        let Some(version) = &node.version else {
            continue;
        };
        let Some(dep) = &node.dependency else {
            continue;
        };
        contributing_paths.push(format!("depth {}: {}", occ.depth, dep.artifact));

        let constraint = VersionConstraint::parse(&dep.artifact.version).ok();
        if let Some(VersionConstraint::Ranges(new_ranges)) = constraint {
            ranges.extend(new_ranges);
            candidates.retain(|(v, _)| ranges.iter().all(|r| r.contains(v)));
            if !ranges.iter().all(|r| r.contains(version)) {
                // This occurrence's own resolved version doesn't satisfy
                // every range accumulated so far; it cannot be a candidate.
            } else {
                candidates.push((version.clone(), occ.depth));
            }
        } else {
            candidates.push((version.clone(), occ.depth));
        }

        if !ranges.is_empty() {
            candidates.retain(|(v, _)| ranges.iter().all(|r| r.contains(v)));
        }

        if !ranges.is_empty() && candidates.is_empty() {
            return Err(ResolverError::UnsolvableVersionConflict {
                group_id: key.0.clone(),
                artifact_id: key.1.clone(),
                constraints: ranges
                    .iter()
                    .map(|r| format!("{r:?}"))
                    .collect::<Vec<_>>()
                    .join(", "),
                contributing_paths: contributing_paths.join("; "),
            }
            .into());
        }
    }

    if candidates.is_empty() {
        return Err(ResolverError::UnsolvableVersionConflict {
            group_id: key.0.clone(),
            artifact_id: key.1.clone(),
            constraints: "no occurrence produced a resolvable version".to_string(),
            contributing_paths: contributing_paths.join("; "),
        }
        .into());
    }

    let min_depth = candidates.iter().map(|(_, d)| *d).min().unwrap();
    let winner = candidates
        .iter()
        .filter(|(_, d)| *d == min_depth)
        .map(|(v, _)| v)
        .max()
        .unwrap()
        .clone();

    let winning_node = occs
        .iter()
        .find(|o| {
            graph.node(o.node).version.as_ref() == Some(&winner) && o.depth == min_depth
        })
        .map(|o| o.node)
        .unwrap_or(occs[0].node);

    Ok(Resolution {
        winner: winning_node,
        scope: Scope::compile(),
        optional: false,
    })
}

fn select_scope(
    graph: &DependencyGraph,
    occs: &[Occurrence],
    deriver: &dyn ScopeDeriver,
    selector: &dyn ScopeSelector,
) -> Scope {
    if let Some(direct) = occs.iter().find(|o| o.depth <= 1) {
        return graph
            .node(direct.node)
            .dependency
            .as_ref()
            .map(|d| d.scope.clone())
            .unwrap_or_else(Scope::compile);
    }

    let derived: Vec<Scope> = occs
        .iter()
        .filter_map(|o| {
            let node = graph.node(o.node);
            let dep = node.dependency.as_ref()?;
            let parent = &graph.node(*o.path.last()?).dependency;
            let parent_scope = parent.as_ref().map(|d| d.scope.clone()).unwrap_or_else(Scope::compile);
            Some(deriver.derive(&parent_scope, &dep.scope))
        })
        .collect();

    if derived.is_empty() {
        return Scope::compile();
    }
    selector.select(&derived)
}

fn select_optional(graph: &DependencyGraph, occs: &[Occurrence]) -> bool {
    if let Some(direct) = occs.iter().find(|o| o.depth <= 1) {
        return graph
            .node(direct.node)
            .dependency
            .as_ref()
            .map(|d| d.optional)
            .unwrap_or(false);
    }
    occs.iter().all(|o| {
        graph
            .node(o.node)
            .dependency
            .as_ref()
            .map(|d| d.optional)
            .unwrap_or(false)
    })
}

fn rewrite(
    graph: &DependencyGraph,
    order: &[ConflictKey],
    occurrences: &HashMap<ConflictKey, Vec<Occurrence>>,
    resolutions: &HashMap<ConflictKey, Resolution>,
    node_to_group: &HashMap<NodeId, ConflictKey>,
) -> miette::Result<DependencyGraph> {
    let mut out = DependencyGraph::new();
    let out_root = out.root();
    let mut new_ids: HashMap<ConflictKey, NodeId> = HashMap::new();

    for key in order {
        let resolution = &resolutions[key];
        let winner_node = graph.node(resolution.winner);
        let Some(dep) = winner_node.dependency.clone() else {
            continue;
        };
        let mut dep = dep;
        dep.scope = resolution.scope.clone();
        dep.optional = resolution.optional;

        let new_id = out.alloc(dep);
        {
            let out_node = out.node_mut(new_id);
            out_node.version = winner_node.version.clone();
            out_node.relocations = winner_node.relocations.clone();
            out_node.aliases = winner_node.aliases.clone();
            out_node.repositories = winner_node.repositories.clone();
        }
        new_ids.insert(key.clone(), new_id);
    }

    // Parent edges: a group is a child of every group that, in the raw
    // graph, had some occurrence pointing at one of this group's occurrences.
    let occurrence_owner: HashMap<NodeId, &ConflictKey> = occurrences
        .iter()
        .flat_map(|(k, occs)| occs.iter().map(move |o| (o.node, k)))
        .collect();

    for key in order {
        let occs = &occurrences[key];
        let Some(&new_child) = new_ids.get(key) else {
            continue;
        };
        let mut parents: HashSet<ConflictKey> = HashSet::new();
        for occ in occs {
            if let Some(&parent_raw) = occ.path.last() {
                if let Some(parent_group) = node_to_group.get(&parent_raw) {
                    parents.insert(parent_group.clone());
                } else if parent_raw == graph.root() {
                    parents.insert(key.clone()); // placeholder replaced below
                }
            }
        }
        let is_top_level = occs.iter().any(|o| o.path.first() == Some(&graph.root()) && o.depth == 1);
        if is_top_level {
            out.add_child(out_root, new_child);
        }
        for parent_group in parents {
            if &parent_group == key {
                continue;
            }
            if let Some(&parent_id) = new_ids.get(&parent_group) {
                out.add_child(parent_id, new_child);
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver_model::coordinate::Artifact;
    use resolver_model::dependency::Dependency;
    use resolver_version::parse_version;

    use crate::policy::{JavaScopeDeriver, WidestScopeSelector};

    fn dep(g: &str, a: &str, v: &str) -> Dependency {
        Dependency::new(Artifact::new(g, a, v), Scope::compile())
    }

    #[test]
    fn nearest_wins_over_deeper_conflicting_occurrence() {
        let mut graph = DependencyGraph::new();
        let root = graph.root();

        let near = graph.alloc(dep("g", "lib", "1.0"));
        graph.add_child(root, near);
        graph.node_mut(near).version = Some(parse_version("1.0").unwrap());

        let mid = graph.alloc(dep("g", "other", "1.0"));
        graph.add_child(root, mid);
        graph.node_mut(mid).version = Some(parse_version("1.0").unwrap());

        let far = graph.alloc(dep("g", "lib", "2.0"));
        graph.add_child(mid, far);
        graph.node_mut(far).version = Some(parse_version("2.0").unwrap());

        let resolved = resolve(&graph, &JavaScopeDeriver, &WidestScopeSelector).unwrap();
        let lib = resolved
            .non_root_ids()
            .map(|id| resolved.node(id))
            .find(|n| n.artifact().unwrap().artifact_id == "lib")
            .unwrap();
        assert_eq!(lib.version.as_ref().unwrap().original, "1.0");
    }

    #[test]
    fn single_occurrence_group_resolves_to_itself() {
        let mut graph = DependencyGraph::new();
        let root = graph.root();
        let a = graph.alloc(dep("g", "a", "1.0"));
        graph.add_child(root, a);
        graph.node_mut(a).version = Some(parse_version("1.0").unwrap());

        let resolved = resolve(&graph, &JavaScopeDeriver, &WidestScopeSelector).unwrap();
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn disjoint_ranges_raise_unsolvable_version_conflict() {
        // g:a:1 -> g:c:[1,2)   and   g:b:1 -> g:c:[2,3): no version
        // satisfies both ranges at once.
        let mut graph = DependencyGraph::new();
        let root = graph.root();

        let a = graph.alloc(dep("g", "a", "1"));
        graph.add_child(root, a);
        graph.node_mut(a).version = Some(parse_version("1").unwrap());

        let b = graph.alloc(dep("g", "b", "1"));
        graph.add_child(root, b);
        graph.node_mut(b).version = Some(parse_version("1").unwrap());

        let c_low = graph.alloc(dep("g", "c", "[1,2)"));
        graph.add_child(a, c_low);
        graph.node_mut(c_low).version = Some(parse_version("1.5").unwrap());

        let c_high = graph.alloc(dep("g", "c", "[2,3)"));
        graph.add_child(b, c_high);
        graph.node_mut(c_high).version = Some(parse_version("2.5").unwrap());

        let err = resolve(&graph, &JavaScopeDeriver, &WidestScopeSelector).unwrap_err();
        let message = format!("{err:?}");
        assert!(message.contains("satisfies all constraints"));
        assert!(message.contains("g:c"));
        // Both contributing occurrences are named in the backtracking path.
        assert!(message.contains("[1,2)"));
        assert!(message.contains("[2,3)"));
    }
}
