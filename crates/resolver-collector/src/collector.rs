//! The dependency collector (spec §4.2): expands a root request to the
//! full transitive graph by breadth-first traversal, applying management,
//! selection, version resolution, version filtering, relocation chasing,
//! cycle detection, and exclusion propagation at each step.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;

use resolver_model::coordinate::Artifact;
use resolver_model::dependency::{Dependency, Exclusion};
use resolver_model::descriptor::{ArtifactDescriptorPolicy, ArtifactDescriptorReader};
use resolver_util::errors::ResolverError;
use resolver_version::VersionConstraint;

use crate::graph::{DependencyGraph, NodeId};
use crate::policy::{DependencyContext, DependencyManager, DependencySelector, DependencyTraverser, VersionFilter};
use crate::version_resolver::VersionResolver;

/// Maximum relocation hops chased for a single dependency before treating it
/// as a cycle (spec §4.2 step 6).
pub const MAX_RELOCATIONS: usize = 16;

/// Everything the collector needs to expand a root into a full graph.
pub struct CollectRequest<'a> {
    pub root_artifact: Option<Artifact>,
    pub top_level_dependencies: Vec<Dependency>,
    pub selector: Arc<dyn DependencySelector>,
    pub manager: Arc<dyn DependencyManager>,
    pub traverser: Arc<dyn DependencyTraverser>,
    pub filter: Arc<dyn VersionFilter>,
    pub descriptor_reader: &'a dyn ArtifactDescriptorReader,
    pub version_resolver: &'a dyn VersionResolver,
    pub descriptor_policy: ArtifactDescriptorPolicy,
}

/// Ancestor identity used for both cycle detection (`(g, a, baseVersion)`)
/// and deterministic tie-breaking (declaration order).
type AncestorKey = (String, String, String);

struct QueueItem {
    parent: NodeId,
    path: Vec<AncestorKey>,
    selector: Arc<dyn DependencySelector>,
    manager: Arc<dyn DependencyManager>,
    traverser: Arc<dyn DependencyTraverser>,
    filter: Arc<dyn VersionFilter>,
    dependency: Dependency,
    depth: usize,
    ancestor_exclusions: BTreeSet<Exclusion>,
}

/// Expand `request` into a full (possibly cyclic) `DependencyGraph`
/// (spec §4.2 "Algorithm").
pub async fn collect(request: CollectRequest<'_>) -> miette::Result<DependencyGraph> {
    let mut graph = DependencyGraph::new();
    let root = graph.root();
    if let Some(artifact) = &request.root_artifact {
        graph.node_mut(root).data.insert(
            "coordinate".to_string(),
            artifact.to_string(),
        );
    }

    let mut queue: VecDeque<QueueItem> = VecDeque::new();
    for dependency in request.top_level_dependencies {
        queue.push_back(QueueItem {
            parent: root,
            path: Vec::new(),
            selector: request.selector.clone(),
            manager: request.manager.clone(),
            traverser: request.traverser.clone(),
            filter: request.filter.clone(),
            dependency,
            depth: 1,
            ancestor_exclusions: BTreeSet::new(),
        });
    }

    let mut collection_errors: Vec<ResolverError> = Vec::new();

    while let Some(item) = queue.pop_front() {
        let QueueItem {
            parent,
            path,
            selector,
            manager,
            traverser,
            filter,
            mut dependency,
            depth,
            ancestor_exclusions,
        } = item;

        // Step 1: management.
        if let Some(mgmt) = manager.manage_dependency(&dependency) {
            if let Some(version) = mgmt.version {
                dependency.artifact.version = version;
            }
            if let Some(scope) = mgmt.scope {
                dependency.scope = scope;
            }
            if let Some(optional) = mgmt.optional {
                dependency.optional = optional;
            }
            if let Some(exclusions) = mgmt.exclusions {
                dependency.exclusions.extend(exclusions);
            }
        }

        // Step 2: selection (includes exclusion propagation).
        if dependency.is_excluded_by(&ancestor_exclusions) || !selector.select(&dependency) {
            continue;
        }

        // Cycle handling: has this (g, a, baseVersion) already appeared on
        // the path from the root to here?
        let ancestor_key = (
            dependency.artifact.group_id.clone(),
            dependency.artifact.artifact_id.clone(),
            dependency.artifact.base_version(),
        );
        let is_cycle = path.contains(&ancestor_key);

        let node_id = graph.alloc(dependency.clone());
        graph.add_child(parent, node_id);
        graph.node_mut(node_id).request_context = format!("depth={depth}");

        if is_cycle {
            graph.node_mut(node_id).cycle_terminator = true;
            continue;
        }

        // Step 3: resolve the version constraint against metadata.
        let constraint = match VersionConstraint::parse(&dependency.artifact.version) {
            Ok(c) => c,
            Err(e) => {
                graph.node_mut(node_id).errors.push(e.to_string());
                collection_errors.push(ResolverError::VersionResolutionError {
                    coordinate: dependency.artifact.to_string(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let candidates = match request
            .version_resolver
            .resolve(&dependency.artifact.group_id, &dependency.artifact.artifact_id, &constraint)
            .await
        {
            Ok(c) => c,
            Err(e) => {
                graph.node_mut(node_id).errors.push(e.to_string());
                collection_errors.push(ResolverError::VersionResolutionError {
                    coordinate: dependency.artifact.to_string(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        // Step 4: prune candidates.
        let pruned = filter.filter(&dependency, &candidates);
        if pruned.is_empty() {
            let msg = format!(
                "version filter rejected every candidate for {}",
                dependency.artifact
            );
            graph.node_mut(node_id).errors.push(msg.clone());
            collection_errors.push(ResolverError::VersionResolutionError {
                coordinate: dependency.artifact.to_string(),
                reason: msg,
            });
            continue;
        }

        // Steps 5-6: read the descriptor for the highest-ordered candidate
        // that yields one, chasing relocations as we go.
        let chosen = pruned[0].clone();
        let resolved_artifact = dependency.artifact.clone().with_version(chosen.original.clone());

        let (final_artifact, descriptor, relocation_history) =
            match chase_relocations(request.descriptor_reader, resolved_artifact).await {
                Ok(result) => result,
                Err(e) => {
                    let node = graph.node_mut(node_id);
                    match request.descriptor_policy {
                        ArtifactDescriptorPolicy::Strict => {
                            node.errors.push(e.to_string());
                            collection_errors.push(ResolverError::DescriptorError {
                                coordinate: dependency.artifact.to_string(),
                                reason: e.to_string(),
                            });
                        }
                        ArtifactDescriptorPolicy::IgnoreMissing
                        | ArtifactDescriptorPolicy::IgnoreInvalid => {
                            node.errors.push(format!("treated as leaf: {e}"));
                        }
                    }
                    graph.node_mut(node_id).version = Some(chosen);
                    continue;
                }
            };

        {
            let node = graph.node_mut(node_id);
            node.version = Some(chosen);
            node.relocations = relocation_history;
            node.aliases = descriptor.aliases.clone();
            node.repositories = descriptor.repositories.clone();
            if let Some(mut dep) = node.dependency.take() {
                dep.artifact = final_artifact.clone();
                node.dependency = Some(dep);
            }
        }

        if !traverser.traverse(graph.node(node_id).dependency.as_ref().unwrap()) {
            continue;
        }

        // Exclusions the current node's own declaration carries apply to
        // every child (spec §4.2 "Exclusions propagate"); a child's own
        // exclusions only take effect one level further down; they must not
        // leak sideways into unrelated siblings.
        let child_exclusions: BTreeSet<Exclusion> = ancestor_exclusions
            .union(&dependency.exclusions)
            .cloned()
            .collect();

        for child_dep in &descriptor.dependencies {
            if child_dep.optional {
                continue;
            }
            let child_context = DependencyContext {
                dependency: child_dep,
                depth,
            };
            let mut child_path = path.clone();
            child_path.push(ancestor_key.clone());

            queue.push_back(QueueItem {
                parent: node_id,
                path: child_path,
                selector: selector.derive_child(&child_context),
                manager: manager.derive_child(&child_context),
                traverser: traverser.derive_child(&child_context),
                filter: filter.derive_child(&child_context),
                dependency: child_dep.clone(),
                depth: depth + 1,
                ancestor_exclusions: child_exclusions.clone(),
            });
        }
    }

    if !collection_errors.is_empty() && matches!(request.descriptor_policy, ArtifactDescriptorPolicy::Strict) {
        let hard_errors: Vec<ResolverError> = collection_errors
            .into_iter()
            .filter(|e| !matches!(e, ResolverError::VersionResolutionError { .. }))
            .collect();
        if !hard_errors.is_empty() {
            return Err(ResolverError::CollectionError {
                message: format!("{} dependency read(s) failed", hard_errors.len()),
                causes: hard_errors,
            }
            .into());
        }
    }

    Ok(graph)
}

/// Follow `<distributionManagement><relocation>` redirects up to
/// `MAX_RELOCATIONS` hops, returning the final coordinate, its descriptor,
/// and the chain of coordinates it was reached through (oldest first).
async fn chase_relocations(
    reader: &dyn ArtifactDescriptorReader,
    start: Artifact,
) -> miette::Result<(Artifact, resolver_model::descriptor::ArtifactDescriptor, Vec<Artifact>)> {
    let mut current = start;
    let mut history = Vec::new();
    let mut seen: HashSet<(String, String, String, String, String)> = HashSet::new();

    loop {
        let key = (
            current.group_id.clone(),
            current.artifact_id.clone(),
            current.extension.clone(),
            current.classifier.clone(),
            current.version.clone(),
        );
        if !seen.insert(key) {
            return Err(ResolverError::DescriptorError {
                coordinate: current.to_string(),
                reason: "relocation cycle detected".to_string(),
            }
            .into());
        }
        if history.len() > MAX_RELOCATIONS {
            return Err(ResolverError::DescriptorError {
                coordinate: current.to_string(),
                reason: format!("exceeded {MAX_RELOCATIONS} relocation hops"),
            }
            .into());
        }

        let descriptor = reader.read(&current).await?;
        match descriptor.relocations.first() {
            Some(target) => {
                history.push(current);
                current = target.clone();
            }
            None => return Ok((current, descriptor, history)),
        }
    }
}

trait ArtifactExt {
    fn with_version(self, version: String) -> Self;
}

impl ArtifactExt for Artifact {
    fn with_version(mut self, version: String) -> Self {
        self.version = version;
        self
    }
}
