//! Pluggable collection policies (spec §4.2): `DependencySelector`,
//! `DependencyManager`, `DependencyTraverser`, `VersionFilter`. Each exposes
//! `derive_child(context)` returning the instance to use for the subtree;
//! implementers should return the same `Arc` when nothing changed so the
//! collector can structurally share policy instances across siblings.

use std::collections::BTreeSet;
use std::sync::Arc;

use resolver_model::dependency::{Dependency, Exclusion, Scope};
use resolver_version::Version;

/// Context handed to a policy's `derive_child` when the collector is about
/// to recurse into `dependency`'s own children.
pub struct DependencyContext<'a> {
    pub dependency: &'a Dependency,
    pub depth: usize,
}

/// Overrides a `DependencyManager` applies to a dependency before selection
/// (spec §4.2 step 1).
#[derive(Debug, Clone, Default)]
pub struct DependencyManagement {
    pub version: Option<String>,
    pub scope: Option<Scope>,
    pub optional: Option<bool>,
    pub exclusions: Option<BTreeSet<Exclusion>>,
}

pub trait DependencySelector: Send + Sync {
    fn select(&self, dependency: &Dependency) -> bool;
    fn derive_child(&self, context: &DependencyContext<'_>) -> Arc<dyn DependencySelector>;
}

pub trait DependencyManager: Send + Sync {
    fn manage_dependency(&self, dependency: &Dependency) -> Option<DependencyManagement>;
    fn derive_child(&self, context: &DependencyContext<'_>) -> Arc<dyn DependencyManager>;
}

pub trait DependencyTraverser: Send + Sync {
    fn traverse(&self, dependency: &Dependency) -> bool;
    fn derive_child(&self, context: &DependencyContext<'_>) -> Arc<dyn DependencyTraverser>;
}

pub trait VersionFilter: Send + Sync {
    /// Prune `candidates` (already restricted to the constraint's range) down
    /// to the acceptable set, preserving relative order (spec §4.2 step 4).
    fn filter(&self, dependency: &Dependency, candidates: &[Version]) -> Vec<Version>;
    fn derive_child(&self, context: &DependencyContext<'_>) -> Arc<dyn VersionFilter>;
}

/// Accepts every dependency unconditionally.
pub struct AcceptAllSelector;

impl DependencySelector for AcceptAllSelector {
    fn select(&self, _dependency: &Dependency) -> bool {
        true
    }

    fn derive_child(&self, _context: &DependencyContext<'_>) -> Arc<dyn DependencySelector> {
        Arc::new(AcceptAllSelector)
    }
}

/// Rejects a dependency if it is named by the accumulated ancestor exclusion
/// set (spec §4.2 "Exclusions propagate").
pub struct ExclusionDependencySelector {
    exclusions: BTreeSet<Exclusion>,
}

impl ExclusionDependencySelector {
    pub fn new(exclusions: BTreeSet<Exclusion>) -> Self {
        Self { exclusions }
    }
}

impl DependencySelector for ExclusionDependencySelector {
    fn select(&self, dependency: &Dependency) -> bool {
        !dependency.is_excluded_by(&self.exclusions)
    }

    fn derive_child(&self, context: &DependencyContext<'_>) -> Arc<dyn DependencySelector> {
        let mut merged = self.exclusions.clone();
        merged.extend(context.dependency.exclusions.iter().cloned());
        Arc::new(ExclusionDependencySelector::new(merged))
    }
}

/// A list of externally-supplied managed coordinates (spec §3 "import"
/// scope / BOM imports): first match in list order wins, same precedence as
/// Maven's own `dependencyManagement`.
#[derive(Clone)]
pub struct FifoDependencyManager {
    managed: Arc<Vec<Dependency>>,
}

impl FifoDependencyManager {
    pub fn new(managed: Vec<Dependency>) -> Self {
        Self {
            managed: Arc::new(managed),
        }
    }
}

impl DependencyManager for FifoDependencyManager {
    fn manage_dependency(&self, dependency: &Dependency) -> Option<DependencyManagement> {
        let hit = self.managed.iter().find(|m| {
            m.artifact.group_id == dependency.artifact.group_id
                && m.artifact.artifact_id == dependency.artifact.artifact_id
        })?;
        Some(DependencyManagement {
            version: Some(hit.artifact.version.clone()),
            scope: Some(hit.scope.clone()),
            optional: Some(hit.optional),
            exclusions: if hit.exclusions.is_empty() {
                None
            } else {
                Some(hit.exclusions.clone())
            },
        })
    }

    fn derive_child(&self, _context: &DependencyContext<'_>) -> Arc<dyn DependencyManager> {
        Arc::new(self.clone())
    }
}

/// Standard Maven/Gradle traversal rule: `test`, `provided`, and `system`
/// scoped dependencies are leaves (their own transitive dependencies are
/// never pulled in), matching the teacher's `resolve()` BFS loop.
pub struct StandardScopeTraverser;

impl DependencyTraverser for StandardScopeTraverser {
    fn traverse(&self, dependency: &Dependency) -> bool {
        !matches!(
            dependency.scope.as_str(),
            Scope::TEST | Scope::PROVIDED | Scope::SYSTEM
        )
    }

    fn derive_child(&self, _context: &DependencyContext<'_>) -> Arc<dyn DependencyTraverser> {
        Arc::new(StandardScopeTraverser)
    }
}

/// No pruning beyond the range constraint already applied by the version
/// resolver.
pub struct AcceptAllVersionFilter;

impl VersionFilter for AcceptAllVersionFilter {
    fn filter(&self, _dependency: &Dependency, candidates: &[Version]) -> Vec<Version> {
        candidates.to_vec()
    }

    fn derive_child(&self, _context: &DependencyContext<'_>) -> Arc<dyn VersionFilter> {
        Arc::new(AcceptAllVersionFilter)
    }
}

/// Maven/Gradle scope propagation: given a child's declared scope and the
/// parent's effective scope, produce the child's effective scope (spec
/// §4.3d). Grounded on the teacher's `propagate_scope`.
pub trait ScopeDeriver: Send + Sync {
    fn derive(&self, parent_scope: &Scope, child_scope: &Scope) -> Scope;
}

pub struct JavaScopeDeriver;

impl ScopeDeriver for JavaScopeDeriver {
    fn derive(&self, parent_scope: &Scope, child_scope: &Scope) -> Scope {
        match (parent_scope.as_str(), child_scope.as_str()) {
            (Scope::COMPILE, Scope::COMPILE) => Scope::compile(),
            (Scope::COMPILE, Scope::RUNTIME) => Scope::from(Scope::RUNTIME),
            (Scope::RUNTIME, Scope::COMPILE) => Scope::from(Scope::RUNTIME),
            (Scope::RUNTIME, Scope::RUNTIME) => Scope::from(Scope::RUNTIME),
            (Scope::TEST, _) => Scope::from(Scope::TEST),
            (_, Scope::TEST) => Scope::from(Scope::TEST),
            (_, Scope::PROVIDED) => Scope::from(Scope::PROVIDED),
            (other, _) if other == Scope::PROVIDED || other == Scope::SYSTEM => {
                Scope::from(other.to_string())
            }
            _ => Scope::compile(),
        }
    }
}

/// Deterministic merge of several occurrences' effective scopes down to one
/// per conflict group (spec §4.3d). Picks the most restrictive-to-propagate
/// scope so the group never ends up more widely visible than any single
/// occurrence intended.
pub trait ScopeSelector: Send + Sync {
    fn select(&self, scopes: &[Scope]) -> Scope;
}

pub struct WidestScopeSelector;

const SCOPE_PRECEDENCE: &[&str] = &[
    Scope::COMPILE,
    Scope::RUNTIME,
    Scope::PROVIDED,
    Scope::TEST,
    Scope::SYSTEM,
];

impl ScopeSelector for WidestScopeSelector {
    fn select(&self, scopes: &[Scope]) -> Scope {
        scopes
            .iter()
            .min_by_key(|s| {
                SCOPE_PRECEDENCE
                    .iter()
                    .position(|p| *p == s.as_str())
                    .unwrap_or(SCOPE_PRECEDENCE.len())
            })
            .cloned()
            .unwrap_or_else(Scope::compile)
    }
}
