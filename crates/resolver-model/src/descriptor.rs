//! The `ArtifactDescriptor` contract: the project-model builder (POM
//! parsing) is treated as an opaque external collaborator (spec §1) that,
//! given a coordinate, returns dependencies, managed dependencies,
//! relocations, and exclusions.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;

use crate::coordinate::Artifact;
use crate::dependency::{Dependency, Exclusion};

/// Everything the collector needs from a project's own declaration: its
/// direct dependencies, the dependency-management entries it contributes
/// (including BOM imports), where it relocates to (if anywhere), and the
/// remote repositories it additionally names.
#[derive(Debug, Clone, Default)]
pub struct ArtifactDescriptor {
    pub artifact: Option<Artifact>,
    pub dependencies: Vec<Dependency>,
    pub managed_dependencies: Vec<Dependency>,
    /// Non-empty only when this artifact has moved to another coordinate
    /// (spec §4.2 step 6 "Chase relocations"). Ordered oldest-first.
    pub relocations: Vec<Artifact>,
    /// `(groupId, artifactId)` aliases merged into the same conflict group
    /// as this artifact (spec §4.3a).
    pub aliases: Vec<(String, String)>,
    pub repositories: Vec<String>,
}

impl ArtifactDescriptor {
    /// Look up a managed version for `(groupId, artifactId)`, honoring the
    /// first match in declaration order (nearer/earlier entries win, same
    /// as Maven's own dependencyManagement precedence).
    pub fn managed_version(&self, group_id: &str, artifact_id: &str) -> Option<&str> {
        self.managed_dependencies
            .iter()
            .find(|d| d.artifact.group_id == group_id && d.artifact.artifact_id == artifact_id)
            .map(|d| d.artifact.version.as_str())
    }

    pub fn managed_scope(&self, group_id: &str, artifact_id: &str) -> Option<&str> {
        self.managed_dependencies
            .iter()
            .find(|d| d.artifact.group_id == group_id && d.artifact.artifact_id == artifact_id)
            .map(|d| d.scope.as_str())
    }

    pub fn managed_exclusions(&self, group_id: &str, artifact_id: &str) -> BTreeSet<Exclusion> {
        self.managed_dependencies
            .iter()
            .find(|d| d.artifact.group_id == group_id && d.artifact.artifact_id == artifact_id)
            .map(|d| d.exclusions.clone())
            .unwrap_or_default()
    }
}

/// How a descriptor-read failure should be handled (spec §4.2 "Failure
/// semantics").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtifactDescriptorPolicy {
    /// Any read failure fails the whole resolution.
    #[default]
    Strict,
    /// A missing descriptor (not found in any repository) treats the
    /// dependency as a leaf; other failures still fail.
    IgnoreMissing,
    /// A malformed descriptor logs an event and continues, treating the
    /// dependency as a leaf.
    IgnoreInvalid,
}

/// A boxed, `Send` future — the same shape `async_trait` would generate,
/// written by hand so this crate does not need that dependency.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read an artifact's descriptor. Implemented by `resolver-maven`'s POM
/// reader; mocked directly in collector tests.
pub trait ArtifactDescriptorReader: Send + Sync {
    fn read<'a>(&'a self, artifact: &'a Artifact) -> BoxFuture<'a, miette::Result<ArtifactDescriptor>>;
}
