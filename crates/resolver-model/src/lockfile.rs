use serde::{Deserialize, Serialize};
use std::path::Path;

/// Deterministic record of a completed resolution: the conflict-free DAG
/// flattened to one entry per resolved artifact, suitable for reproducing a
/// resolution without re-contacting remote repositories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(default)]
    pub artifact: Vec<LockedArtifact>,
}

/// A single artifact as it appeared in the resolved graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockedArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(default)]
    pub extension: String,
    #[serde(default)]
    pub classifier: String,
    pub scope: String,
    #[serde(default)]
    pub optional: bool,
    /// `algorithm:hexdigest`, e.g. `SHA-256:deadbeef...`.
    #[serde(default)]
    pub checksum: Option<String>,
    /// Id of the remote repository the artifact file was fetched from.
    #[serde(default)]
    pub repository_id: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<LockedDependencyRef>,
}

/// A reference to a direct dependency of a [`LockedArtifact`], by conflict
/// key, as it stood in the resolved graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockedDependencyRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl Lockfile {
    /// Load and parse a lockfile from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            resolver_util::errors::ResolverError::Generic {
                message: format!("Failed to read lockfile: {e}"),
            }
        })?;
        toml::from_str(&content).map_err(|e| {
            resolver_util::errors::ResolverError::Generic {
                message: format!("Failed to parse lockfile: {e}"),
            }
            .into()
        })
    }

    /// Serialize the lockfile to a pretty-printed TOML string.
    pub fn to_string_pretty(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Find a locked artifact by `(groupId, artifactId)`, ignoring version.
    pub fn find(&self, group_id: &str, artifact_id: &str) -> Option<&LockedArtifact> {
        self.artifact
            .iter()
            .find(|a| a.group_id == group_id && a.artifact_id == artifact_id)
    }
}
