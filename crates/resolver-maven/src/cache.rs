//! Local repository manager (spec §4.4): installed vs cached artifact
//! layout under one base directory, a tracking file recording which remote
//! repositories vouch for each filename, and an optional split mode.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use resolver_model::coordinate::Artifact;
use resolver_util::errors::ResolverError;

use crate::pom::{self, Pom};

/// Whether a cached file came from installing a locally-built artifact or
/// from downloading it from a remote repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactOrigin {
    Installed,
    Cached,
}

/// The local repository: a base directory mirroring Maven2 layout, with an
/// optional split between `installed/`, `cached/releases/`, and
/// `cached/snapshots/` prefixes (spec §4.4 "Split mode").
#[derive(Debug, Clone)]
pub struct LocalRepositoryManager {
    root: PathBuf,
    split: bool,
}

impl LocalRepositoryManager {
    /// Create a manager rooted at `<project_root>/.resolver/repository/` in
    /// non-split mode (installed and cached artifacts share one path).
    pub fn new(project_root: &Path) -> Self {
        Self {
            root: project_root.join(".resolver").join("repository"),
            split: false,
        }
    }

    /// Enable split mode: paths are additionally prefixed with
    /// `installed/`, or `cached/releases/`|`cached/snapshots/` depending on
    /// origin and whether the version looks like a snapshot.
    pub fn with_split_mode(mut self, split: bool) -> Self {
        self.split = split;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn group_path(group_id: &str) -> String {
        group_id.replace('.', "/")
    }

    /// Directory containing every file for one `(group, artifact, version)`
    /// under the given origin.
    pub fn artifact_dir(&self, artifact: &Artifact, origin: ArtifactOrigin) -> PathBuf {
        let mut dir = self.root.clone();
        if self.split {
            dir = dir.join(Self::split_prefix(artifact, origin));
        }
        dir.join(Self::group_path(&artifact.group_id))
            .join(&artifact.artifact_id)
            .join(artifact.base_version())
    }

    fn split_prefix(artifact: &Artifact, origin: ArtifactOrigin) -> &'static str {
        match origin {
            ArtifactOrigin::Installed => "installed",
            ArtifactOrigin::Cached => {
                if artifact.is_snapshot() {
                    "cached/snapshots"
                } else {
                    "cached/releases"
                }
            }
        }
    }

    fn artifact_path(&self, artifact: &Artifact, origin: ArtifactOrigin) -> PathBuf {
        self.artifact_dir(artifact, origin).join(artifact.file_name())
    }

    fn pom_path(&self, artifact: &Artifact, origin: ArtifactOrigin) -> PathBuf {
        let pom_coordinate = artifact.clone().with_extension("pom").with_classifier("");
        self.artifact_dir(&pom_coordinate, origin)
            .join(pom_coordinate.file_name())
    }

    /// Look up a cached JAR (searching installed, then cached).
    pub fn get_jar(&self, artifact: &Artifact) -> Option<PathBuf> {
        for origin in [ArtifactOrigin::Installed, ArtifactOrigin::Cached] {
            let path = self.artifact_path(artifact, origin);
            if path.is_file() {
                return Some(path);
            }
        }
        None
    }

    /// Look up and parse a cached POM (searching installed, then cached).
    pub fn get_pom(&self, artifact: &Artifact) -> Option<Pom> {
        for origin in [ArtifactOrigin::Installed, ArtifactOrigin::Cached] {
            let path = self.pom_path(artifact, origin);
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(parsed) = pom::parse_pom(&content) {
                    return Some(parsed);
                }
            }
        }
        None
    }

    /// Store artifact bytes, recording `repository_id` as authoritative for
    /// the file in the version directory's tracking file.
    pub fn put(
        &self,
        artifact: &Artifact,
        origin: ArtifactOrigin,
        data: &[u8],
        repository_id: &str,
    ) -> miette::Result<PathBuf> {
        let dir = self.artifact_dir(artifact, origin);
        fs::create_dir_all(&dir).map_err(ResolverError::Io)?;
        let path = dir.join(artifact.file_name());
        fs::write(&path, data).map_err(ResolverError::Io)?;
        self.track(&dir, &artifact.file_name(), repository_id)?;
        Ok(path)
    }

    /// Store a POM's XML text the same way as [`put`](Self::put).
    pub fn put_pom(
        &self,
        artifact: &Artifact,
        origin: ArtifactOrigin,
        pom_xml: &str,
        repository_id: &str,
    ) -> miette::Result<PathBuf> {
        let pom_coordinate = artifact.clone().with_extension("pom").with_classifier("");
        self.put(&pom_coordinate, origin, pom_xml.as_bytes(), repository_id)
    }

    /// Append (or update) a tracking-file entry: `<filename>.<repoId>=<epoch>`.
    fn track(&self, version_dir: &Path, filename: &str, repository_id: &str) -> miette::Result<()> {
        let tracking_path = version_dir.join("_remote.repositories");
        let mut entries = read_tracking_file(&tracking_path);
        let epoch = epoch_seconds_from_mtime(version_dir)?;
        entries.insert(format!("{filename}>"), repository_id.to_string());
        entries.insert(format!("{filename}.{repository_id}"), epoch.to_string());
        write_tracking_file(&tracking_path, &entries)
    }

    /// Repositories recorded as authoritative for `filename` in the
    /// tracking file alongside it, if any.
    pub fn authoritative_repositories(&self, artifact: &Artifact, origin: ArtifactOrigin) -> HashSet<String> {
        let dir = self.artifact_dir(artifact, origin);
        let tracking_path = dir.join("_remote.repositories");
        let filename = artifact.file_name();
        read_tracking_file(&tracking_path)
            .into_iter()
            .filter_map(|(key, _)| {
                key.strip_prefix(&format!("{filename}."))
                    .map(|repo_id| repo_id.to_string())
            })
            .collect()
    }

    /// Whether the JAR for this coordinate exists locally (either origin).
    pub fn has_artifact(&self, artifact: &Artifact) -> bool {
        self.get_jar(artifact).is_some()
    }

    /// Remove cached artifacts not present in `keep`. Only the `Cached`
    /// namespace is pruned; installed artifacts are left alone, matching
    /// the Maven convention that locally-built artifacts are never silently
    /// deleted by a resolve/cleanup operation.
    pub fn prune(&self, keep: &HashSet<(String, String, String)>) -> u32 {
        let mut removed = 0u32;
        let cached_root = if self.split {
            self.root.join("cached")
        } else {
            self.root.clone()
        };
        if !cached_root.is_dir() {
            return removed;
        }
        collect_version_dirs(&cached_root, &cached_root, keep, &mut removed);
        removed
    }

    pub fn size(&self) -> u64 {
        dir_size(&self.root)
    }
}

fn read_tracking_file(path: &Path) -> HashMap<String, String> {
    let Ok(content) = fs::read_to_string(path) else {
        return HashMap::new();
    };
    content
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn write_tracking_file(path: &Path, entries: &HashMap<String, String>) -> miette::Result<()> {
    let mut keys: Vec<&String> = entries.keys().collect();
    keys.sort();
    let mut content = String::from("#NOTE: This is an internal implementation file, its format can be changed without prior notice.\n");
    for key in keys {
        content.push_str(key);
        content.push('=');
        content.push_str(&entries[key]);
        content.push('\n');
    }
    fs::write(path, content).map_err(|e| ResolverError::Io(e).into())
}

fn epoch_seconds_from_mtime(_dir: &Path) -> miette::Result<u64> {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| ResolverError::Generic {
            message: format!("system clock before UNIX epoch: {e}"),
        }
        .into())
}

fn collect_version_dirs(
    root: &Path,
    current: &Path,
    keep: &HashSet<(String, String, String)>,
    removed: &mut u32,
) {
    let Ok(entries) = fs::read_dir(current) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let has_files = fs::read_dir(&path)
            .map(|rd| rd.flatten().any(|e| e.path().is_file()))
            .unwrap_or(false);

        if has_files {
            if let Some(coord) = reconstruct_coordinate(root, &path) {
                if !keep.contains(&coord) {
                    let _ = fs::remove_dir_all(&path);
                    *removed += 1;
                }
            }
        } else {
            collect_version_dirs(root, &path, keep, removed);
            if fs::read_dir(&path).map(|mut rd| rd.next().is_none()).unwrap_or(true) {
                let _ = fs::remove_dir(&path);
            }
        }
    }
}

fn reconstruct_coordinate(root: &Path, version_dir: &Path) -> Option<(String, String, String)> {
    let rel = version_dir.strip_prefix(root).ok()?;
    let components: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    if components.len() < 3 {
        return None;
    }
    let version = components.last()?.clone();
    let artifact = components[components.len() - 2].clone();
    let group = components[..components.len() - 2].join(".");
    Some((group, artifact, version))
}

fn dir_size(path: &Path) -> u64 {
    let mut total = 0u64;
    if let Ok(entries) = fs::read_dir(path) {
        for entry in entries.flatten() {
            if let Ok(m) = entry.metadata() {
                if m.is_dir() {
                    total += dir_size(&entry.path());
                } else {
                    total += m.len();
                }
            }
        }
    }
    total
}
