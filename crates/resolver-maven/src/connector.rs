//! The repository connector (spec §4.7): batches transfers against a
//! repository, applies the provided/remote checksum policy, and retries
//! `OTHER` transport errors once before falling through to the next
//! repository in the list.

use std::sync::Arc;

use resolver_model::coordinate::Artifact;
use resolver_util::errors::ResolverError;

use crate::cache::{ArtifactOrigin, LocalRepositoryManager};
use crate::checksum;
use crate::config::ChecksumPolicy;
use crate::repository::{ChecksumLocation, Maven2Layout, RemoteRepository, RepositoryLayout};
use crate::sync::{InProcessSyncContextFactory, LockKey, SyncContextFactory};
use crate::transport::{build_transporter, ConsoleTransportListener, ErrorClass, Transporter, TransportListener};

/// Supplies checksums known in advance of contacting the remote (e.g. from a
/// signed provenance manifest). Checked before the transporter is asked for
/// remote-external sidecars; a hit here overrides any remote value (spec
/// §4.7 step 3, "Provided overrides ... first match wins").
pub trait ProvidedChecksumsSource: Send + Sync {
    fn checksums_for(&self, artifact: &Artifact) -> Vec<ChecksumLocation>;
}

/// A `ProvidedChecksumsSource` with nothing registered.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProvidedChecksums;

impl ProvidedChecksumsSource for NoProvidedChecksums {
    fn checksums_for(&self, _artifact: &Artifact) -> Vec<ChecksumLocation> {
        Vec::new()
    }
}

/// Batches artifact transfers against an ordered list of repositories,
/// applying one retry per repository on `OTHER` errors before moving to the
/// next (spec §7 "Retry policy").
pub struct RepositoryConnector {
    repositories: Vec<RemoteRepository>,
    layout: Maven2Layout,
    checksum_algorithms: Vec<String>,
    checksum_policy: ChecksumPolicy,
    provided_checksums: Box<dyn ProvidedChecksumsSource>,
    local_repository: Option<Arc<LocalRepositoryManager>>,
    sync_contexts: Arc<dyn SyncContextFactory>,
}

impl RepositoryConnector {
    pub fn new(repositories: Vec<RemoteRepository>) -> Self {
        Self {
            repositories,
            layout: Maven2Layout,
            checksum_algorithms: vec!["SHA-256".to_string(), "SHA-1".to_string()],
            checksum_policy: ChecksumPolicy::Fail,
            provided_checksums: Box::new(NoProvidedChecksums),
            local_repository: None,
            sync_contexts: Arc::new(InProcessSyncContextFactory::new()),
        }
    }

    pub fn with_checksum_policy(mut self, policy: ChecksumPolicy) -> Self {
        self.checksum_policy = policy;
        self
    }

    pub fn with_checksum_algorithms(mut self, algorithms: Vec<String>) -> Self {
        self.checksum_algorithms = algorithms;
        self
    }

    pub fn with_provided_checksums(mut self, source: Box<dyn ProvidedChecksumsSource>) -> Self {
        self.provided_checksums = source;
        self
    }

    /// Install every artifact this connector fetches into `local_repository`
    /// under a sync-context lock, and check it before going to the network.
    pub fn with_local_repository(mut self, local_repository: Arc<LocalRepositoryManager>) -> Self {
        self.local_repository = Some(local_repository);
        self
    }

    /// Share a sync context factory across readers/connectors that write to
    /// the same local repository, instead of each locking independently.
    pub fn with_sync_contexts(mut self, factory: Arc<dyn SyncContextFactory>) -> Self {
        self.sync_contexts = factory;
        self
    }

    /// Download an artifact's bytes, verifying checksums per policy. Serves
    /// from the local repository when already cached; otherwise walks the
    /// repository list in order under an exclusive sync-context lock,
    /// installing the first successful fetch before returning it. An
    /// `OTHER` transport error is retried once against the same repository,
    /// then falls through to the next. A `NOT_FOUND` falls through
    /// immediately.
    pub async fn get_artifact(&self, artifact: &Artifact) -> miette::Result<(Vec<u8>, String)> {
        if let Some(local) = &self.local_repository {
            if let Some(path) = local.get_jar(artifact) {
                let data = std::fs::read(&path).map_err(ResolverError::Io)?;
                return Ok((data, "local".to_string()));
            }
        }

        let content_path = self.layout.artifact_path(artifact);
        let provided = self.provided_checksums.checksums_for(artifact);
        let lock_key = LockKey::artifact(artifact.to_string());
        let mut sync = self.sync_contexts.acquire(&[lock_key], &[], true);

        let mut last_error: Option<miette::Report> = None;
        for repo in &self.repositories {
            match self.fetch_with_retry(repo, &content_path, &provided).await {
                Ok(data) => {
                    if let Some(local) = &self.local_repository {
                        local.put(artifact, ArtifactOrigin::Cached, &data, &repo.id)?;
                    }
                    sync.close();
                    return Ok((data, repo.id.clone()));
                }
                Err((ErrorClass::NotFound, _)) => continue,
                Err((ErrorClass::Other, e)) => {
                    last_error = Some(e);
                    continue;
                }
            }
        }
        sync.close();
        match last_error {
            Some(e) => Err(e),
            None => Err(ResolverError::ArtifactNotFound {
                coordinate: artifact.to_string(),
                repositories: self.repositories.len(),
            }
            .into()),
        }
    }

    async fn fetch_with_retry(
        &self,
        repo: &RemoteRepository,
        content_path: &str,
        provided: &[ChecksumLocation],
    ) -> Result<Vec<u8>, (ErrorClass, miette::Report)> {
        let transporter = build_transporter(repo).map_err(|e| (ErrorClass::Other, e))?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.fetch_once(transporter.as_ref(), repo, content_path, provided).await {
                Ok(data) => return Ok(data),
                Err(e) => {
                    let class = transporter.classify(&e);
                    if class == ErrorClass::Other && attempt == 1 {
                        tracing::warn!(repository_id = %repo.id, resource = %content_path, "transport error, retrying once");
                        continue;
                    }
                    return Err((class, e));
                }
            }
        }
    }

    async fn fetch_once(
        &self,
        transporter: &dyn Transporter,
        repo: &RemoteRepository,
        content_path: &str,
        provided: &[ChecksumLocation],
    ) -> miette::Result<Vec<u8>> {
        let data = transporter
            .get(content_path, &ConsoleTransportListener)
            .await?
            .ok_or_else(|| ResolverError::ArtifactNotFound {
                coordinate: content_path.to_string(),
                repositories: 1,
            })?;

        let locations = if !provided.is_empty() {
            provided.to_vec()
        } else {
            self.layout.checksums_for(content_path, &self.checksum_algorithms)
        };

        let result = checksum::verify(transporter, &locations, content_path, &data).await;
        checksum::apply_policy(result, self.checksum_policy, content_path)?;

        tracing::debug!(repository_id = %repo.id, resource = %content_path, bytes = data.len(), "artifact fetched");
        Ok(data)
    }

    /// Upload an artifact and its checksum sidecars to the first repository
    /// (spec §4.7 "Uploads reverse the flow").
    pub async fn put_artifact(&self, artifact: &Artifact, data: &[u8]) -> miette::Result<()> {
        let repo = self.repositories.first().ok_or_else(|| ResolverError::Generic {
            message: "no repository configured for upload".to_string(),
        })?;
        let content_path = self.layout.artifact_path(artifact);
        let transporter = build_transporter(repo)?;
        let listener = ConsoleTransportListener;

        transporter.put(&content_path, data, &listener).await?;

        for location in self.layout.checksums_for(&content_path, &self.checksum_algorithms) {
            if let Some(hex) = checksum::digest_hex(&location.algorithm, data) {
                transporter
                    .put(&location.relative_uri, hex.as_bytes(), &listener)
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_artifact_round_trips_through_file_repository() {
        let tmp = tempfile::tempdir().unwrap();
        let artifact = Artifact::new("org.example", "lib", "1.0");
        let layout = Maven2Layout;
        let path = tmp.path().join(layout.artifact_path(&artifact));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"jar bytes").unwrap();
        std::fs::write(format!("{}.sha256", path.display()), {
            use sha2::{Digest, Sha256};
            let mut h = Sha256::new();
            h.update(b"jar bytes");
            format!("{:x}", h.finalize())
        })
        .unwrap();

        let repo = RemoteRepository::new("local", format!("file://{}", tmp.path().display()));
        let connector = RepositoryConnector::new(vec![repo]);
        let (data, repo_id) = connector.get_artifact(&artifact).await.unwrap();
        assert_eq!(data, b"jar bytes");
        assert_eq!(repo_id, "local");
    }

    #[tokio::test]
    async fn get_artifact_falls_through_not_found_to_next_repository() {
        let empty = tempfile::tempdir().unwrap();
        let populated = tempfile::tempdir().unwrap();
        let artifact = Artifact::new("org.example", "lib", "1.0");
        let layout = Maven2Layout;
        let path = populated.path().join(layout.artifact_path(&artifact));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"jar bytes").unwrap();

        let connector = RepositoryConnector::new(vec![
            RemoteRepository::new("empty", format!("file://{}", empty.path().display())),
            RemoteRepository::new("populated", format!("file://{}", populated.path().display())),
        ])
        .with_checksum_policy(ChecksumPolicy::Ignore);

        let (data, repo_id) = connector.get_artifact(&artifact).await.unwrap();
        assert_eq!(data, b"jar bytes");
        assert_eq!(repo_id, "populated");
    }

    #[tokio::test]
    async fn get_artifact_reports_not_found_when_no_repository_has_it() {
        let empty = tempfile::tempdir().unwrap();
        let artifact = Artifact::new("org.example", "missing", "1.0");
        let connector = RepositoryConnector::new(vec![RemoteRepository::new(
            "empty",
            format!("file://{}", empty.path().display()),
        )]);
        let result = connector.get_artifact(&artifact).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn put_artifact_writes_content_and_checksum_sidecars() {
        let tmp = tempfile::tempdir().unwrap();
        let artifact = Artifact::new("org.example", "lib", "1.0");
        let repo = RemoteRepository::new("local", format!("file://{}", tmp.path().display()));
        let connector = RepositoryConnector::new(vec![repo]);
        connector.put_artifact(&artifact, b"payload").await.unwrap();

        let layout = Maven2Layout;
        let content_path = layout.artifact_path(&artifact);
        assert!(tmp.path().join(&content_path).is_file());
        assert!(tmp.path().join(format!("{content_path}.sha256")).is_file());
        assert!(tmp.path().join(format!("{content_path}.sha1")).is_file());
    }

    #[tokio::test]
    async fn get_artifact_installs_into_local_repository_and_serves_from_it_next_time() {
        let remote = tempfile::tempdir().unwrap();
        let local_root = tempfile::tempdir().unwrap();
        let artifact = Artifact::new("org.example", "lib", "1.0");
        let layout = Maven2Layout;
        let path = remote.path().join(layout.artifact_path(&artifact));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"jar bytes").unwrap();

        let repo = RemoteRepository::new("central", format!("file://{}", remote.path().display()));
        let local_repository = Arc::new(LocalRepositoryManager::new(local_root.path()));
        let connector = RepositoryConnector::new(vec![repo])
            .with_checksum_policy(ChecksumPolicy::Ignore)
            .with_local_repository(local_repository.clone());

        let (data, repo_id) = connector.get_artifact(&artifact).await.unwrap();
        assert_eq!(data, b"jar bytes");
        assert_eq!(repo_id, "central");
        assert!(local_repository.has_artifact(&artifact));

        // Remove the remote copy; a second fetch must still succeed by
        // serving from the local repository instead of the network.
        std::fs::remove_file(&path).unwrap();
        let (data, repo_id) = connector.get_artifact(&artifact).await.unwrap();
        assert_eq!(data, b"jar bytes");
        assert_eq!(repo_id, "local");
    }
}
