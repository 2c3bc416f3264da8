//! The `Transporter` abstraction (spec §4.6): `peek`/`get`/`put`/`classify`/
//! `close` against a single repository, plus the `TransportListener`
//! contract for progress reporting and cancellation.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use resolver_model::descriptor::BoxFuture;
use resolver_util::errors::ResolverError;

use crate::auth;
use crate::repository::RemoteRepository;

/// How a transport failure should be treated by the repository connector's
/// retry policy (spec §4.7: "one retry on `OTHER`, immediate fallthrough on
/// `NOT_FOUND`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    Other,
}

/// Observes transfer progress and may cancel an in-flight transfer by
/// returning `Err` from [`TransportListener::progressed`] (spec §4.6).
pub trait TransportListener: Send + Sync {
    fn started(&self, _resource: &str, _content_length: Option<u64>) {}

    fn progressed(&self, _resource: &str, _transferred: u64) -> Result<(), TransferCancelled> {
        Ok(())
    }

    fn succeeded(&self, _resource: &str) {}

    fn failed(&self, _resource: &str, _error: &str) {}
}

/// Sentinel returned from [`TransportListener::progressed`] to cancel a
/// transfer in progress.
#[derive(Debug, Clone, Copy)]
pub struct TransferCancelled;

/// A listener that does nothing; the default for calls that don't care
/// about progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl TransportListener for NoopListener {}

/// Reports artifact transfers as Cargo-style status lines via
/// `resolver_util::progress`. Used on the connector's and POM reader's real
/// fetch/publish paths; internal metadata and checksum-sidecar requests stay
/// on [`NoopListener`] since they're too frequent and too small to narrate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleTransportListener;

impl TransportListener for ConsoleTransportListener {
    fn started(&self, resource: &str, content_length: Option<u64>) {
        match content_length {
            Some(len) => resolver_util::progress::status_info("Downloading", &format!("{resource} ({len} bytes)")),
            None => resolver_util::progress::status_info("Downloading", resource),
        }
    }

    fn succeeded(&self, resource: &str) {
        resolver_util::progress::status("Fetched", resource);
    }

    fn failed(&self, resource: &str, error: &str) {
        resolver_util::progress::status_warn("Failed", &format!("{resource}: {error}"));
    }
}

/// Moves bytes to and from a single repository. Implementations are
/// constructed per-repository by a `TransporterFactory` keyed on URI scheme
/// and are expected to be reused across many transfers (spec §4.6).
pub trait Transporter: Send + Sync {
    /// Whether a resource exists, without downloading it.
    fn peek<'a>(&'a self, relative_path: &'a str) -> BoxFuture<'a, miette::Result<bool>>;

    /// Download a resource. Returns `Ok(None)` if it does not exist.
    fn get<'a>(
        &'a self,
        relative_path: &'a str,
        listener: &'a dyn TransportListener,
    ) -> BoxFuture<'a, miette::Result<Option<Vec<u8>>>>;

    /// Upload a resource.
    fn put<'a>(
        &'a self,
        relative_path: &'a str,
        data: &'a [u8],
        listener: &'a dyn TransportListener,
    ) -> BoxFuture<'a, miette::Result<()>>;

    /// Classify an error this transporter produced, for the connector's
    /// retry policy.
    fn classify(&self, error: &miette::Report) -> ErrorClass;

    /// Release any held resources (connection pools, file handles).
    fn close(&self) {}
}

/// Build the right [`Transporter`] for a repository's URL scheme.
pub fn build_transporter(repo: &RemoteRepository) -> miette::Result<Box<dyn Transporter>> {
    if let Some(path) = repo.url.strip_prefix("file://") {
        Ok(Box::new(FileTransporter::new(PathBuf::from(path))))
    } else if repo.url.starts_with("http://") || repo.url.starts_with("https://") {
        Ok(Box::new(HttpTransporter::new(repo.clone())?))
    } else {
        Err(ResolverError::NoTransporter {
            repository_id: repo.id.clone(),
            url: repo.url.clone(),
        }
        .into())
    }
}

/// Transporter for `file://` repositories: local directories used for
/// tests and for repositories materialized on disk.
pub struct FileTransporter {
    root: PathBuf,
}

impl FileTransporter {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl Transporter for FileTransporter {
    fn peek<'a>(&'a self, relative_path: &'a str) -> BoxFuture<'a, miette::Result<bool>> {
        let path = self.root.join(relative_path);
        Box::pin(async move { Ok(path.is_file()) })
    }

    fn get<'a>(
        &'a self,
        relative_path: &'a str,
        listener: &'a dyn TransportListener,
    ) -> BoxFuture<'a, miette::Result<Option<Vec<u8>>>> {
        let path = self.root.join(relative_path);
        Box::pin(async move {
            if !path.is_file() {
                return Ok(None);
            }
            listener.started(relative_path, std::fs::metadata(&path).ok().map(|m| m.len()));
            let data = std::fs::read(&path).map_err(ResolverError::Io)?;
            listener
                .progressed(relative_path, data.len() as u64)
                .map_err(|_| ResolverError::TransferCancelled {
                    resource: relative_path.to_string(),
                })?;
            listener.succeeded(relative_path);
            Ok(Some(data))
        })
    }

    fn put<'a>(
        &'a self,
        relative_path: &'a str,
        data: &'a [u8],
        listener: &'a dyn TransportListener,
    ) -> BoxFuture<'a, miette::Result<()>> {
        let path = self.root.join(relative_path);
        Box::pin(async move {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(ResolverError::Io)?;
            }
            listener.started(relative_path, Some(data.len() as u64));
            std::fs::write(&path, data).map_err(ResolverError::Io)?;
            listener.succeeded(relative_path);
            Ok(())
        })
    }

    fn classify(&self, _error: &miette::Report) -> ErrorClass {
        ErrorClass::Other
    }
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Transporter for `http(s)://` repositories, built on `reqwest`.
pub struct HttpTransporter {
    client: Client,
    repo: RemoteRepository,
}

impl HttpTransporter {
    pub fn new(repo: RemoteRepository) -> miette::Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("resolver-maven/0.1")
            .build()
            .map_err(|e| ResolverError::Generic {
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client, repo })
    }
}

impl Transporter for HttpTransporter {
    fn peek<'a>(&'a self, relative_path: &'a str) -> BoxFuture<'a, miette::Result<bool>> {
        let url = self.repo.resolve(relative_path);
        Box::pin(async move {
            let mut req = self.client.head(&url);
            req = auth::apply_auth(req, &self.repo);
            let resp = req.send().await.map_err(|e| ResolverError::Generic {
                message: format!("HEAD {url} failed: {e}"),
            })?;
            Ok(resp.status().is_success())
        })
    }

    fn get<'a>(
        &'a self,
        relative_path: &'a str,
        listener: &'a dyn TransportListener,
    ) -> BoxFuture<'a, miette::Result<Option<Vec<u8>>>> {
        let url = self.repo.resolve(relative_path);
        Box::pin(async move {
            let mut req = self.client.get(&url);
            req = auth::apply_auth(req, &self.repo);

            let resp = req.send().await.map_err(|e| ResolverError::Generic {
                message: format!("GET {url} failed: {e}"),
            })?;

            if resp.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !resp.status().is_success() {
                return Err(ResolverError::Generic {
                    message: format!("HTTP {} fetching {url}", resp.status()),
                }
                .into());
            }

            listener.started(relative_path, resp.content_length());
            let bytes = resp.bytes().await.map_err(|e| ResolverError::Generic {
                message: format!("Failed to read body of {url}: {e}"),
            })?;
            listener
                .progressed(relative_path, bytes.len() as u64)
                .map_err(|_| ResolverError::TransferCancelled {
                    resource: relative_path.to_string(),
                })?;
            listener.succeeded(relative_path);
            Ok(Some(bytes.to_vec()))
        })
    }

    fn put<'a>(
        &'a self,
        relative_path: &'a str,
        data: &'a [u8],
        listener: &'a dyn TransportListener,
    ) -> BoxFuture<'a, miette::Result<()>> {
        let url = self.repo.resolve(relative_path);
        Box::pin(async move {
            listener.started(relative_path, Some(data.len() as u64));
            let mut req = self.client.put(&url).body(data.to_vec());
            req = auth::apply_auth(req, &self.repo);
            let resp = req.send().await.map_err(|e| ResolverError::Generic {
                message: format!("PUT {url} failed: {e}"),
            })?;
            if !resp.status().is_success() {
                listener.failed(relative_path, &resp.status().to_string());
                return Err(ResolverError::DeploymentError {
                    coordinate: relative_path.to_string(),
                    repository_id: self.repo.id.clone(),
                    reason: format!("HTTP {}", resp.status()),
                }
                .into());
            }
            listener.succeeded(relative_path);
            Ok(())
        })
    }

    fn classify(&self, error: &miette::Report) -> ErrorClass {
        let msg = error.to_string();
        if msg.contains("404") || msg.contains("Not Found") {
            ErrorClass::NotFound
        } else {
            ErrorClass::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_transporter_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let transporter = FileTransporter::new(tmp.path().to_path_buf());
        let listener = NoopListener;

        transporter
            .put("org/example/lib/1.0/lib-1.0.jar", b"hello", &listener)
            .await
            .unwrap();

        assert!(transporter
            .peek("org/example/lib/1.0/lib-1.0.jar")
            .await
            .unwrap());

        let data = transporter
            .get("org/example/lib/1.0/lib-1.0.jar", &listener)
            .await
            .unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn file_transporter_get_missing_returns_none() {
        let tmp = tempfile::tempdir().unwrap();
        let transporter = FileTransporter::new(tmp.path().to_path_buf());
        let result = transporter.get("missing.jar", &NoopListener).await.unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn build_transporter_rejects_unknown_scheme() {
        let repo = RemoteRepository::new("weird", "ftp://example.com/repo");
        let result = build_transporter(&repo);
        assert!(result.is_err());
    }
}
