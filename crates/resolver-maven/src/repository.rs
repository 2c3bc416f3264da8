//! Remote repository configuration and the Maven2 URI layout (spec §4.5).

use resolver_model::coordinate::Artifact;

/// Maven Central base URL.
pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2";

/// Google's Maven repository.
pub const GOOGLE_MAVEN_URL: &str = "https://maven.google.com";

/// A configured remote repository: id, base URL, content type (the layout
/// it uses), and optional credentials.
#[derive(Debug, Clone)]
pub struct RemoteRepository {
    pub id: String,
    pub url: String,
    /// Layout provider selector; `"default"`/`"maven2"` is the only one
    /// implemented, matching spec §4.5 "No layout provider registered for
    /// `content_type`".
    pub content_type: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

impl RemoteRepository {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into().trim_end_matches('/').to_string(),
            content_type: "default".to_string(),
            username: None,
            password: None,
            token: None,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn maven_central() -> Self {
        Self::new("central", MAVEN_CENTRAL_URL)
    }

    pub fn google() -> Self {
        Self::new("google", GOOGLE_MAVEN_URL)
    }

    pub fn has_auth(&self) -> bool {
        self.username.is_some() || self.token.is_some()
    }

    /// Full URL for a layout-relative path (no leading slash).
    pub fn resolve(&self, relative_path: &str) -> String {
        format!("{}/{}", self.url, relative_path)
    }
}

/// A checksum sidecar location relative to an artifact or metadata file
/// (spec §4.5 `ChecksumLocation{algorithm, relativeUri}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumLocation {
    pub algorithm: String,
    pub relative_uri: String,
}

/// Known checksum algorithms with their sidecar file extensions, in
/// preference order.
pub const CHECKSUM_EXTENSIONS: &[(&str, &str)] =
    &[("SHA-256", "sha256"), ("SHA-1", "sha1"), ("MD5", "md5")];

/// Provides layout-relative paths (for HTTP GET/PUT) for artifacts and
/// metadata under a repository, plus the checksum sidecar locations for a
/// given content path (spec §4.5).
pub trait RepositoryLayout: Send + Sync {
    fn artifact_path(&self, artifact: &Artifact) -> String;
    fn metadata_path(&self, group_id: &str, artifact_id: &str, version: Option<&str>) -> String;

    fn checksums_for(&self, content_path: &str, algorithms: &[String]) -> Vec<ChecksumLocation> {
        algorithms
            .iter()
            .filter_map(|alg| {
                CHECKSUM_EXTENSIONS
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(alg))
                    .map(|(name, ext)| ChecksumLocation {
                        algorithm: (*name).to_string(),
                        relative_uri: format!("{content_path}.{ext}"),
                    })
            })
            .collect()
    }
}

/// The standard Maven2 repository layout:
/// `<groupPath>/<artifactId>/<baseVersion>/<artifactId>-<version>[-classifier].<extension>`
#[derive(Debug, Clone, Copy, Default)]
pub struct Maven2Layout;

impl Maven2Layout {
    fn group_path(group_id: &str) -> String {
        group_id.replace('.', "/")
    }
}

impl RepositoryLayout for Maven2Layout {
    fn artifact_path(&self, artifact: &Artifact) -> String {
        format!(
            "{}/{}/{}/{}",
            Self::group_path(&artifact.group_id),
            artifact.artifact_id,
            artifact.base_version(),
            artifact.file_name()
        )
    }

    fn metadata_path(&self, group_id: &str, artifact_id: &str, version: Option<&str>) -> String {
        match version {
            Some(v) => format!(
                "{}/{}/{}/maven-metadata.xml",
                Self::group_path(group_id),
                artifact_id,
                v
            ),
            None => format!(
                "{}/{}/maven-metadata.xml",
                Self::group_path(group_id),
                artifact_id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_path_uses_base_version_directory_but_literal_filename() {
        let layout = Maven2Layout;
        let artifact = Artifact::new(
            "org.jetbrains.kotlinx",
            "kotlinx-coroutines-core",
            "1.8.0-20240101.120000-3",
        );
        let path = layout.artifact_path(&artifact);
        assert_eq!(
            path,
            "org/jetbrains/kotlinx/kotlinx-coroutines-core/1.8.0-SNAPSHOT/kotlinx-coroutines-core-1.8.0-20240101.120000-3.jar"
        );
    }

    #[test]
    fn artifact_path_with_classifier() {
        let layout = Maven2Layout;
        let artifact = Artifact::new("com.example", "lib", "1.0").with_classifier("sources");
        assert_eq!(
            layout.artifact_path(&artifact),
            "com/example/lib/1.0/lib-1.0-sources.jar"
        );
    }

    #[test]
    fn metadata_path_artifact_level() {
        let layout = Maven2Layout;
        assert_eq!(
            layout.metadata_path("org.example", "lib", None),
            "org/example/lib/maven-metadata.xml"
        );
    }

    #[test]
    fn metadata_path_version_level() {
        let layout = Maven2Layout;
        assert_eq!(
            layout.metadata_path("org.example", "lib", Some("1.0-SNAPSHOT")),
            "org/example/lib/1.0-SNAPSHOT/maven-metadata.xml"
        );
    }

    #[test]
    fn checksums_for_orders_by_requested_algorithms() {
        let layout = Maven2Layout;
        let locations = layout.checksums_for(
            "org/example/lib/1.0/lib-1.0.jar",
            &["SHA-256".to_string(), "MD5".to_string()],
        );
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].algorithm, "SHA-256");
        assert_eq!(locations[0].relative_uri, "org/example/lib/1.0/lib-1.0.jar.sha256");
        assert_eq!(locations[1].algorithm, "MD5");
    }

    #[test]
    fn remote_repository_resolve_joins_url_and_path() {
        let repo = RemoteRepository::maven_central();
        assert_eq!(
            repo.resolve("org/example/lib/1.0/lib-1.0.jar"),
            "https://repo.maven.apache.org/maven2/org/example/lib/1.0/lib-1.0.jar"
        );
    }
}
