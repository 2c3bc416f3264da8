use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for the resolution engine (spec §7).
#[derive(Debug, Error, Diagnostic)]
pub enum ResolverError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A version, range, or constraint string could not be parsed.
    #[error("Failed to parse {kind} {input:?}: {reason}")]
    #[diagnostic(help("Check the version syntax against the Maven version scheme"))]
    ParseError {
        kind: &'static str,
        input: String,
        reason: String,
    },

    /// A repository has no layout provider for its `content_type` (spec §4.5).
    #[error("Repository {repository_id} (type {content_type}) has no layout provider")]
    NoRepositoryLayout {
        repository_id: String,
        content_type: String,
    },

    /// No `Transporter` could be built for a repository's URI scheme (spec §4.6).
    #[error("No transporter available for repository {repository_id} ({url})")]
    NoTransporter { repository_id: String, url: String },

    /// Reading an artifact descriptor (POM) failed (spec §4.2 step 5, §4.5).
    #[error("Failed to read descriptor for {coordinate}: {reason}")]
    DescriptorError { coordinate: String, reason: String },

    /// A version constraint could not be resolved against repository metadata
    /// (spec §4.1, §4.2 step 2).
    #[error("Failed to resolve version for {coordinate}: {reason}")]
    VersionResolutionError { coordinate: String, reason: String },

    /// Aggregate collection failure: the root request failed, or enough child
    /// requests failed that collection could not proceed (spec §4.2).
    #[error("Dependency collection failed: {message}")]
    CollectionError {
        message: String,
        #[related]
        causes: Vec<ResolverError>,
    },

    /// Conflict resolution could not select a version for a conflict group
    /// because no candidate version satisfies every contributing range
    /// constraint (spec §4.3e).
    #[error("No version of {group_id}:{artifact_id} satisfies all constraints: {constraints}")]
    UnsolvableVersionConflict {
        group_id: String,
        artifact_id: String,
        constraints: String,
        #[help]
        contributing_paths: String,
    },

    /// An artifact was not found in any repository (spec §4.7).
    #[error("Artifact not found: {coordinate} (checked {repositories} repositories)")]
    ArtifactNotFound {
        coordinate: String,
        repositories: usize,
    },

    /// A `maven-metadata.xml` document was not found in any repository
    /// (spec §4.1, §4.4).
    #[error("Metadata not found: {group_id}:{artifact_id}{version_suffix}")]
    MetadataNotFound {
        group_id: String,
        artifact_id: String,
        version_suffix: String,
    },

    /// A downloaded file's checksum did not match any checksum location
    /// under the active `ChecksumPolicy` (spec §4.5, §4.7).
    #[error("Checksum mismatch for {file} using {algorithm}: expected {expected}, got {actual}")]
    ChecksumFailure {
        file: String,
        algorithm: String,
        expected: String,
        actual: String,
    },

    /// A transfer was cancelled via its `TransportListener` (spec §4.6).
    #[error("Transfer cancelled: {resource}")]
    TransferCancelled { resource: String },

    /// Installing a resolved artifact into the local repository failed
    /// (spec §4.4).
    #[error("Installation failed for {coordinate}: {reason}")]
    InstallationError { coordinate: String, reason: String },

    /// Deploying (uploading) an artifact to a remote repository failed.
    #[error("Deployment failed for {coordinate} to {repository_id}: {reason}")]
    DeploymentError {
        coordinate: String,
        repository_id: String,
        reason: String,
    },

    /// Catch-all for miscellaneous errors, including configuration loading.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type ResolverResult<T> = miette::Result<T>;
