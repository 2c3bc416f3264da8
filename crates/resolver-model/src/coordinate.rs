//! Artifact coordinates: the 5-tuple identity of a Maven artifact.

use std::fmt;

/// Default extension used when a coordinate omits one.
pub const DEFAULT_EXTENSION: &str = "jar";

/// `(groupId, artifactId, extension, classifier, version)`.
///
/// `extension` defaults to `"jar"`, `classifier` to `""`. Equality and
/// hashing are over all five fields, so two artifacts that differ only in
/// `version` are distinct coordinates (as Maven treats them).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Artifact {
    pub group_id: String,
    pub artifact_id: String,
    pub extension: String,
    pub classifier: String,
    pub version: String,
}

impl Artifact {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            classifier: String::new(),
            version: version.into(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = classifier.into();
        self
    }

    /// Parse `"group:artifact[:extension[:classifier]]:version"`.
    ///
    /// Three-part (`g:a:v`) and four-part (`g:a:e:v`) and five-part
    /// (`g:a:e:c:v`) shorthand are all accepted, matching the forms a
    /// `ArtifactDescriptorReader` caller is expected to hand in.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.len() {
            3 => Some(Self::new(parts[0], parts[1], parts[2])),
            4 => Some(
                Self::new(parts[0], parts[1], parts[3]).with_extension(parts[2]),
            ),
            5 => Some(
                Self::new(parts[0], parts[1], parts[4])
                    .with_extension(parts[2])
                    .with_classifier(parts[3]),
            ),
            _ => None,
        }
    }

    /// `group:artifact` — the key identifying a conflict group ignoring
    /// extension/classifier (used for coarse lookups; the real conflict
    /// group key also includes extension/classifier, see `conflict_key`).
    pub fn ga(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }

    /// The full conflict-group key: `(groupId, artifactId, classifier, extension)`.
    pub fn conflict_key(&self) -> (String, String, String, String) {
        (
            self.group_id.clone(),
            self.artifact_id.clone(),
            self.classifier.clone(),
            self.extension.clone(),
        )
    }

    /// Whether the literal version is a timestamped or suffix snapshot.
    ///
    /// Matches either the common `-SNAPSHOT` suffix or the timestamped form
    /// `<base>-<yyyyMMdd>.<HHmmss>-<buildNumber>`.
    pub fn is_snapshot(&self) -> bool {
        is_snapshot_version(&self.version)
    }

    /// The derived `baseVersion`: timestamped snapshots collapse to
    /// `<base>-SNAPSHOT`; everything else is unchanged. Used for local
    /// repository / remote layout path construction; resolution itself
    /// uses the literal `version`.
    pub fn base_version(&self) -> String {
        base_version_of(&self.version)
    }

    /// File name stem (no extension): `artifactId-version[-classifier]`.
    pub fn file_stem(&self) -> String {
        if self.classifier.is_empty() {
            format!("{}-{}", self.artifact_id, self.version)
        } else {
            format!("{}-{}-{}", self.artifact_id, self.version, self.classifier)
        }
    }

    /// File name: `artifactId-version[-classifier].extension`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.file_stem(), self.extension)
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.classifier.is_empty() && self.extension == DEFAULT_EXTENSION {
            write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
        } else if self.classifier.is_empty() {
            write!(
                f,
                "{}:{}:{}:{}",
                self.group_id, self.artifact_id, self.extension, self.version
            )
        } else {
            write!(
                f,
                "{}:{}:{}:{}:{}",
                self.group_id, self.artifact_id, self.extension, self.classifier, self.version
            )
        }
    }
}

/// Timestamped-snapshot pattern check: `<base>-yyyyMMdd.HHmmss-build#`.
fn is_snapshot_version(version: &str) -> bool {
    if version.ends_with("-SNAPSHOT") {
        return true;
    }
    let Some(idx) = version.rfind('-') else {
        return false;
    };
    let (rest, build) = version.split_at(idx);
    let build = &build[1..];
    if build.is_empty() || !build.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let Some(idx2) = rest.rfind('-') else {
        return false;
    };
    let (_, ts) = rest.split_at(idx2);
    let ts = &ts[1..];
    matches!(ts.split_once('.'), Some((date, time)) if date.len() == 8
        && time.len() == 6
        && date.chars().all(|c| c.is_ascii_digit())
        && time.chars().all(|c| c.is_ascii_digit()))
}

fn base_version_of(version: &str) -> String {
    if let Some(stripped) = version.strip_suffix("-SNAPSHOT") {
        return format!("{stripped}-SNAPSHOT");
    }
    if !is_snapshot_version(version) {
        return version.to_string();
    }
    // Strip the trailing `-<timestamp>.<time>-<build>` segment, replacing
    // it with `-SNAPSHOT`.
    let idx_build = version.rfind('-').unwrap();
    let rest = &version[..idx_build];
    let idx_ts = rest.rfind('-').unwrap();
    format!("{}-SNAPSHOT", &version[..idx_ts])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_short_form() {
        let a = Artifact::parse("org.example:lib:1.0").unwrap();
        assert_eq!(a.group_id, "org.example");
        assert_eq!(a.artifact_id, "lib");
        assert_eq!(a.extension, "jar");
        assert_eq!(a.classifier, "");
        assert_eq!(a.version, "1.0");
    }

    #[test]
    fn parse_with_classifier() {
        let a = Artifact::parse("org.example:lib:jar:sources:1.0").unwrap();
        assert_eq!(a.extension, "jar");
        assert_eq!(a.classifier, "sources");
        assert_eq!(a.version, "1.0");
    }

    #[test]
    fn display_roundtrip_basic() {
        let a = Artifact::new("g", "a", "1.0");
        assert_eq!(a.to_string(), "g:a:1.0");
    }

    #[test]
    fn base_version_collapses_timestamped_snapshot() {
        let a = Artifact::new("g", "a", "1.0-20110329.221805-4");
        assert_eq!(a.base_version(), "1.0-SNAPSHOT");
        assert!(a.is_snapshot());
    }

    #[test]
    fn base_version_passthrough_for_release() {
        let a = Artifact::new("g", "a", "1.0");
        assert_eq!(a.base_version(), "1.0");
        assert!(!a.is_snapshot());
    }

    #[test]
    fn base_version_passthrough_for_plain_snapshot() {
        let a = Artifact::new("g", "a", "1.0-SNAPSHOT");
        assert_eq!(a.base_version(), "1.0-SNAPSHOT");
        assert!(a.is_snapshot());
    }

    #[test]
    fn file_name_with_classifier() {
        let a = Artifact::new("g", "a", "1.0").with_classifier("sources");
        assert_eq!(a.file_name(), "a-1.0-sources.jar");
    }

    #[test]
    fn conflict_key_ignores_version() {
        let a1 = Artifact::new("g", "a", "1.0");
        let a2 = Artifact::new("g", "a", "2.0");
        assert_eq!(a1.conflict_key(), a2.conflict_key());
    }
}
