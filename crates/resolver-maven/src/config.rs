//! Session configuration recognized under the `aether.*` namespace (spec §6).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Checksum policy applied when verifying downloaded bytes (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumPolicy {
    /// Any mismatch aborts the transfer; nothing is installed.
    #[default]
    Fail,
    /// A mismatch installs the file anyway but records an event.
    Warn,
    /// No verification is performed.
    Ignore,
}

/// Recognized `aether.*` configuration keys, deserializable from a
/// `[aether]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    #[serde(rename = "checksums.algorithms")]
    pub checksum_algorithms: Vec<String>,

    #[serde(rename = "checksum.policy")]
    pub checksum_policy: ChecksumPolicy,

    #[serde(rename = "connector.resumeDownloads")]
    pub resume_downloads: bool,

    #[serde(rename = "connector.parallelPut")]
    pub parallel_put: u32,

    #[serde(rename = "artifactDescriptor.ignoreInvalid")]
    pub descriptor_ignore_invalid: bool,

    #[serde(rename = "artifactDescriptor.ignoreMissing")]
    pub descriptor_ignore_missing: bool,

    #[serde(rename = "syncContext.factory")]
    pub sync_context_factory: String,

    #[serde(rename = "connector.http")]
    pub http: HttpConfig,

    pub local_repository: PathBuf,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            checksum_algorithms: vec!["SHA-256".to_string(), "SHA-1".to_string()],
            checksum_policy: ChecksumPolicy::default(),
            resume_downloads: true,
            parallel_put: 4,
            descriptor_ignore_invalid: false,
            descriptor_ignore_missing: false,
            sync_context_factory: "in-process".to_string(),
            http: HttpConfig::default(),
            local_repository: dirs_path().join("repository"),
        }
    }
}

/// Transport-scoped HTTP settings (`connector.http.*`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub headers: std::collections::BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "resolver-maven/0.1".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
            headers: Default::default(),
        }
    }
}

/// The resolver's data directory (`~/.m2-rs/`).
pub fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".m2-rs")
}

impl ResolverConfig {
    /// Load from a TOML file (a `[aether]` table), or defaults if absent.
    pub fn load(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            resolver_util::errors::ResolverError::Generic {
                message: format!("Failed to read resolver config: {e}"),
            }
        })?;
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(default)]
            aether: ResolverConfig,
        }
        let wrapper: Wrapper = toml::from_str(&content).map_err(|e| {
            resolver_util::errors::ResolverError::Generic {
                message: format!("Failed to parse resolver config: {e}"),
            }
        })?;
        Ok(wrapper.aether)
    }

    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = ResolverConfig::default();
        assert_eq!(cfg.checksum_policy, ChecksumPolicy::Fail);
        assert!(cfg.resume_downloads);
        assert_eq!(cfg.checksum_algorithms, vec!["SHA-256", "SHA-1"]);
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let cfg = ResolverConfig::load(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert_eq!(cfg.parallel_put, 4);
    }

    #[test]
    fn load_parses_aether_table() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[aether]\n\"checksum.policy\" = \"warn\"\n\"connector.parallelPut\" = 8\n",
        )
        .unwrap();
        let cfg = ResolverConfig::load(tmp.path()).unwrap();
        assert_eq!(cfg.checksum_policy, ChecksumPolicy::Warn);
        assert_eq!(cfg.parallel_put, 8);
    }
}
