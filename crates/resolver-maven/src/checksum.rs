//! Artifact checksum verification (SHA-1, SHA-256, MD5) under a
//! [`ChecksumPolicy`] (spec §4.5, §4.7).

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use resolver_util::errors::ResolverError;

use crate::config::ChecksumPolicy;
use crate::repository::ChecksumLocation;
use crate::transport::{NoopListener, Transporter};

/// Compute the hex digest of `data` for one of the supported algorithms.
/// Returns `None` for an unrecognized algorithm name.
pub fn digest_hex(algorithm: &str, data: &[u8]) -> Option<String> {
    match algorithm.to_ascii_uppercase().as_str() {
        "SHA-256" | "SHA256" => Some(hex_sha256(data)),
        "SHA-1" | "SHA1" => Some(hex_sha1(data)),
        "MD5" => Some(hex_md5(data)),
        _ => None,
    }
}

fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn hex_sha1(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn hex_md5(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Maven checksum sidecar files may contain just the hash, or
/// `hash  filename`.
pub fn extract_hash(content: &str) -> String {
    content.split_whitespace().next().unwrap_or("").to_string()
}

/// Fetch each checksum location in order until one resolves and compute the
/// matching digest of `data`. Returns `Err(ChecksumFailure)` on a mismatch;
/// a completely missing sidecar set is logged and treated as `Ok(())`,
/// matching the reference resolver's behavior of not refusing artifacts
/// that simply predate checksum publication. Callers translate the result
/// per policy with [`apply_policy`].
pub async fn verify(
    transporter: &dyn Transporter,
    locations: &[ChecksumLocation],
    file_label: &str,
    data: &[u8],
) -> miette::Result<()> {
    for location in locations {
        let sidecar = transporter
            .get(&location.relative_uri, &NoopListener)
            .await?;
        let Some(sidecar) = sidecar else {
            continue;
        };
        let expected = extract_hash(&String::from_utf8_lossy(&sidecar));
        let Some(actual) = digest_hex(&location.algorithm, data) else {
            continue;
        };
        if actual.eq_ignore_ascii_case(&expected) {
            tracing::debug!(algorithm = %location.algorithm, file = %file_label, "checksum ok");
            return Ok(());
        }
        return Err(ResolverError::ChecksumFailure {
            file: file_label.to_string(),
            algorithm: location.algorithm.clone(),
            expected,
            actual,
        }
        .into());
    }
    tracing::warn!(file = %file_label, "no checksum sidecar found under any configured algorithm");
    Ok(())
}

/// Apply the outcome of [`verify`] per policy: under `Warn`, a checksum
/// mismatch is downgraded to a logged event instead of a hard failure.
pub fn apply_policy(
    result: miette::Result<()>,
    policy: ChecksumPolicy,
    file_label: &str,
) -> miette::Result<()> {
    match (result, policy) {
        (Ok(()), _) => Ok(()),
        (Err(_), ChecksumPolicy::Ignore) => Ok(()),
        (Err(e), ChecksumPolicy::Warn) => {
            tracing::warn!(file = %file_label, error = %e, "checksum mismatch ignored under warn policy");
            Ok(())
        }
        (Err(e), ChecksumPolicy::Fail) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_hash_simple() {
        assert_eq!(extract_hash("abc123\n"), "abc123");
    }

    #[test]
    fn extract_hash_with_filename() {
        assert_eq!(extract_hash("abc123  my-lib-1.0.jar\n"), "abc123");
    }

    #[test]
    fn sha256_computation() {
        let hash = digest_hex("SHA-256", b"hello world").unwrap();
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde"
        );
    }

    #[test]
    fn md5_computation() {
        let hash = digest_hex("MD5", b"hello world").unwrap();
        assert_eq!(hash, "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn digest_hex_rejects_unknown_algorithm() {
        assert!(digest_hex("CRC32", b"data").is_none());
    }

    #[test]
    fn apply_policy_downgrades_mismatch_under_warn() {
        let err: miette::Result<()> = Err(ResolverError::ChecksumFailure {
            file: "x.jar".into(),
            algorithm: "SHA-1".into(),
            expected: "a".into(),
            actual: "b".into(),
        }
        .into());
        assert!(apply_policy(err, ChecksumPolicy::Warn, "x.jar").is_ok());
    }

    #[test]
    fn apply_policy_propagates_mismatch_under_fail() {
        let err: miette::Result<()> = Err(ResolverError::ChecksumFailure {
            file: "x.jar".into(),
            algorithm: "SHA-1".into(),
            expected: "a".into(),
            actual: "b".into(),
        }
        .into());
        assert!(apply_policy(err, ChecksumPolicy::Fail, "x.jar").is_err());
    }

    #[tokio::test]
    async fn verify_succeeds_with_matching_sidecar() {
        use crate::transport::FileTransporter;
        let tmp = tempfile::tempdir().unwrap();
        let data = b"fake jar bytes";
        std::fs::write(
            tmp.path().join("lib-1.0.jar.sha256"),
            hex_sha256(data),
        )
        .unwrap();
        let transporter = FileTransporter::new(tmp.path().to_path_buf());
        let locations = vec![ChecksumLocation {
            algorithm: "SHA-256".to_string(),
            relative_uri: "lib-1.0.jar.sha256".to_string(),
        }];
        let result = verify(&transporter, &locations, "lib-1.0.jar", data).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn verify_fails_on_mismatch() {
        use crate::transport::FileTransporter;
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("lib-1.0.jar.sha256"), "deadbeef").unwrap();
        let transporter = FileTransporter::new(tmp.path().to_path_buf());
        let locations = vec![ChecksumLocation {
            algorithm: "SHA-256".to_string(),
            relative_uri: "lib-1.0.jar.sha256".to_string(),
        }];
        let result = verify(&transporter, &locations, "lib-1.0.jar", b"fake jar bytes").await;
        assert!(result.is_err());
    }
}
