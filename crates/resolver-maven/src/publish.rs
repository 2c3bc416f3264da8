//! Deploying artifacts to a remote repository (spec §4.7 "Uploads reverse
//! the flow"): the POM and the primary artifact (plus any extra attached
//! files, e.g. a `-sources.jar`), each followed by its checksum sidecars.

use resolver_model::coordinate::Artifact;
use resolver_util::errors::ResolverError;

use crate::connector::RepositoryConnector;

/// One file to deploy alongside an artifact's coordinate, e.g. a classifier
/// jar or an attached `.asc` signature.
pub struct DeployedFile {
    pub artifact: Artifact,
    pub data: Vec<u8>,
}

/// Deploy a POM and its artifact (plus any extra attachments) to the
/// connector's first configured repository. Stops at the first failure;
/// callers get a `DeploymentError` naming which coordinate failed.
pub async fn deploy_artifact(
    connector: &RepositoryConnector,
    pom_artifact: &Artifact,
    pom_xml: &str,
    primary: &Artifact,
    primary_data: &[u8],
    attachments: &[DeployedFile],
) -> miette::Result<()> {
    connector
        .put_artifact(pom_artifact, pom_xml.as_bytes())
        .await
        .map_err(|e| ResolverError::DeploymentError {
            coordinate: pom_artifact.to_string(),
            repository_id: "unknown".to_string(),
            reason: e.to_string(),
        })?;

    connector
        .put_artifact(primary, primary_data)
        .await
        .map_err(|e| ResolverError::DeploymentError {
            coordinate: primary.to_string(),
            repository_id: "unknown".to_string(),
            reason: e.to_string(),
        })?;

    for file in attachments {
        connector
            .put_artifact(&file.artifact, &file.data)
            .await
            .map_err(|e| ResolverError::DeploymentError {
                coordinate: file.artifact.to_string(),
                repository_id: "unknown".to_string(),
                reason: e.to_string(),
            })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RemoteRepository;

    #[tokio::test]
    async fn deploy_artifact_writes_pom_primary_and_attachments() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = RemoteRepository::new("local", format!("file://{}", tmp.path().display()));
        let connector = RepositoryConnector::new(vec![repo]);

        let pom_artifact = Artifact::new("org.example", "lib", "1.0").with_extension("pom");
        let primary = Artifact::new("org.example", "lib", "1.0");
        let sources = Artifact::new("org.example", "lib", "1.0").with_classifier("sources");

        deploy_artifact(
            &connector,
            &pom_artifact,
            "<project/>",
            &primary,
            b"jar bytes",
            &[DeployedFile {
                artifact: sources.clone(),
                data: b"sources bytes".to_vec(),
            }],
        )
        .await
        .unwrap();

        use crate::repository::{Maven2Layout, RepositoryLayout};
        let layout = Maven2Layout;
        assert!(tmp.path().join(layout.artifact_path(&pom_artifact)).is_file());
        assert!(tmp.path().join(layout.artifact_path(&primary)).is_file());
        assert!(tmp.path().join(layout.artifact_path(&sources)).is_file());
    }

    #[tokio::test]
    async fn deploy_artifact_fails_with_no_repository_configured() {
        let connector = RepositoryConnector::new(vec![]);
        let pom_artifact = Artifact::new("org.example", "lib", "1.0").with_extension("pom");
        let primary = Artifact::new("org.example", "lib", "1.0");

        let result = deploy_artifact(&connector, &pom_artifact, "<project/>", &primary, b"x", &[]).await;
        assert!(result.is_err());
    }
}
