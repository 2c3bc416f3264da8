//! Resolving a `VersionConstraint` against remote/local metadata to a list
//! of acceptable versions (spec §4.2 step 3 "Version Resolver").

use resolver_model::descriptor::BoxFuture;
use resolver_util::errors::ResolverError;
use resolver_version::{parse_version, Version, VersionConstraint};

/// External collaborator the collector asks for the set of versions a
/// constraint admits, highest first.
pub trait VersionResolver: Send + Sync {
    fn resolve<'a>(
        &'a self,
        group_id: &'a str,
        artifact_id: &'a str,
        constraint: &'a VersionConstraint,
    ) -> BoxFuture<'a, miette::Result<Vec<Version>>>;
}

/// Resolves against `maven-metadata.xml` fetched from an ordered list of
/// remote repositories, merging and de-duplicating the version lists.
pub struct MetadataVersionResolver {
    repositories: Vec<resolver_maven::repository::RemoteRepository>,
}

impl MetadataVersionResolver {
    pub fn new(repositories: Vec<resolver_maven::repository::RemoteRepository>) -> Self {
        Self { repositories }
    }
}

impl VersionResolver for MetadataVersionResolver {
    fn resolve<'a>(
        &'a self,
        group_id: &'a str,
        artifact_id: &'a str,
        constraint: &'a VersionConstraint,
    ) -> BoxFuture<'a, miette::Result<Vec<Version>>> {
        Box::pin(async move {
            if let VersionConstraint::Recommended(v) = constraint {
                return Ok(vec![v.clone()]);
            }

            let mut seen = std::collections::HashSet::new();
            let mut candidates = Vec::new();
            for repo in &self.repositories {
                let Some(meta) =
                    resolver_maven::metadata::fetch_metadata(repo, group_id, artifact_id).await?
                else {
                    continue;
                };
                for raw in meta.versions {
                    if !seen.insert(raw.clone()) {
                        continue;
                    }
                    let v = parse_version(&raw)?;
                    if constraint.contains_version(&v) {
                        candidates.push(v);
                    }
                }
            }

            if candidates.is_empty() {
                return Err(ResolverError::VersionResolutionError {
                    coordinate: format!("{group_id}:{artifact_id}"),
                    reason: "no repository metadata contained a version satisfying the constraint"
                        .to_string(),
                }
                .into());
            }

            candidates.sort_by(|a, b| b.cmp(a));
            Ok(candidates)
        })
    }
}

/// A fixed version list per `group:artifact`, for collector tests that do
/// not want to stand up an on-disk repository.
#[derive(Default)]
pub struct StaticVersionResolver {
    versions: std::collections::HashMap<(String, String), Vec<String>>,
}

impl StaticVersionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_versions(
        mut self,
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        versions: impl IntoIterator<Item = &'static str>,
    ) -> Self {
        self.versions.insert(
            (group_id.into(), artifact_id.into()),
            versions.into_iter().map(str::to_string).collect(),
        );
        self
    }
}

impl VersionResolver for StaticVersionResolver {
    fn resolve<'a>(
        &'a self,
        group_id: &'a str,
        artifact_id: &'a str,
        constraint: &'a VersionConstraint,
    ) -> BoxFuture<'a, miette::Result<Vec<Version>>> {
        Box::pin(async move {
            if let VersionConstraint::Recommended(v) = constraint {
                return Ok(vec![v.clone()]);
            }
            let key = (group_id.to_string(), artifact_id.to_string());
            let mut candidates = Vec::new();
            for raw in self.versions.get(&key).into_iter().flatten() {
                let v = parse_version(raw)?;
                if constraint.contains_version(&v) {
                    candidates.push(v);
                }
            }
            if candidates.is_empty() {
                return Err(ResolverError::VersionResolutionError {
                    coordinate: format!("{group_id}:{artifact_id}"),
                    reason: "no statically registered version satisfies the constraint"
                        .to_string(),
                }
                .into());
            }
            candidates.sort_by(|a, b| b.cmp(a));
            Ok(candidates)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver_version::VersionConstraint;

    #[tokio::test]
    async fn static_resolver_filters_and_sorts_descending() {
        let resolver = StaticVersionResolver::new().with_versions(
            "g",
            "b",
            ["1.0", "1.2", "2.0"],
        );
        let constraint = VersionConstraint::parse("[1,2)").unwrap();
        let versions = resolver.resolve("g", "b", &constraint).await.unwrap();
        let strs: Vec<String> = versions.iter().map(|v| v.original.clone()).collect();
        assert_eq!(strs, vec!["1.2", "1.0"]);
    }

    #[tokio::test]
    async fn static_resolver_fails_when_nothing_matches() {
        let resolver = StaticVersionResolver::new().with_versions("g", "b", ["1.0"]);
        let constraint = VersionConstraint::parse("[2,3)").unwrap();
        assert!(resolver.resolve("g", "b", &constraint).await.is_err());
    }

    #[tokio::test]
    async fn recommended_constraint_resolves_to_itself() {
        let resolver = StaticVersionResolver::new();
        let constraint = VersionConstraint::parse("1.5").unwrap();
        let versions = resolver.resolve("g", "b", &constraint).await.unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].original, "1.5");
    }
}
