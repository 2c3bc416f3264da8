use resolver_model::coordinate::Artifact;
use resolver_model::dependency::{Dependency, Exclusion, Scope};
use std::collections::BTreeSet;

#[test]
fn dependency_built_from_parsed_coordinate() {
    let artifact = Artifact::parse("com.example:my-lib:1.0.0").unwrap();
    let dep = Dependency::new(artifact, Scope::compile());
    assert_eq!(dep.artifact.group_id, "com.example");
    assert_eq!(dep.artifact.artifact_id, "my-lib");
    assert_eq!(dep.scope.as_str(), "compile");
    assert!(!dep.optional);
}

#[test]
fn dependency_scope_default_is_compile() {
    assert_eq!(Scope::default().as_str(), "compile");
}

#[test]
fn optional_dependency_round_trip() {
    let dep = Dependency::new(Artifact::new("g", "a", "1.0"), Scope::from("runtime")).optional(true);
    assert!(dep.optional);
    assert_eq!(dep.scope.as_str(), "runtime");
}

#[test]
fn dependency_with_exclusions_is_excluded_by_matching_ancestor() {
    let dep = Dependency::new(Artifact::new("org.slf4j", "slf4j-api", "2.0"), Scope::compile())
        .with_exclusions([Exclusion::new("org.slf4j", "slf4j-api")]);
    assert_eq!(dep.exclusions.len(), 1);

    let mut ancestors: BTreeSet<Exclusion> = BTreeSet::new();
    ancestors.insert(Exclusion::group_wildcard("org.slf4j"));
    assert!(dep.is_excluded_by(&ancestors));
}

#[test]
fn dependency_display_includes_optional_marker() {
    let dep = Dependency::new(Artifact::new("g", "a", "1.0"), Scope::compile()).optional(true);
    assert!(dep.to_string().contains("optional"));
}
