//! POM file parsing: dependency declarations, parent inheritance, property
//! interpolation, BOM imports, relocations, and the `ArtifactDescriptorReader`
//! that fetches and resolves POMs (including parent recursion) over a
//! `Transporter`.

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use std::sync::Arc;

use resolver_model::coordinate::Artifact;
use resolver_model::descriptor::{ArtifactDescriptor, ArtifactDescriptorReader, BoxFuture};
use resolver_model::dependency::{Dependency, Exclusion, Scope};
use resolver_util::errors::ResolverError;

use crate::cache::{ArtifactOrigin, LocalRepositoryManager};
use crate::repository::{Maven2Layout, RemoteRepository, RepositoryLayout};
use crate::sync::{InProcessSyncContextFactory, LockKey, SyncContextFactory};
use crate::transport::{build_transporter, ConsoleTransportListener};

/// A parsed POM (Project Object Model) file.
#[derive(Debug, Clone, Default)]
pub struct Pom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,

    pub parent: Option<ParentRef>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<PomDependency>,
    pub dependency_management: Vec<PomDependency>,
    pub modules: Vec<String>,
    pub licenses: Vec<PomLicense>,
    /// `<distributionManagement><relocation>`: this artifact has moved to
    /// another coordinate (spec §4.2 step 6 "Chase relocations"). Any field
    /// left unset inherits from this POM's own coordinate.
    pub relocation: Option<Relocation>,
}

/// A `<distributionManagement><relocation>` declaration.
#[derive(Debug, Clone, Default)]
pub struct Relocation {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
}

/// Reference to a parent POM.
#[derive(Debug, Clone)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub relative_path: Option<String>,
}

/// A dependency declared in a POM file.
#[derive(Debug, Clone)]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub optional: bool,
    pub classifier: Option<String>,
    pub type_: Option<String>,
    pub exclusions: Vec<PomExclusion>,
}

/// An exclusion within a dependency declaration.
#[derive(Debug, Clone)]
pub struct PomExclusion {
    pub group_id: String,
    pub artifact_id: Option<String>,
}

/// A license declared in a POM file.
#[derive(Debug, Clone)]
pub struct PomLicense {
    pub name: Option<String>,
    pub url: Option<String>,
}

impl Pom {
    /// Effective group ID (falls back to parent).
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// Effective version (falls back to parent).
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.version.as_str()))
    }

    /// Resolve `${property}` references in a string using POM properties
    /// and built-in project variables.
    pub fn interpolate(&self, input: &str) -> String {
        let mut result = input.to_string();
        let mut iterations = 0;
        while result.contains("${") && iterations < 20 {
            iterations += 1;
            let mut new = result.clone();
            while let Some(start) = new.find("${") {
                let Some(end) = new[start..].find('}') else {
                    break;
                };
                let key = &new[start + 2..start + end];
                let value = self.resolve_property(key);
                if let Some(val) = value {
                    new = format!("{}{}{}", &new[..start], val, &new[start + end + 1..]);
                } else {
                    break;
                }
            }
            if new == result {
                break;
            }
            result = new;
        }
        result
    }

    fn resolve_property(&self, key: &str) -> Option<String> {
        match key {
            "project.groupId" | "pom.groupId" => self.effective_group_id().map(|s| s.to_string()),
            "project.artifactId" | "pom.artifactId" => self.artifact_id.clone(),
            "project.version" | "pom.version" => self.effective_version().map(|s| s.to_string()),
            "project.packaging" | "pom.packaging" => self.packaging.clone(),
            "project.parent.groupId" => self.parent.as_ref().map(|p| p.group_id.clone()),
            "project.parent.version" => self.parent.as_ref().map(|p| p.version.clone()),
            _ => self.properties.get(key).cloned(),
        }
    }

    /// Interpolate all property references in dependencies and dependency management.
    pub fn resolve_properties(&mut self) {
        let pom_snapshot = self.clone();
        for dep in &mut self.dependencies {
            dep.group_id = pom_snapshot.interpolate(&dep.group_id);
            dep.artifact_id = pom_snapshot.interpolate(&dep.artifact_id);
            if let Some(ref v) = dep.version {
                dep.version = Some(pom_snapshot.interpolate(v));
            }
        }
        for dep in &mut self.dependency_management {
            dep.group_id = pom_snapshot.interpolate(&dep.group_id);
            dep.artifact_id = pom_snapshot.interpolate(&dep.artifact_id);
            if let Some(ref v) = dep.version {
                dep.version = Some(pom_snapshot.interpolate(v));
            }
        }
    }

    /// Merge a parent POM's properties and dependency management into this POM.
    pub fn apply_parent(&mut self, parent: &Pom) {
        for (k, v) in &parent.properties {
            self.properties
                .entry(k.clone())
                .or_insert_with(|| v.clone());
        }
        if self.group_id.is_none() {
            self.group_id = parent.effective_group_id().map(|s| s.to_string());
        }
        if self.version.is_none() {
            self.version = parent.effective_version().map(|s| s.to_string());
        }
        for dm in &parent.dependency_management {
            let dominated = self
                .dependency_management
                .iter()
                .any(|d| d.group_id == dm.group_id && d.artifact_id == dm.artifact_id);
            if !dominated {
                self.dependency_management.push(dm.clone());
            }
        }
    }

    /// Look up a version from dependency management for a given group:artifact.
    pub fn managed_version(&self, group_id: &str, artifact_id: &str) -> Option<&str> {
        self.dependency_management
            .iter()
            .find(|d| d.group_id == group_id && d.artifact_id == artifact_id)
            .and_then(|d| d.version.as_deref())
    }

    /// Return BOM imports from dependency management
    /// (entries with `scope = "import"` and `type = "pom"`).
    pub fn bom_imports(&self) -> Vec<&PomDependency> {
        self.dependency_management
            .iter()
            .filter(|d| {
                d.scope.as_deref() == Some("import") && d.type_.as_deref().unwrap_or("jar") == "pom"
            })
            .collect()
    }

    /// The coordinate this POM relocates to, with unset fields inheriting
    /// from `self`'s own effective coordinate. `None` if no relocation is
    /// declared.
    pub fn relocated_artifact(&self) -> Option<Artifact> {
        let relocation = self.relocation.as_ref()?;
        let group_id = relocation
            .group_id
            .clone()
            .or_else(|| self.effective_group_id().map(str::to_string))?;
        let artifact_id = relocation
            .artifact_id
            .clone()
            .or_else(|| self.artifact_id.clone())?;
        let version = relocation
            .version
            .clone()
            .or_else(|| self.effective_version().map(str::to_string))?;
        Some(Artifact::new(group_id, artifact_id, version))
    }

    /// Build the `ArtifactDescriptor` the collector consumes: direct
    /// dependencies, dependency management (with BOM imports already merged
    /// in by the caller via `apply_parent`/import resolution), and any
    /// relocation.
    pub fn to_descriptor(&self, artifact: &Artifact) -> ArtifactDescriptor {
        ArtifactDescriptor {
            artifact: Some(artifact.clone()),
            dependencies: self.dependencies.iter().map(PomDependency::to_dependency).collect(),
            managed_dependencies: self
                .dependency_management
                .iter()
                .filter(|d| d.scope.as_deref() != Some("import"))
                .map(PomDependency::to_dependency)
                .collect(),
            relocations: self.relocated_artifact().into_iter().collect(),
            aliases: Vec::new(),
            repositories: Vec::new(),
        }
    }
}

impl PomDependency {
    fn to_dependency(&self) -> Dependency {
        let scope = self
            .scope
            .as_deref()
            .map(Scope::from)
            .unwrap_or_else(Scope::compile);
        let artifact = Artifact::new(
            self.group_id.clone(),
            self.artifact_id.clone(),
            self.version.clone().unwrap_or_default(),
        );
        let artifact = match (&self.type_, &self.classifier) {
            (Some(t), Some(c)) => artifact.with_extension(t.clone()).with_classifier(c.clone()),
            (Some(t), None) => artifact.with_extension(t.clone()),
            (None, Some(c)) => artifact.with_classifier(c.clone()),
            (None, None) => artifact,
        };
        let exclusions: std::collections::BTreeSet<Exclusion> = self
            .exclusions
            .iter()
            .map(|e| Exclusion::new(e.group_id.clone(), e.artifact_id.clone().unwrap_or_else(|| "*".to_string())))
            .collect();
        Dependency::new(artifact, scope)
            .optional(self.optional)
            .with_exclusions(exclusions)
    }
}

/// Fetches and parses POMs over a [`crate::transport::Transporter`],
/// recursively resolving parent POMs, for use as the collector's
/// `ArtifactDescriptorReader`. Consults the local repository before going to
/// the network, and installs what it fetches back into it under a sync
/// context lock so concurrent resolutions don't race on the same file
/// (spec §4.8 "any write must be protected by a sync-context lock").
pub struct MavenDescriptorReader {
    repositories: Vec<RemoteRepository>,
    local_repository: Option<Arc<LocalRepositoryManager>>,
    sync_contexts: Arc<dyn SyncContextFactory>,
}

impl MavenDescriptorReader {
    pub fn new(repositories: Vec<RemoteRepository>) -> Self {
        Self {
            repositories,
            local_repository: None,
            sync_contexts: Arc::new(InProcessSyncContextFactory::new()),
        }
    }

    /// Cache fetched POMs in `local_repository` and consult it before
    /// contacting any remote repository.
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

    /// Resolve one POM, preferring the local repository's cache and falling
    /// back to the remote repository list under an exclusive sync-context
    /// lock so a fetch-then-install pair never races with another thread's.
    async fn fetch_pom(&self, artifact: &Artifact) -> miette::Result<Option<Pom>> {
        if let Some(local) = &self.local_repository {
            if let Some(pom) = local.get_pom(artifact) {
                return Ok(Some(pom));
            }
        }

        let pom_coordinate = artifact.clone().with_extension("pom").with_classifier("");
        let path = Maven2Layout.artifact_path(&pom_coordinate);
        let lock_key = LockKey::artifact(pom_coordinate.to_string());
        let mut sync = self.sync_contexts.acquire(&[lock_key], &[], true);

        for repo in &self.repositories {
            let transporter = build_transporter(repo)?;
            if let Some(bytes) = transporter.get(&path, &ConsoleTransportListener).await? {
                let xml = String::from_utf8_lossy(&bytes).into_owned();
                let pom = parse_pom(&xml)?;
                if let Some(local) = &self.local_repository {
                    local.put_pom(artifact, ArtifactOrigin::Cached, &xml, &repo.id)?;
                }
                sync.close();
                return Ok(Some(pom));
            }
        }
        sync.close();
        Ok(None)
    }

    /// Fetch and parse a POM, folding in every ancestor's properties and
    /// dependency management via `apply_parent`, following `<parent>` up to
    /// a configurable depth to guard against a cyclic relativePath chain.
    async fn resolve_effective_pom(&self, artifact: &Artifact) -> miette::Result<Pom> {
        let mut chain = Vec::new();
        let mut current = artifact.clone();
        for _ in 0..16 {
            let Some(pom) = self.fetch_pom(&current).await? else {
                return Err(ResolverError::DescriptorError {
                    coordinate: artifact.to_string(),
                    reason: format!("POM not found for {current}"),
                }
                .into());
            };
            let parent = pom.parent.clone();
            chain.push(pom);
            match parent {
                Some(p) => current = Artifact::new(p.group_id, p.artifact_id, p.version),
                None => break,
            }
        }

        let mut iter = chain.into_iter().rev();
        let mut effective = iter.next().unwrap_or_default();
        for child in iter {
            let mut child = child;
            child.apply_parent(&effective);
            effective = child;
        }
        effective.resolve_properties();
        Ok(effective)
    }
}

impl ArtifactDescriptorReader for MavenDescriptorReader {
    fn read<'a>(&'a self, artifact: &'a Artifact) -> BoxFuture<'a, miette::Result<ArtifactDescriptor>> {
        Box::pin(async move {
            let pom = self.resolve_effective_pom(artifact).await?;
            Ok(pom.to_descriptor(artifact))
        })
    }
}

/// Parse a POM XML string into a `Pom` struct.
pub fn parse_pom(xml: &str) -> miette::Result<Pom> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pom = Pom::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    // Temporary accumulators for nested elements
    let mut current_dep: Option<PomDependency> = None;
    let mut current_exclusion: Option<PomExclusion> = None;
    let mut current_parent: Option<ParentRef> = None;
    let mut current_license: Option<PomLicense> = None;
    let mut current_relocation: Option<Relocation> = None;
    let mut in_dep_mgmt = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                path.push(tag.clone());
                text_buf.clear();

                let depth = path.len();
                let ctx = path_context(&path);

                match ctx.as_str() {
                    "project>dependencyManagement>dependencies>dependency"
                    | "project>dependencies>dependency" => {
                        if ctx.contains("dependencyManagement") {
                            in_dep_mgmt = true;
                        }
                        current_dep = Some(PomDependency {
                            group_id: String::new(),
                            artifact_id: String::new(),
                            version: None,
                            scope: None,
                            optional: false,
                            classifier: None,
                            type_: None,
                            exclusions: Vec::new(),
                        });
                    }
                    _ if ctx.ends_with(">exclusion") && current_dep.is_some() => {
                        current_exclusion = Some(PomExclusion {
                            group_id: String::new(),
                            artifact_id: None,
                        });
                    }
                    "project>parent" => {
                        current_parent = Some(ParentRef {
                            group_id: String::new(),
                            artifact_id: String::new(),
                            version: String::new(),
                            relative_path: None,
                        });
                    }
                    "project>licenses>license" => {
                        current_license = Some(PomLicense {
                            name: None,
                            url: None,
                        });
                    }
                    "project>distributionManagement>relocation" => {
                        current_relocation = Some(Relocation::default());
                    }
                    _ => {
                        // properties are children of <project><properties>
                        if depth == 3 && path.get(1).map(|s| s.as_str()) == Some("properties") {
                            // will capture text in End handler
                        }
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(ref e)) => {
                let _tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let ctx = path_context(&path);
                let depth = path.len();

                // Properties: <project><properties><key>value</key></properties>
                if depth == 3 && path.get(1).map(|s| s.as_str()) == Some("properties") {
                    let prop_name = path.last().cloned().unwrap_or_default();
                    pom.properties.insert(prop_name, text_buf.clone());
                }

                // Handle dependency fields
                if let Some(ref mut dep) = current_dep {
                    if let Some(ref mut excl) = current_exclusion {
                        match path.last().map(|s| s.as_str()) {
                            Some("groupId") => excl.group_id = text_buf.clone(),
                            Some("artifactId") => excl.artifact_id = Some(text_buf.clone()),
                            _ => {}
                        }
                        if ctx.ends_with(">exclusion") {
                            if let Some(excl) = current_exclusion.take() {
                                dep.exclusions.push(excl);
                            }
                        }
                    } else {
                        match path.last().map(|s| s.as_str()) {
                            Some("groupId") if ctx.ends_with(">dependency>groupId") => {
                                dep.group_id = text_buf.clone();
                            }
                            Some("artifactId") if ctx.ends_with(">dependency>artifactId") => {
                                dep.artifact_id = text_buf.clone();
                            }
                            Some("version") if ctx.ends_with(">dependency>version") => {
                                dep.version = Some(text_buf.clone());
                            }
                            Some("scope") if ctx.ends_with(">dependency>scope") => {
                                dep.scope = Some(text_buf.clone());
                            }
                            Some("optional") if ctx.ends_with(">dependency>optional") => {
                                dep.optional = text_buf.trim() == "true";
                            }
                            Some("classifier") if ctx.ends_with(">dependency>classifier") => {
                                dep.classifier = Some(text_buf.clone());
                            }
                            Some("type") if ctx.ends_with(">dependency>type") => {
                                dep.type_ = Some(text_buf.clone());
                            }
                            _ => {}
                        }
                    }

                    if ctx == "project>dependencies>dependency"
                        || ctx == "project>dependencyManagement>dependencies>dependency"
                    {
                        if let Some(dep) = current_dep.take() {
                            if in_dep_mgmt {
                                pom.dependency_management.push(dep);
                            } else {
                                pom.dependencies.push(dep);
                            }
                        }
                        in_dep_mgmt = false;
                    }
                }

                // Handle parent fields
                if let Some(ref mut parent) = current_parent {
                    match path.last().map(|s| s.as_str()) {
                        Some("groupId") if ctx == "project>parent>groupId" => {
                            parent.group_id = text_buf.clone();
                        }
                        Some("artifactId") if ctx == "project>parent>artifactId" => {
                            parent.artifact_id = text_buf.clone();
                        }
                        Some("version") if ctx == "project>parent>version" => {
                            parent.version = text_buf.clone();
                        }
                        Some("relativePath") if ctx == "project>parent>relativePath" => {
                            parent.relative_path = Some(text_buf.clone());
                        }
                        _ => {}
                    }
                    if ctx == "project>parent" {
                        pom.parent = current_parent.take();
                    }
                }

                // Handle license fields
                if let Some(ref mut license) = current_license {
                    match path.last().map(|s| s.as_str()) {
                        Some("name") if ctx == "project>licenses>license>name" => {
                            license.name = Some(text_buf.clone());
                        }
                        Some("url") if ctx == "project>licenses>license>url" => {
                            license.url = Some(text_buf.clone());
                        }
                        _ => {}
                    }
                    if ctx == "project>licenses>license" {
                        if let Some(lic) = current_license.take() {
                            pom.licenses.push(lic);
                        }
                    }
                }

                // Handle relocation fields
                if let Some(ref mut relocation) = current_relocation {
                    match path.last().map(|s| s.as_str()) {
                        Some("groupId")
                            if ctx == "project>distributionManagement>relocation>groupId" =>
                        {
                            relocation.group_id = Some(text_buf.clone());
                        }
                        Some("artifactId")
                            if ctx == "project>distributionManagement>relocation>artifactId" =>
                        {
                            relocation.artifact_id = Some(text_buf.clone());
                        }
                        Some("version")
                            if ctx == "project>distributionManagement>relocation>version" =>
                        {
                            relocation.version = Some(text_buf.clone());
                        }
                        _ => {}
                    }
                    if ctx == "project>distributionManagement>relocation" {
                        pom.relocation = current_relocation.take();
                    }
                }

                // Top-level project fields
                if depth == 2 {
                    match path.last().map(|s| s.as_str()) {
                        Some("groupId") => pom.group_id = Some(text_buf.clone()),
                        Some("artifactId") => pom.artifact_id = Some(text_buf.clone()),
                        Some("version") => pom.version = Some(text_buf.clone()),
                        Some("packaging") => pom.packaging = Some(text_buf.clone()),
                        Some("name") => pom.name = Some(text_buf.clone()),
                        Some("description") => pom.description = Some(text_buf.clone()),
                        _ => {}
                    }
                }

                // Modules
                if ctx == "project>modules>module" {
                    pom.modules.push(text_buf.clone());
                }

                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(resolver_util::errors::ResolverError::Generic {
                    message: format!("Failed to parse POM XML: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    Ok(pom)
}

/// Build a context string from the current XML path for matching.
fn path_context(path: &[String]) -> String {
    path.join(">")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <groupId>org.example</groupId>
    <artifactId>my-lib</artifactId>
    <version>1.0.0</version>
    <packaging>jar</packaging>

    <properties>
        <kotlin.version>2.3.0</kotlin.version>
    </properties>

    <dependencies>
        <dependency>
            <groupId>org.jetbrains.kotlin</groupId>
            <artifactId>kotlin-stdlib</artifactId>
            <version>${kotlin.version}</version>
        </dependency>
        <dependency>
            <groupId>junit</groupId>
            <artifactId>junit</artifactId>
            <version>4.13.2</version>
            <scope>test</scope>
        </dependency>
    </dependencies>
</project>"#;

    #[test]
    fn parse_simple_pom() {
        let pom = parse_pom(SIMPLE_POM).unwrap();
        assert_eq!(pom.group_id.as_deref(), Some("org.example"));
        assert_eq!(pom.artifact_id.as_deref(), Some("my-lib"));
        assert_eq!(pom.version.as_deref(), Some("1.0.0"));
        assert_eq!(pom.packaging.as_deref(), Some("jar"));
        assert_eq!(pom.dependencies.len(), 2);
        assert_eq!(pom.properties.get("kotlin.version").unwrap(), "2.3.0");
    }

    #[test]
    fn property_interpolation() {
        let mut pom = parse_pom(SIMPLE_POM).unwrap();
        pom.resolve_properties();
        assert_eq!(pom.dependencies[0].version.as_deref(), Some("2.3.0"));
    }

    #[test]
    fn test_scope_parsing() {
        let pom = parse_pom(SIMPLE_POM).unwrap();
        assert_eq!(pom.dependencies[0].scope, None);
        assert_eq!(pom.dependencies[1].scope.as_deref(), Some("test"));
    }

    #[test]
    fn dependency_management_and_bom() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>parent</artifactId>
    <version>1.0.0</version>

    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>org.jetbrains.kotlinx</groupId>
                <artifactId>kotlinx-coroutines-bom</artifactId>
                <version>1.8.0</version>
                <type>pom</type>
                <scope>import</scope>
            </dependency>
            <dependency>
                <groupId>com.google.guava</groupId>
                <artifactId>guava</artifactId>
                <version>32.0.0-jre</version>
            </dependency>
        </dependencies>
    </dependencyManagement>
</project>"#;
        let pom = parse_pom(xml).unwrap();
        assert_eq!(pom.dependency_management.len(), 2);
        let boms = pom.bom_imports();
        assert_eq!(boms.len(), 1);
        assert_eq!(boms[0].artifact_id, "kotlinx-coroutines-bom");

        assert_eq!(
            pom.managed_version("com.google.guava", "guava"),
            Some("32.0.0-jre")
        );
    }

    #[test]
    fn parent_ref_parsing() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <parent>
        <groupId>org.example</groupId>
        <artifactId>parent-pom</artifactId>
        <version>2.0.0</version>
    </parent>
    <artifactId>child</artifactId>
</project>"#;
        let pom = parse_pom(xml).unwrap();
        assert!(pom.parent.is_some());
        assert_eq!(pom.effective_group_id(), Some("org.example"));
        assert_eq!(pom.effective_version(), Some("2.0.0"));
        let p = pom.parent.as_ref().unwrap();
        assert_eq!(p.group_id, "org.example");
        assert_eq!(p.version, "2.0.0");
    }

    #[test]
    fn exclusion_parsing() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>app</artifactId>
    <version>1.0</version>
    <dependencies>
        <dependency>
            <groupId>com.example</groupId>
            <artifactId>lib</artifactId>
            <version>1.0</version>
            <exclusions>
                <exclusion>
                    <groupId>commons-logging</groupId>
                    <artifactId>commons-logging</artifactId>
                </exclusion>
            </exclusions>
        </dependency>
    </dependencies>
</project>"#;
        let pom = parse_pom(xml).unwrap();
        assert_eq!(pom.dependencies[0].exclusions.len(), 1);
        assert_eq!(
            pom.dependencies[0].exclusions[0].group_id,
            "commons-logging"
        );
    }

    #[test]
    fn license_parsing() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>app</artifactId>
    <version>1.0</version>
    <licenses>
        <license>
            <name>Apache-2.0</name>
            <url>https://www.apache.org/licenses/LICENSE-2.0</url>
        </license>
    </licenses>
</project>"#;
        let pom = parse_pom(xml).unwrap();
        assert_eq!(pom.licenses.len(), 1);
        assert_eq!(pom.licenses[0].name.as_deref(), Some("Apache-2.0"));
    }

    #[test]
    fn project_version_interpolation() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>lib</artifactId>
    <version>3.0.0</version>
    <dependencies>
        <dependency>
            <groupId>${project.groupId}</groupId>
            <artifactId>sibling</artifactId>
            <version>${project.version}</version>
        </dependency>
    </dependencies>
</project>"#;
        let mut pom = parse_pom(xml).unwrap();
        pom.resolve_properties();
        assert_eq!(pom.dependencies[0].group_id, "org.example");
        assert_eq!(pom.dependencies[0].version.as_deref(), Some("3.0.0"));
    }

    #[test]
    fn relocation_parsing() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>commons-logging</groupId>
    <artifactId>commons-logging</artifactId>
    <version>1.2</version>
    <distributionManagement>
        <relocation>
            <groupId>org.apache.commons</groupId>
            <artifactId>commons-logging</artifactId>
            <version>1.2</version>
        </relocation>
    </distributionManagement>
</project>"#;
        let pom = parse_pom(xml).unwrap();
        let relocated = pom.relocated_artifact().unwrap();
        assert_eq!(relocated.group_id, "org.apache.commons");
        assert_eq!(relocated.artifact_id, "commons-logging");
        assert_eq!(relocated.version, "1.2");
    }

    #[test]
    fn relocation_inherits_unset_fields_from_own_coordinate() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>old-name</artifactId>
    <version>2.0</version>
    <distributionManagement>
        <relocation>
            <artifactId>new-name</artifactId>
        </relocation>
    </distributionManagement>
</project>"#;
        let pom = parse_pom(xml).unwrap();
        let relocated = pom.relocated_artifact().unwrap();
        assert_eq!(relocated.group_id, "org.example");
        assert_eq!(relocated.artifact_id, "new-name");
        assert_eq!(relocated.version, "2.0");
    }

    #[test]
    fn no_relocation_returns_none() {
        let pom = parse_pom(SIMPLE_POM).unwrap();
        assert!(pom.relocated_artifact().is_none());
    }

    #[test]
    fn to_descriptor_maps_dependencies_and_excludes_import_scope_from_managed() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>app</artifactId>
    <version>1.0</version>
    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>org.jetbrains.kotlinx</groupId>
                <artifactId>kotlinx-coroutines-bom</artifactId>
                <version>1.8.0</version>
                <type>pom</type>
                <scope>import</scope>
            </dependency>
            <dependency>
                <groupId>com.google.guava</groupId>
                <artifactId>guava</artifactId>
                <version>32.0.0-jre</version>
            </dependency>
        </dependencies>
    </dependencyManagement>
    <dependencies>
        <dependency>
            <groupId>com.google.guava</groupId>
            <artifactId>guava</artifactId>
            <version>32.0.0-jre</version>
            <scope>runtime</scope>
        </dependency>
    </dependencies>
</project>"#;
        let pom = parse_pom(xml).unwrap();
        let artifact = Artifact::new("org.example", "app", "1.0");
        let descriptor = pom.to_descriptor(&artifact);

        assert_eq!(descriptor.dependencies.len(), 1);
        assert_eq!(descriptor.dependencies[0].scope.as_str(), "runtime");
        assert_eq!(descriptor.managed_dependencies.len(), 1);
        assert_eq!(descriptor.managed_dependencies[0].artifact.artifact_id, "guava");
        assert!(descriptor.relocations.is_empty());
    }

    #[tokio::test]
    async fn maven_descriptor_reader_folds_in_parent_properties() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = Maven2Layout;

        let parent_xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>parent</artifactId>
    <version>1.0</version>
    <properties><lib.version>2.3.0</lib.version></properties>
</project>"#;
        let parent_artifact = Artifact::new("org.example", "parent", "1.0").with_extension("pom");
        let parent_path = tmp.path().join(layout.artifact_path(&parent_artifact));
        std::fs::create_dir_all(parent_path.parent().unwrap()).unwrap();
        std::fs::write(&parent_path, parent_xml).unwrap();

        let child_xml = r#"<?xml version="1.0"?>
<project>
    <parent>
        <groupId>org.example</groupId>
        <artifactId>parent</artifactId>
        <version>1.0</version>
    </parent>
    <artifactId>child</artifactId>
    <version>1.0</version>
    <dependencies>
        <dependency>
            <groupId>org.jetbrains.kotlin</groupId>
            <artifactId>kotlin-stdlib</artifactId>
            <version>${lib.version}</version>
        </dependency>
    </dependencies>
</project>"#;
        let child_artifact = Artifact::new("org.example", "child", "1.0").with_extension("pom");
        let child_path = tmp.path().join(layout.artifact_path(&child_artifact));
        std::fs::create_dir_all(child_path.parent().unwrap()).unwrap();
        std::fs::write(&child_path, child_xml).unwrap();

        let repo = RemoteRepository::new("local", format!("file://{}", tmp.path().display()));
        let reader = MavenDescriptorReader::new(vec![repo]);
        let artifact = Artifact::new("org.example", "child", "1.0");
        let descriptor = reader.read(&artifact).await.unwrap();

        assert_eq!(descriptor.dependencies.len(), 1);
        assert_eq!(descriptor.dependencies[0].artifact.version, "2.3.0");
    }

    #[tokio::test]
    async fn maven_descriptor_reader_reports_missing_pom() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = RemoteRepository::new("local", format!("file://{}", tmp.path().display()));
        let reader = MavenDescriptorReader::new(vec![repo]);
        let artifact = Artifact::new("org.example", "missing", "1.0");
        let result = reader.read(&artifact).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn maven_descriptor_reader_installs_fetched_pom_into_local_repository() {
        let remote = tempfile::tempdir().unwrap();
        let local_root = tempfile::tempdir().unwrap();
        let layout = Maven2Layout;

        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>lib</artifactId>
    <version>1.0</version>
</project>"#;
        let pom_artifact = Artifact::new("org.example", "lib", "1.0").with_extension("pom");
        let path = remote.path().join(layout.artifact_path(&pom_artifact));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, xml).unwrap();

        let repo = RemoteRepository::new("central", format!("file://{}", remote.path().display()));
        let local_repository = Arc::new(LocalRepositoryManager::new(local_root.path()));
        let reader = MavenDescriptorReader::new(vec![repo]).with_local_repository(local_repository.clone());

        let artifact = Artifact::new("org.example", "lib", "1.0");
        let descriptor = reader.read(&artifact).await.unwrap();
        assert_eq!(descriptor.artifact.unwrap(), artifact.clone());
        assert!(local_repository.get_pom(&artifact).is_some());
    }

    #[tokio::test]
    async fn maven_descriptor_reader_prefers_local_repository_over_remote() {
        let remote = tempfile::tempdir().unwrap();
        let local_root = tempfile::tempdir().unwrap();

        // No POM published remotely; if the reader skipped the local cache
        // it would fail to find anything.
        let repo = RemoteRepository::new("central", format!("file://{}", remote.path().display()));
        let local_repository = Arc::new(LocalRepositoryManager::new(local_root.path()));
        let artifact = Artifact::new("org.example", "lib", "1.0");

        let cached_xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>lib</artifactId>
    <version>1.0</version>
    <dependencies>
        <dependency>
            <groupId>org.example</groupId>
            <artifactId>leaf</artifactId>
            <version>2.0</version>
        </dependency>
    </dependencies>
</project>"#;
        local_repository
            .put_pom(&artifact, ArtifactOrigin::Cached, cached_xml, "central")
            .unwrap();

        let reader = MavenDescriptorReader::new(vec![repo]).with_local_repository(local_repository);
        let descriptor = reader.read(&artifact).await.unwrap();
        assert_eq!(descriptor.dependencies.len(), 1);
        assert_eq!(descriptor.dependencies[0].artifact.artifact_id, "leaf");
    }
}
