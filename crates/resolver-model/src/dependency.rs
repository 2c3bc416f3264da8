//! A dependency as declared by a consumer: an artifact coordinate with a
//! scope, an optionality flag, and a set of transitive exclusions (spec §3).

use std::collections::BTreeSet;
use std::fmt;

use crate::coordinate::Artifact;

/// An opaque dependency-usage tag. The scope algebra itself (compile implies
/// runtime, test is terminal, provided/system do not propagate, ...) is an
/// externally supplied policy — see `resolver_collector::policy::ScopeDeriver`
/// — the core only treats scopes as comparable strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Scope(pub String);

impl Scope {
    pub const COMPILE: &'static str = "compile";
    pub const PROVIDED: &'static str = "provided";
    pub const RUNTIME: &'static str = "runtime";
    pub const TEST: &'static str = "test";
    pub const SYSTEM: &'static str = "system";
    pub const IMPORT: &'static str = "import";

    pub fn compile() -> Self {
        Self(Self::COMPILE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Scope {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Scope {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::compile()
    }
}

/// A `(groupId, artifactId)` pair to exclude from a dependency's transitive
/// closure. `artifact_id = "*"` excludes every artifact in the group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
}

impl Exclusion {
    pub const WILDCARD: &'static str = "*";

    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    pub fn group_wildcard(group_id: impl Into<String>) -> Self {
        Self::new(group_id, Self::WILDCARD)
    }

    /// Whether this exclusion matches the given coordinate.
    pub fn matches(&self, group_id: &str, artifact_id: &str) -> bool {
        self.group_id == group_id
            && (self.artifact_id == Self::WILDCARD || self.artifact_id == artifact_id)
    }
}

/// `(artifact, scope, optional, exclusions)` — spec §3 "Dependency".
#[derive(Debug, Clone)]
pub struct Dependency {
    pub artifact: Artifact,
    pub scope: Scope,
    pub optional: bool,
    pub exclusions: BTreeSet<Exclusion>,
}

impl Dependency {
    pub fn new(artifact: Artifact, scope: Scope) -> Self {
        Self {
            artifact,
            scope,
            optional: false,
            exclusions: BTreeSet::new(),
        }
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_exclusions(mut self, exclusions: impl IntoIterator<Item = Exclusion>) -> Self {
        self.exclusions.extend(exclusions);
        self
    }

    /// Whether this dependency's artifact would be dropped by any exclusion
    /// in `ancestor_exclusions` (the union of every exclusion set declared
    /// by ancestors on the path from the root, per spec §4.2 "Exclusions
    /// propagate").
    pub fn is_excluded_by(&self, ancestor_exclusions: &BTreeSet<Exclusion>) -> bool {
        ancestor_exclusions
            .iter()
            .any(|e| e.matches(&self.artifact.group_id, &self.artifact.artifact_id))
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.artifact, self.scope)?;
        if self.optional {
            write!(f, " optional")?;
        }
        Ok(())
    }
}
