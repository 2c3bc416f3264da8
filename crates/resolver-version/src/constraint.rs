//! `VersionConstraint`: either a disjoint set of ranges, or a single bare
//! "recommended" version (spec §3 "VersionConstraint", §4.1 `parseConstraint`).

use resolver_util::errors::ResolverError;

use crate::range::VersionRange;
use crate::version::{parse_version, Version};

/// Either one or more disjoint ranges, or a soft recommendation. Mixing the
/// two forms in a single spec string is rejected.
#[derive(Debug, Clone)]
pub enum VersionConstraint {
    Ranges(Vec<VersionRange>),
    Recommended(Version),
}

impl VersionConstraint {
    /// Parse a comma-separated list of bracketed ranges (`[1,2),(3,]`) or a
    /// single bare recommended version. Top-level commas are those outside
    /// any `[...]`/`(...)` pair, so a range's own internal comma does not
    /// split the list.
    pub fn parse(spec: &str) -> miette::Result<Self> {
        let s = spec.trim();
        if s.is_empty() {
            return Err(ResolverError::ParseError {
                kind: "version constraint",
                input: spec.to_string(),
                reason: "constraint string is empty".to_string(),
            }
            .into());
        }

        let tokens = split_top_level(s);

        if tokens.len() == 1 && VersionRange::parse(&tokens[0])?.is_none() {
            return Ok(VersionConstraint::Recommended(parse_version(&tokens[0])?));
        }

        let mut ranges = Vec::with_capacity(tokens.len());
        for token in &tokens {
            match VersionRange::parse(token)? {
                Some(range) => ranges.push(range),
                None => {
                    return Err(ResolverError::ParseError {
                        kind: "version constraint",
                        input: spec.to_string(),
                        reason: format!(
                            "cannot mix a bare recommended version ({token:?}) with bracketed ranges"
                        ),
                    }
                    .into());
                }
            }
        }
        Ok(VersionConstraint::Ranges(ranges))
    }

    /// Range-disjunction, or equality against the recommended version when
    /// there are no ranges.
    pub fn contains_version(&self, version: &Version) -> bool {
        match self {
            VersionConstraint::Ranges(ranges) => ranges.iter().any(|r| r.contains(version)),
            VersionConstraint::Recommended(v) => v == version,
        }
    }

    pub fn is_recommendation(&self) -> bool {
        matches!(self, VersionConstraint::Recommended(_))
    }
}

/// Split on commas outside of any bracket nesting.
fn split_top_level(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            ',' if depth == 0 => {
                tokens.push(s[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    tokens.push(s[start..].trim().to_string());
    tokens
}
