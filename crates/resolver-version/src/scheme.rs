//! `VersionScheme`: the per-session entry point for version parsing, with
//! interning so repeated parses of the same string return the same handle
//! (spec §4.1: "a correctness requirement for conflict-id keying efficiency,
//! not a semantic one").

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::constraint::VersionConstraint;
use crate::range::VersionRange;
use crate::version::{parse_version, Version};

/// Thread-safe, per-instance cache from input string to parsed `Version`.
#[derive(Default)]
pub struct VersionScheme {
    interned: Mutex<HashMap<String, Arc<Version>>>,
}

impl VersionScheme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a version, returning the same `Arc` for repeated calls with the
    /// same input string.
    pub fn parse_version(&self, s: &str) -> miette::Result<Arc<Version>> {
        let mut cache = self.interned.lock().unwrap();
        if let Some(v) = cache.get(s) {
            return Ok(v.clone());
        }
        let parsed = Arc::new(parse_version(s)?);
        cache.insert(s.to_string(), parsed.clone());
        Ok(parsed)
    }

    pub fn parse_range(&self, s: &str) -> miette::Result<Option<VersionRange>> {
        VersionRange::parse(s)
    }

    pub fn parse_constraint(&self, s: &str) -> miette::Result<VersionConstraint> {
        VersionConstraint::parse(s)
    }

    /// Number of distinct version strings interned so far.
    pub fn interned_count(&self) -> usize {
        self.interned.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_parses_share_the_same_handle() {
        let scheme = VersionScheme::new();
        let a = scheme.parse_version("1.0.0").unwrap();
        let b = scheme.parse_version("1.0.0").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(scheme.interned_count(), 1);
    }

    #[test]
    fn distinct_strings_get_distinct_handles() {
        let scheme = VersionScheme::new();
        let a = scheme.parse_version("1.0.0").unwrap();
        let b = scheme.parse_version("1.0.1").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(scheme.interned_count(), 2);
    }

    #[test]
    fn schemes_do_not_share_a_cache() {
        let s1 = VersionScheme::new();
        let s2 = VersionScheme::new();
        let a = s1.parse_version("1.0.0").unwrap();
        let b = s2.parse_version("1.0.0").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn invalid_version_is_not_cached() {
        let scheme = VersionScheme::new();
        assert!(scheme.parse_version("").is_err());
        assert_eq!(scheme.interned_count(), 0);
    }
}
