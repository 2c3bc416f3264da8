//! Version parsing, tokenization, and total ordering.
//!
//! Versions use a custom ordering that differs from semver:
//! - Segments are split on `.`, `-`, digit/alpha transitions, and `_`
//! - Numeric segments compare as numbers
//! - String qualifiers have a special ordering:
//!   `alpha` < `beta` < `milestone` < `rc`/`cr` < `snapshot` < `""` (release)/`ga`/`final`
//!   < any other unrecognized qualifier (lexical) < `sp`
//! - SNAPSHOT versions sort before their release equivalent

use std::cmp::Ordering;
use std::fmt;

use resolver_util::errors::ResolverError;

/// A parsed version with comparable segments (spec §3 "Version").
#[derive(Debug, Clone)]
pub struct Version {
    pub original: String,
    pub(crate) segments: Vec<Segment>,
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum Segment {
    Numeric(u64),
    Qualifier(QualifierKind),
    Text(String),
}

/// Well-known qualifiers with a defined ordering (spec §3).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub(crate) enum QualifierKind {
    Alpha,
    Beta,
    Milestone,
    Rc,
    Snapshot,
    Release,
    Sp,
}

/// Parse a version string. Fails only on empty input; the tokenizer is
/// otherwise total (spec §4.1 `parseVersion`).
pub fn parse_version(s: &str) -> miette::Result<Version> {
    if s.trim().is_empty() {
        return Err(ResolverError::ParseError {
            kind: "version",
            input: s.to_string(),
            reason: "version string is empty".to_string(),
        }
        .into());
    }
    Ok(Version {
        original: s.to_string(),
        segments: parse_segments(s),
    })
}

impl Version {
    pub fn is_snapshot(&self) -> bool {
        self.original.ends_with("-SNAPSHOT")
    }

    /// The base version without the `-SNAPSHOT` suffix (spec §3 `baseVersion`).
    pub fn base_version(&self) -> &str {
        self.original
            .strip_suffix("-SNAPSHOT")
            .unwrap_or(&self.original)
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let max_len = self.segments.len().max(other.segments.len());
        for i in 0..max_len {
            let a = self.segments.get(i);
            let b = other.segments.get(i);
            let ord = compare_segments(a, b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn compare_segments(a: Option<&Segment>, b: Option<&Segment>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(s), None) => compare_segment_to_empty(s),
        (None, Some(s)) => compare_segment_to_empty(s).reverse(),
        (Some(a), Some(b)) => compare_two_segments(a, b),
    }
}

fn compare_segment_to_empty(seg: &Segment) -> Ordering {
    match seg {
        Segment::Numeric(0) => Ordering::Equal,
        Segment::Numeric(n) => {
            if *n > 0 {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        Segment::Qualifier(q) => q.cmp(&QualifierKind::Release),
        Segment::Text(s) if s.is_empty() => Ordering::Equal,
        Segment::Text(_) => Ordering::Greater,
    }
}

fn compare_two_segments(a: &Segment, b: &Segment) -> Ordering {
    match (a, b) {
        (Segment::Numeric(a), Segment::Numeric(b)) => a.cmp(b),
        (Segment::Qualifier(a), Segment::Qualifier(b)) => a.cmp(b),
        (Segment::Numeric(_), Segment::Qualifier(_)) => Ordering::Greater,
        (Segment::Qualifier(_), Segment::Numeric(_)) => Ordering::Less,
        (Segment::Numeric(_), Segment::Text(_)) => Ordering::Greater,
        (Segment::Text(_), Segment::Numeric(_)) => Ordering::Less,
        (Segment::Text(a), Segment::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        // An unrecognized qualifier ranks above release but below `sp`
        // (spec §3: `...snapshot<release<anything-else(lex)<sp`).
        (Segment::Qualifier(q), Segment::Text(_)) => {
            if *q == QualifierKind::Sp {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Segment::Text(_), Segment::Qualifier(q)) => {
            if *q == QualifierKind::Sp {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
    }
}

/// Tokenize on `.`, `-`, `_`, and digit/alpha transitions.
fn parse_segments(version: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut current_is_digit: Option<bool> = None;

    let mut flush = |current: &mut String, segments: &mut Vec<Segment>| {
        if !current.is_empty() {
            segments.push(classify(current));
            current.clear();
        }
    };

    for ch in version.chars() {
        if ch == '.' || ch == '-' || ch == '_' {
            flush(&mut current, &mut segments);
            current_is_digit = None;
            continue;
        }
        let is_digit = ch.is_ascii_digit();
        if let Some(prev_is_digit) = current_is_digit {
            if prev_is_digit != is_digit {
                flush(&mut current, &mut segments);
            }
        }
        current.push(ch);
        current_is_digit = Some(is_digit);
    }
    flush(&mut current, &mut segments);

    segments
}

fn classify(token: &str) -> Segment {
    if let Ok(n) = token.parse::<u64>() {
        return Segment::Numeric(n);
    }
    match token.to_lowercase().as_str() {
        "alpha" | "a" => Segment::Qualifier(QualifierKind::Alpha),
        "beta" | "b" => Segment::Qualifier(QualifierKind::Beta),
        "milestone" | "m" => Segment::Qualifier(QualifierKind::Milestone),
        "rc" | "cr" => Segment::Qualifier(QualifierKind::Rc),
        "snapshot" => Segment::Qualifier(QualifierKind::Snapshot),
        "" | "ga" | "final" | "release" => Segment::Qualifier(QualifierKind::Release),
        "sp" => Segment::Qualifier(QualifierKind::Sp),
        _ => Segment::Text(token.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_ordering() {
        let v1 = parse_version("1.0").unwrap();
        let v2 = parse_version("2.0").unwrap();
        assert!(v1 < v2);
    }

    #[test]
    fn three_part_ordering() {
        let v1 = parse_version("1.0.0").unwrap();
        let v2 = parse_version("1.0.1").unwrap();
        let v3 = parse_version("1.1.0").unwrap();
        assert!(v1 < v2);
        assert!(v2 < v3);
    }

    #[test]
    fn qualifier_ordering() {
        let alpha = parse_version("1.0-alpha").unwrap();
        let beta = parse_version("1.0-beta").unwrap();
        let rc = parse_version("1.0-rc").unwrap();
        let cr = parse_version("1.0-cr").unwrap();
        let release = parse_version("1.0").unwrap();
        let sp = parse_version("1.0-sp").unwrap();

        assert!(alpha < beta);
        assert!(beta < rc);
        assert_eq!(rc, cr);
        assert!(rc < release);
        assert!(release < sp);
    }

    #[test]
    fn snapshot_before_release() {
        let snap = parse_version("1.0-SNAPSHOT").unwrap();
        let rel = parse_version("1.0").unwrap();
        assert!(snap < rel);
    }

    #[test]
    fn trailing_zeros_equal() {
        let v1 = parse_version("1.0").unwrap();
        let v2 = parse_version("1.0.0").unwrap();
        assert_eq!(v1, v2);

        let v3 = parse_version("1-ga").unwrap();
        let v4 = parse_version("1").unwrap();
        assert_eq!(v3, v4);
    }

    #[test]
    fn numeric_vs_string() {
        // An unrecognized qualifier like `-jre` ranks above release.
        let v1 = parse_version("1.0.0").unwrap();
        let v2 = parse_version("1.0.0-jre").unwrap();
        assert!(v2 > v1);
    }

    #[test]
    fn guava_style_versions() {
        let v1 = parse_version("31.0-jre").unwrap();
        let v2 = parse_version("32.0-jre").unwrap();
        assert!(v1 < v2);
    }

    #[test]
    fn digit_alpha_transition_without_separator() {
        let v1 = parse_version("1.0beta2").unwrap();
        let v2 = parse_version("1.0-beta-2").unwrap();
        assert_eq!(v1, v2);
    }

    #[test]
    fn is_snapshot() {
        let v = parse_version("1.0-SNAPSHOT").unwrap();
        assert!(v.is_snapshot());
        assert_eq!(v.base_version(), "1.0");

        let v2 = parse_version("1.0.0").unwrap();
        assert!(!v2.is_snapshot());
    }

    #[test]
    fn empty_version_is_an_error() {
        assert!(parse_version("").is_err());
        assert!(parse_version("   ").is_err());
    }

    #[test]
    fn display() {
        let v = parse_version("1.8.0").unwrap();
        assert_eq!(v.to_string(), "1.8.0");
    }
}
