//! Version ranges: `[1.0,2.0)`, `[1.0,]`, `(,2.0)`, `[1.0]`, `[1.2.*]`.

use std::cmp::Ordering;

use resolver_util::errors::ResolverError;

use crate::version::{parse_version, Segment, Version};

/// A bound of a [`VersionRange`].
#[derive(Debug, Clone)]
pub struct Bound {
    pub version: Version,
    pub inclusive: bool,
}

/// A version range: a pair of optional bounds, or a wildcard prefix match
/// (spec §3 "VersionRange", §4.1 `parseRange`).
#[derive(Debug, Clone)]
pub struct VersionRange {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
    /// Set for `[x.y.*]` ranges. Containment checks the version's leading
    /// segments against this prefix directly, rather than against an
    /// arithmetic upper bound — so `1.2-SNAPSHOT` still matches `[1.2.*]`
    /// even though it sorts below the release `1.2` (spec §9 open question).
    wildcard_prefix: Option<Vec<Segment>>,
}

impl VersionRange {
    /// Parse a single bracketed range expression. Returns `Ok(None)` if
    /// `spec` is not bracketed (a bare version, handled by
    /// [`crate::constraint::VersionConstraint`] as a recommendation instead).
    /// Enforces exactly one `,` inside the brackets; `[1]` is shorthand for
    /// `[1,1]`.
    pub fn parse(spec: &str) -> miette::Result<Option<Self>> {
        let s = spec.trim();
        let opens_bracket = s.starts_with('[') || s.starts_with('(');
        let closes_bracket = s.ends_with(']') || s.ends_with(')');
        if !opens_bracket || !closes_bracket || s.len() < 2 {
            return Ok(None);
        }

        let open_inclusive = s.starts_with('[');
        let close_inclusive = s.ends_with(']');
        let inner = s[1..s.len() - 1].trim();

        let comma_count = inner.chars().filter(|c| *c == ',').count();
        if comma_count > 1 {
            return Err(malformed(spec, "more than one comma inside brackets"));
        }

        if comma_count == 1 {
            let (lower, upper) = inner.split_once(',').expect("comma present");
            let lower = lower.trim();
            let upper = upper.trim();

            if let Some(prefix) = wildcard_prefix_segments(upper) {
                if !lower.is_empty() {
                    return Err(malformed(spec, "wildcard upper bound cannot be combined with an explicit lower bound"));
                }
                return Ok(Some(VersionRange {
                    lower: Some(Bound {
                        version: parse_version(&prefix.join("."))?,
                        inclusive: true,
                    }),
                    upper: None,
                    wildcard_prefix: Some(segments_of(&prefix)?),
                }));
            }

            Ok(Some(VersionRange {
                lower: if lower.is_empty() {
                    None
                } else {
                    Some(Bound {
                        version: parse_version(lower)?,
                        inclusive: open_inclusive,
                    })
                },
                upper: if upper.is_empty() {
                    None
                } else {
                    Some(Bound {
                        version: parse_version(upper)?,
                        inclusive: close_inclusive,
                    })
                },
                wildcard_prefix: None,
            }))
        } else if inner.is_empty() {
            Err(malformed(spec, "range has no version and no comma"))
        } else if let Some(prefix) = wildcard_prefix_segments(inner) {
            Ok(Some(VersionRange {
                lower: Some(Bound {
                    version: parse_version(&prefix.join("."))?,
                    inclusive: true,
                }),
                upper: None,
                wildcard_prefix: Some(segments_of(&prefix)?),
            }))
        } else {
            // `[1.0]` shorthand: exactly version 1.0, equivalent to `[1.0,1.0]`.
            let v = parse_version(inner)?;
            Ok(Some(VersionRange {
                lower: Some(Bound {
                    version: v.clone(),
                    inclusive: true,
                }),
                upper: Some(Bound {
                    version: v,
                    inclusive: true,
                }),
                wildcard_prefix: None,
            }))
        }
    }

    /// Check if a version satisfies this range.
    pub fn contains(&self, version: &Version) -> bool {
        if let Some(prefix) = &self.wildcard_prefix {
            let segs = version.segments();
            return segs.len() >= prefix.len() && segs[..prefix.len()] == prefix[..];
        }

        if let Some(ref lower) = self.lower {
            let cmp = version.cmp(&lower.version);
            if lower.inclusive {
                if cmp == Ordering::Less {
                    return false;
                }
            } else if cmp != Ordering::Greater {
                return false;
            }
        }
        if let Some(ref upper) = self.upper {
            let cmp = version.cmp(&upper.version);
            if upper.inclusive {
                if cmp == Ordering::Greater {
                    return false;
                }
            } else if cmp != Ordering::Less {
                return false;
            }
        }
        true
    }

    /// Whether two ranges share at least one version (used by the conflict
    /// resolver to intersect hard constraints, spec §4.3c). Conservative:
    /// wildcard-prefix ranges only intersect with another range that shares
    /// the same or a containing prefix.
    pub fn intersects(&self, other: &Self) -> bool {
        if self.wildcard_prefix.is_some() || other.wildcard_prefix.is_some() {
            return match (&self.lower, &other.lower) {
                (Some(a), Some(b)) => a.version == b.version,
                _ => true,
            };
        }
        let lower_ok = match (&self.lower, &other.upper) {
            (Some(a), Some(b)) => match a.version.cmp(&b.version) {
                Ordering::Less => true,
                Ordering::Equal => a.inclusive && b.inclusive,
                Ordering::Greater => false,
            },
            _ => true,
        };
        let upper_ok = match (&self.upper, &other.lower) {
            (Some(a), Some(b)) => match a.version.cmp(&b.version) {
                Ordering::Greater => true,
                Ordering::Equal => a.inclusive && b.inclusive,
                Ordering::Less => false,
            },
            _ => true,
        };
        lower_ok && upper_ok
    }
}

fn wildcard_prefix_segments(token: &str) -> Option<Vec<String>> {
    let token = token.strip_suffix(".*").or_else(|| token.strip_suffix("*"))?;
    if token.is_empty() || token.contains('*') {
        return None;
    }
    Some(token.split(['.', '-']).map(str::to_string).collect())
}

fn segments_of(parts: &[String]) -> miette::Result<Vec<Segment>> {
    let joined = parts.join(".");
    let v = parse_version(&joined)?;
    Ok(v.segments().to_vec())
}

fn malformed(spec: &str, reason: &str) -> miette::Report {
    ResolverError::ParseError {
        kind: "version range",
        input: spec.to_string(),
        reason: reason.to_string(),
    }
    .into()
}
