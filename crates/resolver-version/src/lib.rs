//! Maven-style version scheme (spec §3, §4.1): total ordering over
//! dotted/hyphenated versions, range and constraint parsing, and
//! per-scheme interning so the conflict resolver can key on identity
//! rather than re-parsing and re-comparing strings.

pub mod constraint;
pub mod range;
pub mod scheme;
pub mod version;

pub use constraint::VersionConstraint;
pub use range::{Bound, VersionRange};
pub use scheme::VersionScheme;
pub use version::{parse_version, Version};
