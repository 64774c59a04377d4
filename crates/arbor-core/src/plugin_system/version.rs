//! Build numbers and lenient plugin version ordering.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use semver::Version;
use thiserror::Error;

/// Name used by development builds that accept every plugin build target.
pub const SNAPSHOT: &str = "SNAPSHOT";

/// Platform build identifier: a plain build number, or the floating snapshot
/// build produced from source checkouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildNumber {
    Snapshot,
    Release(u32),
}

impl BuildNumber {
    pub fn is_snapshot(&self) -> bool {
        matches!(self, BuildNumber::Snapshot)
    }
}

impl fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildNumber::Snapshot => f.write_str(SNAPSHOT),
            BuildNumber::Release(number) => write!(f, "{number}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid build number '{0}'")]
pub struct BuildNumberParseError(String);

impl FromStr for BuildNumber {
    type Err = BuildNumberParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(SNAPSHOT) {
            return Ok(BuildNumber::Snapshot);
        }
        s.parse::<u32>()
            .map(BuildNumber::Release)
            .map_err(|_| BuildNumberParseError(s.to_string()))
    }
}

/// Orders two optional version strings. Absent versions sort lowest. When
/// both sides parse as semver the semver ordering wins; otherwise the plain
/// string ordering is used so arbitrary vendor versions still compare
/// deterministically.
pub fn compare_version_numbers(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (Version::parse(a), Version::parse(b)) {
            (Ok(version_a), Ok(version_b)) => version_a.cmp(&version_b),
            _ => a.cmp(b),
        },
    }
}
