//! apk-style version ordering.
//!
//! Versions look like `X.Y[.Z][-rN]`. The dotted part is normalised to a
//! semver triple (missing components are zero), then the package release
//! `rN` breaks ties. Strings that do not fit the pattern are compared
//! lexicographically.

use semver::Version;
use std::cmp::Ordering;
use std::fmt;

/// A parsed apk package version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApkVersion {
    version: Version,
    release: u64,
}

impl ApkVersion {
    /// Parse `X.Y[.Z][-rN]`. Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        let (dotted, release) = match s.rsplit_once("-r") {
            Some((dotted, rel)) => (dotted, rel.parse::<u64>().ok()?),
            None => (s, 0),
        };

        if let Ok(version) = Version::parse(dotted) {
            if version.pre.is_empty() {
                return Some(Self { version, release });
            }
        }

        let parts: Vec<u64> = dotted
            .split('.')
            .map(|p| p.parse::<u64>().ok())
            .collect::<Option<_>>()?;
        if parts.is_empty() || parts.len() > 3 {
            return None;
        }

        let major = parts[0];
        let minor = parts.get(1).copied().unwrap_or(0);
        let patch = parts.get(2).copied().unwrap_or(0);
        Some(Self {
            version: Version::new(major, minor, patch),
            release,
        })
    }
}

impl Ord for ApkVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version
            .cmp(&other.version)
            .then(self.release.cmp(&other.release))
    }
}

impl PartialOrd for ApkVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ApkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-r{}", self.version, self.release)
    }
}

/// Order two version strings.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (ApkVersion::parse(a), ApkVersion::parse(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}
