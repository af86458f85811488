//! Package lifecycle state codes.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Lifecycle state of a package as reported on the wire.
///
/// The numeric codes are part of the contract and are identical for both
/// API generations. `Absent` and `Error` are never produced by the seeded
/// fixtures; `Absent` doubles as the v1 not-found marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PackageState {
    /// Known to a repository, not installed.
    #[default]
    Available,
    /// Installed at its staging version (or no transition pending).
    Installed,
    /// Not installed and unknown to every repository.
    Absent,
    /// The helper failed to evaluate the package.
    Error,
    /// A newer version is staged.
    Upgradable,
    /// An older version is staged.
    Downgradable,
}

impl PackageState {
    /// Every state, in code order.
    pub const ALL: [PackageState; 6] = [
        PackageState::Available,
        PackageState::Installed,
        PackageState::Absent,
        PackageState::Error,
        PackageState::Upgradable,
        PackageState::Downgradable,
    ];

    /// Numeric wire code.
    pub fn code(self) -> u32 {
        match self {
            PackageState::Available => 0,
            PackageState::Installed => 1,
            PackageState::Absent => 2,
            PackageState::Error => 3,
            PackageState::Upgradable => 4,
            PackageState::Downgradable => 5,
        }
    }

    /// Look up a state by its wire code.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// True when an upgrade call would change the installed version.
    pub fn has_pending_transition(self) -> bool {
        matches!(self, PackageState::Upgradable | PackageState::Downgradable)
    }
}

impl fmt::Display for PackageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackageState::Available => "AVAILABLE",
            PackageState::Installed => "INSTALLED",
            PackageState::Absent => "ABSENT",
            PackageState::Error => "ERROR",
            PackageState::Upgradable => "UPGRADABLE",
            PackageState::Downgradable => "DOWNGRADABLE",
        };
        f.write_str(name)
    }
}

impl Serialize for PackageState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.code())
    }
}

impl<'de> Deserialize<'de> for PackageState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u32::deserialize(deserializer)?;
        PackageState::from_code(code)
            .ok_or_else(|| de::Error::custom(format!("unknown package state code {}", code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_helper_table() {
        assert_eq!(PackageState::Available.code(), 0);
        assert_eq!(PackageState::Installed.code(), 1);
        assert_eq!(PackageState::Absent.code(), 2);
        assert_eq!(PackageState::Error.code(), 3);
        assert_eq!(PackageState::Upgradable.code(), 4);
        assert_eq!(PackageState::Downgradable.code(), 5);
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&PackageState::Upgradable).unwrap();
        assert_eq!(json, "4");

        let state: PackageState = serde_json::from_str("5").unwrap();
        assert_eq!(state, PackageState::Downgradable);
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert!(PackageState::from_code(6).is_none());
        assert!(serde_json::from_str::<PackageState>("42").is_err());
    }

    #[test]
    fn test_pending_transition() {
        assert!(PackageState::Upgradable.has_pending_transition());
        assert!(PackageState::Downgradable.has_pending_transition());
        assert!(!PackageState::Installed.has_pending_transition());
        assert!(!PackageState::Available.has_pending_transition());
    }
}
