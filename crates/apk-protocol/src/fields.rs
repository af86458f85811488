//! Requested-properties bitmask for v2 package queries.

use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Selects which package properties a v2 caller wants back.
///
/// Carried on the wire as a plain `u32`. The `name` property is always
/// emitted because it identifies the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageFields(u32);

impl PackageFields {
    pub const NONE: PackageFields = PackageFields(0);
    pub const NAME: PackageFields = PackageFields(1 << 0);
    pub const VERSION: PackageFields = PackageFields(1 << 1);
    pub const DESCRIPTION: PackageFields = PackageFields(1 << 2);
    pub const LICENSE: PackageFields = PackageFields(1 << 3);
    pub const STAGING_VERSION: PackageFields = PackageFields(1 << 4);
    pub const URL: PackageFields = PackageFields(1 << 5);
    pub const INSTALLED_SIZE: PackageFields = PackageFields(1 << 6);
    pub const SIZE: PackageFields = PackageFields(1 << 7);
    pub const PACKAGE_STATE: PackageFields = PackageFields(1 << 8);
    pub const ALL: PackageFields = PackageFields((1 << 9) - 1);

    /// Build a mask from raw wire bits. Unknown bits are dropped.
    pub fn from_bits(bits: u32) -> Self {
        PackageFields(bits & Self::ALL.0)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// True when every bit of `other` is set in `self`.
    pub fn contains(self, other: PackageFields) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for PackageFields {
    type Output = PackageFields;

    fn bitor(self, rhs: PackageFields) -> PackageFields {
        PackageFields(self.0 | rhs.0)
    }
}

impl BitOrAssign for PackageFields {
    fn bitor_assign(&mut self, rhs: PackageFields) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for PackageFields {
    type Output = PackageFields;

    fn bitand(self, rhs: PackageFields) -> PackageFields {
        PackageFields(self.0 & rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_covers_every_field() {
        let every = PackageFields::NAME
            | PackageFields::VERSION
            | PackageFields::DESCRIPTION
            | PackageFields::LICENSE
            | PackageFields::STAGING_VERSION
            | PackageFields::URL
            | PackageFields::INSTALLED_SIZE
            | PackageFields::SIZE
            | PackageFields::PACKAGE_STATE;
        assert_eq!(every, PackageFields::ALL);
        assert_eq!(PackageFields::ALL.bits(), 511);
    }

    #[test]
    fn test_from_bits_drops_unknown() {
        let mask = PackageFields::from_bits(0xFFFF_FFFF);
        assert_eq!(mask, PackageFields::ALL);
    }

    #[test]
    fn test_contains() {
        let mask = PackageFields::VERSION | PackageFields::SIZE;
        assert!(mask.contains(PackageFields::VERSION));
        assert!(!mask.contains(PackageFields::LICENSE));
        assert!(!mask.contains(PackageFields::VERSION | PackageFields::LICENSE));
    }
}
