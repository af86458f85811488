//! API generations and their method names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which generation of the helper contract is being served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// `apkPolkit1`: tuple records, one package per call.
    V1,
    /// `apkPolkit2`: property maps, batched calls.
    #[default]
    V2,
}

impl ApiVersion {
    /// Well-known bus name the helper claims.
    pub fn bus_name(self) -> &'static str {
        match self {
            ApiVersion::V1 => "dev.Cogitri.apkPolkit1",
            ApiVersion::V2 => "dev.Cogitri.apkPolkit2",
        }
    }

    pub fn object_path(self) -> &'static str {
        match self {
            ApiVersion::V1 => "/dev/Cogitri/apkPolkit1",
            ApiVersion::V2 => "/dev/Cogitri/apkPolkit2",
        }
    }

    /// Interface name; identical to the bus name for both generations.
    pub fn interface(self) -> &'static str {
        self.bus_name()
    }

    /// v1 lives on the system bus, v2 on the session bus.
    pub fn system_bus(self) -> bool {
        matches!(self, ApiVersion::V1)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiVersion::V1 => write!(f, "v1"),
            ApiVersion::V2 => write!(f, "v2"),
        }
    }
}

impl FromStr for ApiVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" | "1" | "apkpolkit1" => Ok(ApiVersion::V1),
            "v2" | "2" | "apkpolkit2" => Ok(ApiVersion::V2),
            other => Err(format!("unknown API version '{}' (expected v1 or v2)", other)),
        }
    }
}

/// Known method names.
pub mod methods {
    // Shared by both generations.
    pub const LIST_REPOSITORIES: &str = "ListRepositories";
    pub const ADD_REPOSITORY: &str = "AddRepository";
    pub const REMOVE_REPOSITORY: &str = "RemoveRepository";
    pub const UPDATE_REPOSITORIES: &str = "UpdateRepositories";
    pub const LIST_UPGRADABLE_PACKAGES: &str = "ListUpgradablePackages";
    pub const LIST_INSTALLED_PACKAGES: &str = "ListInstalledPackages";
    pub const DELETE_PACKAGE: &str = "DeletePackage";

    // apkPolkit1 only.
    pub const GET_PACKAGE_DETAILS: &str = "GetPackageDetails";
    pub const UPGRADE_PACKAGE: &str = "UpgradePackage";
    pub const ADD_PACKAGE: &str = "AddPackage";
    pub const SEARCH_FOR_PACKAGES: &str = "SearchForPackages";

    // apkPolkit2 only.
    pub const GET_PACKAGES_DETAILS: &str = "GetPackagesDetails";
    pub const UPGRADE_PACKAGES: &str = "UpgradePackages";
    pub const ADD_PACKAGES: &str = "AddPackages";
    pub const DELETE_PACKAGES: &str = "DeletePackages";
    pub const SEARCH_FILES_OWNERS: &str = "SearchFilesOwners";
    pub const SEARCH_PACKAGE_NAMES: &str = "SearchPackageNames";

    /// Test-harness control surface, served next to the helper interface.
    pub mod mock {
        pub const INTERFACE: &str = "org.freedesktop.DBus.Mock";
        pub const GET_CALLS: &str = "GetCalls";
        pub const GET_METHOD_CALLS: &str = "GetMethodCalls";
        pub const CLEAR_CALLS: &str = "ClearCalls";
        pub const RESET: &str = "Reset";
    }
}
