//! Seed data loaded at every service start.

use apk_protocol::{ApiVersion, Package, PackageState, Repository};

/// Package name that makes add/delete calls block.
pub const SLOW_PACKAGE: &str = "slow";

/// File path that resolves to an owning package in owner searches.
pub const OWNED_PATH: &str = "/usr/share/apps/no-source-app.desktop";

/// Package that owns [`OWNED_PATH`].
pub const OWNED_PATH_PACKAGE: &str = "no-source-pkg";

/// A package table row: the package plus the newest version its
/// repositories advertise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub package: Package,
    pub newest_version: String,
}

/// Repositories seeded for both API generations.
pub fn repositories() -> Vec<Repository> {
    vec![
        Repository::new(true, "a", "https://alpine.org/alpine/edge/main"),
        Repository::new(false, "b", "https://pmos.org/pmos/master"),
        Repository::new(true, "c", "/home/data/foo/bar/baz"),
    ]
}

/// Package table seeded for `api`.
pub fn packages(api: ApiVersion) -> Vec<PackageEntry> {
    match api {
        ApiVersion::V1 => vec![
            entry("apk-test-app", "desktop app", "0.1.0", "0.2.0"),
            entry("b", "system package", "0.3.0", "0.2.0"),
        ],
        ApiVersion::V2 => vec![
            entry("apk-test-app", "desktop app", "0.1.0-r0", "0.2.0-r0"),
            entry("system-pkg", "system package", "2.0-r0", "0.1.0-r0"),
        ],
    }
}

fn entry(name: &str, description: &str, installed: &str, newest: &str) -> PackageEntry {
    PackageEntry {
        package: Package {
            name: name.to_string(),
            installed_version: installed.to_string(),
            description: description.to_string(),
            license: "GPL".to_string(),
            staging_version: None,
            url: "url".to_string(),
            installed_size: 50,
            download_size: 40,
            state: PackageState::Available,
        },
        newest_version: newest.to_string(),
    }
}
