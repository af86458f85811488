//! Mock Helper State Management
//!
//! Owns the repository list and the package table, and implements the
//! discovery pass that classifies packages against the newest version
//! their repositories advertise.

use std::cmp::Ordering;

use apk_protocol::{ApiVersion, Package, PackageState, Repository};

use super::fixtures::{self, PackageEntry};
use super::version;

/// Repository list and package table of one service instance.
///
/// Both tables keep their seeded order; listing calls report rows in
/// that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockState {
    repositories: Vec<Repository>,
    packages: Vec<PackageEntry>,
}

impl MockState {
    /// Fresh state seeded with the fixtures for `api`.
    pub fn seeded(api: ApiVersion) -> Self {
        Self {
            repositories: fixtures::repositories(),
            packages: fixtures::packages(api),
        }
    }

    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    /// All packages in table order.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter().map(|e| &e.package)
    }

    pub fn package(&self, name: &str) -> Option<&Package> {
        self.entry(name).map(|e| &e.package)
    }

    /// Newest version the repositories advertise for `name`.
    pub fn newest_version(&self, name: &str) -> Option<&str> {
        self.entry(name).map(|e| e.newest_version.as_str())
    }

    /// Change the advertised newest version. Takes effect on the next
    /// discovery pass. Returns false for unknown packages.
    pub fn set_newest_version(&mut self, name: &str, newest: impl Into<String>) -> bool {
        match self.entry_mut(name) {
            Some(entry) => {
                entry.newest_version = newest.into();
                true
            }
            None => false,
        }
    }

    /// Run the discovery pass and return every package with a pending
    /// transition, in table order.
    ///
    /// A package whose installed version orders differently from the
    /// newest version gets that version staged and becomes `Upgradable` or
    /// `Downgradable`. Packages already at the newest version keep their
    /// state, even when the strings differ (`0.1.0` and `0.1.0-r0` are the
    /// same version). Running the pass twice in a row changes nothing.
    pub fn discover(&mut self) -> Vec<Package> {
        let mut relevant = Vec::new();
        for entry in &mut self.packages {
            let pkg = &mut entry.package;
            if pkg.installed_version.is_empty() {
                continue;
            }
            let state = match version::compare(&entry.newest_version, &pkg.installed_version) {
                Ordering::Equal => continue,
                Ordering::Greater => PackageState::Upgradable,
                Ordering::Less => PackageState::Downgradable,
            };
            pkg.state = state;
            pkg.staging_version = Some(entry.newest_version.clone());
            relevant.push(pkg.clone());
        }
        relevant
    }

    /// Apply the staged version of `name` and mark it installed.
    ///
    /// Returns false when the package is not in the table; the table is
    /// left untouched in that case.
    pub fn apply_staged(&mut self, name: &str) -> bool {
        let Some(entry) = self.entry_mut(name) else {
            return false;
        };
        let pkg = &mut entry.package;
        if let Some(staging) = &pkg.staging_version {
            pkg.installed_version = staging.clone();
        }
        pkg.state = PackageState::Installed;
        true
    }

    /// Packages with an installed version.
    pub fn installed(&self) -> Vec<Package> {
        self.packages()
            .filter(|p| !p.installed_version.is_empty() && p.state != PackageState::Absent)
            .cloned()
            .collect()
    }

    /// Packages whose name contains any of `terms`, ignoring case.
    pub fn search(&self, terms: &[String]) -> Vec<Package> {
        let terms: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();
        self.packages()
            .filter(|p| {
                let name = p.name.to_lowercase();
                terms.iter().any(|t| name.contains(t.as_str()))
            })
            .cloned()
            .collect()
    }

    fn entry(&self, name: &str) -> Option<&PackageEntry> {
        self.packages.iter().find(|e| e.package.name == name)
    }

    fn entry_mut(&mut self, name: &str) -> Option<&mut PackageEntry> {
        self.packages.iter_mut().find(|e| e.package.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_classifies_both_directions() {
        let mut state = MockState::seeded(ApiVersion::V2);
        let relevant = state.discover();

        assert_eq!(relevant.len(), 2);
        assert_eq!(relevant[0].name, "apk-test-app");
        assert_eq!(relevant[0].state, PackageState::Upgradable);
        assert_eq!(relevant[0].staging_version.as_deref(), Some("0.2.0-r0"));
        assert_eq!(relevant[1].name, "system-pkg");
        assert_eq!(relevant[1].state, PackageState::Downgradable);
        assert_eq!(relevant[1].staging_version.as_deref(), Some("0.1.0-r0"));
    }

    #[test]
    fn test_discover_is_idempotent() {
        let mut state = MockState::seeded(ApiVersion::V1);
        let first = state.discover();
        let snapshot = state.clone();
        let second = state.discover();

        assert_eq!(first, second);
        assert_eq!(state, snapshot);
    }

    #[test]
    fn test_apply_staged_installs_staging_version() {
        let mut state = MockState::seeded(ApiVersion::V1);
        state.discover();

        assert!(state.apply_staged("apk-test-app"));
        let pkg = state.package("apk-test-app").unwrap();
        assert_eq!(pkg.state, PackageState::Installed);
        assert_eq!(pkg.installed_version, "0.2.0");

        // No longer relevant once installed at the newest version
        let relevant = state.discover();
        assert_eq!(relevant.len(), 1);
        assert_eq!(relevant[0].name, "b");
        assert_eq!(state.package("apk-test-app").unwrap().state, PackageState::Installed);
    }

    #[test]
    fn test_apply_staged_unknown_is_noop() {
        let mut state = MockState::seeded(ApiVersion::V2);
        let before = state.clone();
        assert!(!state.apply_staged("does-not-exist"));
        assert_eq!(state, before);
    }

    #[test]
    fn test_installed_package_reenters_discovery() {
        let mut state = MockState::seeded(ApiVersion::V2);
        state.discover();
        state.apply_staged("apk-test-app");

        assert!(state.set_newest_version("apk-test-app", "0.3.0-r0"));
        let relevant = state.discover();
        let app = relevant.iter().find(|p| p.name == "apk-test-app").unwrap();
        assert_eq!(app.state, PackageState::Upgradable);
        assert_eq!(app.staging_version.as_deref(), Some("0.3.0-r0"));
        assert_eq!(app.installed_version, "0.2.0-r0");
    }

    #[test]
    fn test_equivalent_version_spelling_not_relevant() {
        let mut state = MockState::seeded(ApiVersion::V2);
        assert!(state.set_newest_version("apk-test-app", "0.1.0"));

        let relevant = state.discover();
        assert!(relevant.iter().all(|p| p.name != "apk-test-app"));
        let app = state.package("apk-test-app").unwrap();
        assert_eq!(app.state, PackageState::Available);
        assert_eq!(app.staging_version, None);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let state = MockState::seeded(ApiVersion::V2);
        let hits = state.search(&["TEST".to_string()]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "apk-test-app");
        assert!(state.search(&["nothing".to_string()]).is_empty());
    }
}
