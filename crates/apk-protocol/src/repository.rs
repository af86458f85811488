//! Repository records.

use serde::{Deserialize, Serialize};

/// Wire form of a repository: `(bss)`.
pub type RepositoryTuple = (bool, String, String);

/// A package source known to the helper.
///
/// `url` may be a network URL or a local directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RepositoryTuple", into = "RepositoryTuple")]
pub struct Repository {
    pub enabled: bool,
    pub name: String,
    pub url: String,
}

impl Repository {
    pub fn new(enabled: bool, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            enabled,
            name: name.into(),
            url: url.into(),
        }
    }

    /// True when the URL points at a local directory rather than a mirror.
    pub fn is_local(&self) -> bool {
        self.url.starts_with('/')
    }
}

impl From<RepositoryTuple> for Repository {
    fn from((enabled, name, url): RepositoryTuple) -> Self {
        Self { enabled, name, url }
    }
}

impl From<Repository> for RepositoryTuple {
    fn from(repo: Repository) -> Self {
        (repo.enabled, repo.name, repo.url)
    }
}
