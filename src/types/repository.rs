//! Repository registration and catalog types.

use serde::{Deserialize, Serialize};

use super::package::PackageMetadata;

/// A configured repository: `(name, url, priority, enabled)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRegistration {
    /// Unique repository name.
    pub name: String,
    /// Base URL (`file://` or `http(s)://`).
    pub url: String,
    /// Higher values are preferred when a package name appears in multiple
    /// repositories.
    pub priority: i64,
    /// Whether this repository participates in lookups and updates.
    pub enabled: bool,
}

/// The document fetched from `{url}/index.json`: `{name, description,
/// version, packages[]}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryCatalog {
    /// Self-declared repository name (used as the on-disk cache key).
    pub name: String,
    /// Free-text repository description.
    #[serde(default)]
    pub description: String,
    /// Index format/catalog version, opaque to this core.
    #[serde(default)]
    pub version: String,
    /// Packages this repository offers.
    #[serde(default)]
    pub packages: Vec<PackageMetadata>,
}

/// A repository package entry augmented with its source repository, as
/// returned by `SearchPackage`, `GetPackageMetadata`, and
/// `ListAvailablePackages`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    /// The package metadata as published by the repository.
    pub metadata: PackageMetadata,
    /// Name of the repository this entry came from.
    pub repository: String,
    /// Base URL of the repository this entry came from.
    pub repository_url: String,
}

impl RepositoryEntry {
    /// What: Compose the deterministic download locator for this entry.
    ///
    /// Inputs:
    /// - `self`: a repository entry carrying its originating repository URL.
    ///
    /// Output:
    /// - `{repository_url}/packages/{name}-{version}.alp`.
    #[must_use]
    pub fn download_url(&self) -> String {
        self.download_url_for(&self.metadata.name, &self.metadata.version)
    }

    /// What: Compose the download locator for an explicit `name`/`version`
    /// at this entry's originating repository, rather than the entry's own.
    ///
    /// Inputs:
    /// - `name`, `version`: the package identity to locate.
    ///
    /// Output:
    /// - `{repository_url}/packages/{name}-{version}.alp`.
    ///
    /// Details:
    /// - Shared by [`download_url`](Self::download_url) and
    ///   `Index::get_package_url`, which looks up the entry by name but
    ///   composes the URL from the caller's requested version.
    #[must_use]
    pub fn download_url_for(&self, name: &str, version: &str) -> String {
        format!("{}/packages/{name}-{version}.alp", self.repository_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_url_is_deterministic() {
        let entry = RepositoryEntry {
            metadata: PackageMetadata {
                name: "app".to_string(),
                version: "1.0.0".to_string(),
                ..Default::default()
            },
            repository: "main".to_string(),
            repository_url: "file:///tmp/repo/".to_string(),
        };
        assert_eq!(entry.download_url(), "file:///tmp/repo/packages/app-1.0.0.alp");
    }
}
