//! Repository index — fetches and caches per-repository package catalogs,
//! and answers metadata queries across the federation of enabled
//! repositories.

mod fetch;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::Result;
use crate::db::Database;
use crate::resolver::PackageSource;
use crate::types::{RepositoryCatalog, RepositoryEntry};

/// Caches per-repository catalogs on disk and in memory, and serves the
/// query surface the resolver and CLI use.
///
/// The in-memory cache uses `RefCell` rather than `&mut self` accessors
/// because queries (`search_package`, `get_package_metadata`, ...) are
/// logically read-only and the resolver holds an `&Index` alongside an
/// `&Database`, never an exclusive borrow.
pub struct Index {
    cache_dir: PathBuf,
    memory: RefCell<HashMap<String, RepositoryCatalog>>,
}

impl Index {
    /// What: Open (or create) the on-disk cache directory for repository
    /// indexes.
    ///
    /// Inputs:
    /// - `cache_dir`: directory holding one `{repo_name}.json` file per
    ///   cached catalog.
    ///
    /// Output: `Ok(Index)` with an empty in-memory cache; on-disk entries
    /// are loaded lazily on first query.
    pub fn open(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir, memory: RefCell::new(HashMap::new()) })
    }

    fn cache_path(&self, repo_name: &str) -> PathBuf {
        self.cache_dir.join(format!("{repo_name}.json"))
    }

    /// What: Fetch `{url}/index.json`, parse it, and persist it to the
    /// on-disk and in-memory caches keyed by its self-declared `name`.
    ///
    /// Inputs:
    /// - `url`: repository base URL, `file://` or `http(s)://`.
    ///
    /// Output:
    /// - `Ok(true)` on success.
    /// - `Ok(false)` if the fetch or parse failed; the failure is logged
    ///   but not propagated, matching the per-repository tolerance
    ///   `update_all_indexes` needs.
    #[instrument(skip(self))]
    pub fn update_index(&self, url: &str) -> Result<bool> {
        let catalog = match fetch::fetch_catalog(url) {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(url, error = %err, "failed to update repository index");
                return Ok(false);
            }
        };

        let cache_file = self.cache_path(&catalog.name);
        let serialized = serde_json::to_vec_pretty(&catalog)?;
        std::fs::write(&cache_file, serialized)?;

        self.memory.borrow_mut().insert(catalog.name.clone(), catalog);
        debug!(url, "repository index updated");
        Ok(true)
    }

    /// What: Refresh every registered repository's index.
    ///
    /// Inputs:
    /// - `db`: the installation database, consulted for the repository
    ///   list.
    ///
    /// Output:
    /// - `Ok(results)`: one `(repo_name, success)` pair per registered
    ///   repository.
    pub fn update_all_indexes(&self, db: &Database) -> Result<Vec<(String, bool)>> {
        let mut results = Vec::new();
        for repo in db.list_repositories()? {
            let ok = self.update_index(&repo.url)?;
            results.push((repo.name, ok));
        }
        Ok(results)
    }

    fn load_catalog(&self, repo_name: &str) -> Option<RepositoryCatalog> {
        if let Some(catalog) = self.memory.borrow().get(repo_name) {
            return Some(catalog.clone());
        }
        let cache_file = self.cache_path(repo_name);
        let bytes = std::fs::read(&cache_file).ok()?;
        match serde_json::from_slice::<RepositoryCatalog>(&bytes) {
            Ok(catalog) => {
                self.memory.borrow_mut().insert(repo_name.to_string(), catalog.clone());
                Some(catalog)
            }
            Err(err) => {
                warn!(repo_name, error = %err, "cached repository index is malformed");
                None
            }
        }
    }

    /// What: Case-insensitive substring search over `name` and
    /// `description` across all enabled repositories.
    ///
    /// Inputs:
    /// - `db`: consulted for the enabled repository list, highest
    ///   priority first.
    /// - `query`: substring to match.
    ///
    /// Output: `Ok(entries)`, each tagged with its source repository.
    pub fn search_package(&self, db: &Database, query: &str) -> Result<Vec<RepositoryEntry>> {
        let needle = query.to_lowercase();
        let mut out = Vec::new();
        for repo in db.list_repositories()? {
            let Some(catalog) = self.load_catalog(&repo.name) else { continue };
            for metadata in &catalog.packages {
                if metadata.name.to_lowercase().contains(&needle)
                    || metadata.description.to_lowercase().contains(&needle)
                {
                    out.push(RepositoryEntry {
                        metadata: metadata.clone(),
                        repository: repo.name.clone(),
                        repository_url: repo.url.clone(),
                    });
                }
            }
        }
        Ok(out)
    }

    /// What: Look up one package by exact name, in repository-priority
    /// order.
    ///
    /// Inputs:
    /// - `db`: consulted for the enabled repository list.
    /// - `name`: exact package name.
    ///
    /// Output: `Ok(Some(entry))` for the first (highest-priority) match,
    /// `Ok(None)` if no enabled repository carries `name`.
    pub fn get_package_metadata(&self, db: &Database, name: &str) -> Result<Option<RepositoryEntry>> {
        for repo in db.list_repositories()? {
            let Some(catalog) = self.load_catalog(&repo.name) else { continue };
            if let Some(metadata) = catalog.packages.iter().find(|p| p.name == name) {
                return Ok(Some(RepositoryEntry {
                    metadata: metadata.clone(),
                    repository: repo.name.clone(),
                    repository_url: repo.url.clone(),
                }));
            }
        }
        Ok(None)
    }

    /// What: Compose the deterministic download URL for a package.
    ///
    /// Inputs:
    /// - `db`: consulted for the originating repository.
    /// - `name`, `version`: the package identity to locate.
    ///
    /// Output: `Ok(Some(url))`, or `Ok(None)` if `name` is not published by
    /// any enabled repository.
    pub fn get_package_url(&self, db: &Database, name: &str, version: &str) -> Result<Option<String>> {
        let Some(entry) = self.get_package_metadata(db, name)? else {
            return Ok(None);
        };
        Ok(Some(entry.download_url_for(name, version)))
    }

    /// What: List every package published by any enabled repository.
    ///
    /// Inputs:
    /// - `db`: consulted for the enabled repository list.
    ///
    /// Output: `Ok(entries)`, each tagged with its source repository, in
    /// repository-priority order.
    pub fn list_available_packages(&self, db: &Database) -> Result<Vec<RepositoryEntry>> {
        let mut out = Vec::new();
        for repo in db.list_repositories()? {
            let Some(catalog) = self.load_catalog(&repo.name) else { continue };
            for metadata in &catalog.packages {
                out.push(RepositoryEntry {
                    metadata: metadata.clone(),
                    repository: repo.name.clone(),
                    repository_url: repo.url.clone(),
                });
            }
        }
        Ok(out)
    }
}

/// Adapts `(Index, &Database)` to the resolver's [`PackageSource`]
/// without giving the resolver a dependency on the database type itself.
pub struct IndexSource<'a> {
    index: &'a Index,
    db: &'a Database,
}

impl<'a> IndexSource<'a> {
    /// Borrow an index and a database together as a single resolver input.
    #[must_use]
    pub fn new(index: &'a Index, db: &'a Database) -> Self {
        Self { index, db }
    }
}

impl PackageSource for IndexSource<'_> {
    fn get_package_metadata(&self, name: &str) -> Option<RepositoryEntry> {
        self.index.get_package_metadata(self.db, name).unwrap_or_else(|err| {
            warn!(name, error = %err, "repository lookup failed during resolution");
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackageMetadata;

    fn write_catalog(dir: &Path, repo_name: &str, packages: Vec<PackageMetadata>) {
        let catalog = RepositoryCatalog {
            name: repo_name.to_string(),
            description: "test repo".to_string(),
            version: "1".to_string(),
            packages,
        };
        std::fs::write(
            dir.join("index.json"),
            serde_json::to_vec(&catalog).unwrap(),
        )
        .unwrap();
    }

    fn sample(name: &str) -> PackageMetadata {
        PackageMetadata {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            description: format!("{name} package"),
            architecture: "x86_64".to_string(),
            size: 1,
            checksum: "a".repeat(64),
            ..Default::default()
        }
    }

    #[test]
    fn update_index_fetches_from_file_url_and_populates_caches() {
        let repo_dir = tempfile::tempdir().unwrap();
        write_catalog(repo_dir.path(), "main", vec![sample("app")]);
        let cache_dir = tempfile::tempdir().unwrap();
        let index = Index::open(cache_dir.path()).unwrap();

        let url = format!("file://{}", repo_dir.path().display());
        assert!(index.update_index(&url).unwrap());
        assert!(cache_dir.path().join("main.json").exists());
    }

    #[test]
    fn update_index_reports_failure_without_erroring() {
        let cache_dir = tempfile::tempdir().unwrap();
        let index = Index::open(cache_dir.path()).unwrap();
        assert!(!index.update_index("file:///does/not/exist").unwrap());
    }

    #[test]
    fn search_is_case_insensitive_over_name_and_description() {
        let repo_dir = tempfile::tempdir().unwrap();
        write_catalog(repo_dir.path(), "main", vec![sample("Hello-World")]);
        let cache_dir = tempfile::tempdir().unwrap();
        let index = Index::open(cache_dir.path()).unwrap();
        index.update_index(&format!("file://{}", repo_dir.path().display())).unwrap();

        let db = Database::open_in_memory().unwrap();
        db.add_repository("main", &format!("file://{}", repo_dir.path().display()), 0).unwrap();

        let hits = index.search_package(&db, "hello").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.name, "Hello-World");
    }

    #[test]
    fn get_package_url_is_none_when_unpublished() {
        let cache_dir = tempfile::tempdir().unwrap();
        let index = Index::open(cache_dir.path()).unwrap();
        let db = Database::open_in_memory().unwrap();
        assert_eq!(index.get_package_url(&db, "ghost", "1.0.0").unwrap(), None);
    }
}
