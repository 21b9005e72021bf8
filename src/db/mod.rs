//! Installation database — the durable catalog of installed packages,
//! their dependency tuples, owned files, and repository registrations,
//! enforced with foreign-key referential integrity.

mod schema;

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, instrument};

use crate::Result;
use crate::types::{PackageMetadata, RepositoryRegistration};

/// A lightweight projection of an installed package, as returned by
/// `ListPackages`.
#[derive(Clone, Debug, PartialEq)]
pub struct PackageSummary {
    /// Package name.
    pub name: String,
    /// Installed version.
    pub version: String,
    /// Free-text description.
    pub description: String,
    /// Payload archive size in bytes.
    pub size: u64,
}

/// Handle to the SQLite-backed installation database. Owned exclusively by
/// one process for its lifetime.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// What: Open (or create) the installation database at `path`.
    ///
    /// Inputs:
    /// - `path`: filesystem path to the SQLite file. Parent directories are
    ///   created if missing.
    ///
    /// Output:
    /// - `Ok(Database)` with the schema initialized and foreign keys
    ///   enforced.
    /// - `Err(AlpError::Sqlite)` / `Err(AlpError::Io)` on failure.
    ///
    /// Details:
    /// - Idempotent: safe to call against an existing database file; the
    ///   schema is created with `IF NOT EXISTS` only.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        db.initialize()?;
        debug!("installation database opened");
        Ok(db)
    }

    /// What: Open an in-memory database, for tests.
    ///
    /// Inputs: none.
    ///
    /// Output: `Ok(Database)` with the schema initialized.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        db.initialize()?;
        Ok(db)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(schema::SCHEMA)?;
        Ok(())
    }

    /// What: Insert or atomically replace an installed package record.
    ///
    /// Inputs:
    /// - `metadata`: the package metadata to record as installed.
    ///
    /// Output:
    /// - `Ok(id)`, the database row id of the (possibly replaced) package.
    ///
    /// Details:
    /// - If `metadata.name` already has a row, its `dependencies` and
    ///   `files` children are discarded and replaced by `metadata`'s, and
    ///   the install timestamp is refreshed — all inside one transaction
    ///   in one transaction.
    #[instrument(skip(self, metadata), fields(package = %metadata.name))]
    pub fn add_package(&mut self, metadata: &PackageMetadata) -> Result<i64> {
        let tx = self.conn.transaction()?;

        let existing_id: Option<i64> = tx
            .query_row(
                "SELECT id FROM packages WHERE name = ?1",
                params![metadata.name],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing_id {
            tx.execute("DELETE FROM dependencies WHERE package_id = ?1", params![id])?;
            tx.execute("DELETE FROM files WHERE package_id = ?1", params![id])?;
            tx.execute(
                r"
                UPDATE packages
                SET version = ?2, description = ?3, architecture = ?4, maintainer = ?5,
                    homepage = ?6, license = ?7, size = ?8, checksum = ?9,
                    install_timestamp = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                WHERE id = ?1
                ",
                params![
                    id,
                    metadata.version,
                    metadata.description,
                    metadata.architecture,
                    metadata.maintainer,
                    metadata.homepage,
                    metadata.license,
                    metadata.size,
                    metadata.checksum,
                ],
            )?;
            Self::insert_children(&tx, id, metadata)?;
            tx.commit()?;
            debug!(id, "replaced existing package record");
            return Ok(id);
        }

        tx.execute(
            r"
            INSERT INTO packages
                (name, version, description, architecture, maintainer, homepage, license,
                 size, checksum, install_timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            ",
            params![
                metadata.name,
                metadata.version,
                metadata.description,
                metadata.architecture,
                metadata.maintainer,
                metadata.homepage,
                metadata.license,
                metadata.size,
                metadata.checksum,
            ],
        )?;
        let id = tx.last_insert_rowid();
        Self::insert_children(&tx, id, metadata)?;
        tx.commit()?;
        debug!(id, "inserted new package record");
        Ok(id)
    }

    fn insert_children(
        tx: &rusqlite::Transaction<'_>,
        package_id: i64,
        metadata: &PackageMetadata,
    ) -> Result<()> {
        for dep in &metadata.dependencies {
            let (name, min_version) = PackageMetadata::parse_dependency(dep);
            tx.execute(
                "INSERT INTO dependencies (package_id, dep_name, dep_version) VALUES (?1, ?2, ?3)",
                params![package_id, name, min_version.unwrap_or("")],
            )?;
        }
        for (idx, path) in metadata.files.iter().enumerate() {
            let idx = i64::try_from(idx).unwrap_or(i64::MAX);
            tx.execute(
                "INSERT INTO files (package_id, path, ordinal) VALUES (?1, ?2, ?3)",
                params![package_id, path, idx],
            )?;
        }
        Ok(())
    }

    /// What: Remove an installed package and its children.
    ///
    /// Inputs:
    /// - `name`: package name to remove.
    ///
    /// Output:
    /// - `Ok(true)` if a row was deleted, `Ok(false)` if `name` was not
    ///   installed (never an error for that reason).
    #[instrument(skip(self))]
    pub fn remove_package(&mut self, name: &str) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let id: Option<i64> = tx
            .query_row(
                "SELECT id FROM packages WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        let Some(id) = id else {
            return Ok(false);
        };
        tx.execute("DELETE FROM dependencies WHERE package_id = ?1", params![id])?;
        tx.execute("DELETE FROM files WHERE package_id = ?1", params![id])?;
        tx.execute("DELETE FROM packages WHERE id = ?1", params![id])?;
        tx.commit()?;
        debug!(name, "removed package record");
        Ok(true)
    }

    /// What: Fetch the full installed record for `name`, dependencies and
    /// files denormalized back into `PackageMetadata`.
    ///
    /// Inputs:
    /// - `name`: package name to look up.
    ///
    /// Output:
    /// - `Ok(Some(metadata))` if installed, `Ok(None)` otherwise.
    ///
    /// Details:
    /// - Dependency strings are reassembled as `name` (no constraint) or
    ///   `name>=version` from the split `(dep_name, dep_version)` columns.
    pub fn get_package(&self, name: &str) -> Result<Option<PackageMetadata>> {
        let row = self
            .conn
            .query_row(
                r"
                SELECT name, version, description, architecture, maintainer, homepage, license,
                       size, checksum
                FROM packages WHERE name = ?1
                ",
                params![name],
                |row| {
                    Ok(PackageMetadata {
                        name: row.get(0)?,
                        version: row.get(1)?,
                        description: row.get(2)?,
                        architecture: row.get(3)?,
                        dependencies: Vec::new(),
                        conflicts: Vec::new(),
                        provides: Vec::new(),
                        maintainer: row.get(4)?,
                        homepage: row.get(5)?,
                        license: row.get(6)?,
                        size: row.get(7)?,
                        checksum: row.get(8)?,
                        files: Vec::new(),
                    })
                },
            )
            .optional()?;

        let Some(mut metadata) = row else {
            return Ok(None);
        };

        let package_id: i64 = self.conn.query_row(
            "SELECT id FROM packages WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        let mut dep_stmt = self.conn.prepare(
            "SELECT dep_name, dep_version FROM dependencies WHERE package_id = ?1 ORDER BY id",
        )?;
        let deps = dep_stmt.query_map(params![package_id], |row| {
            let dep_name: String = row.get(0)?;
            let dep_version: String = row.get(1)?;
            Ok(if dep_version.is_empty() {
                dep_name
            } else {
                format!("{dep_name}>={dep_version}")
            })
        })?;
        for dep in deps {
            metadata.dependencies.push(dep?);
        }

        let mut file_stmt = self
            .conn
            .prepare("SELECT path FROM files WHERE package_id = ?1 ORDER BY ordinal")?;
        let files = file_stmt.query_map(params![package_id], |row| row.get::<_, String>(0))?;
        for file in files {
            metadata.files.push(file?);
        }

        Ok(Some(metadata))
    }

    /// What: List all installed packages as a lightweight projection.
    ///
    /// Inputs: none.
    ///
    /// Output:
    /// - `Ok(Vec<PackageSummary>)` ordered by name.
    pub fn list_packages(&self) -> Result<Vec<PackageSummary>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, version, description, size FROM packages ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(PackageSummary {
                name: row.get(0)?,
                version: row.get(1)?,
                description: row.get(2)?,
                size: row.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// What: Check whether a package is installed.
    ///
    /// Inputs:
    /// - `name`: package name to check.
    ///
    /// Output: `Ok(true)` if a row exists for `name`.
    pub fn is_installed(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM packages WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// What: Register a repository, or update its URL/priority if `name`
    /// already exists.
    ///
    /// Inputs:
    /// - `name`: repository name.
    /// - `url`: base URL (`file://` or `http(s)://`).
    /// - `priority`: preference ordering; higher wins on name collisions.
    ///
    /// Output: `Ok(())`.
    ///
    /// Details:
    /// - Newly added repositories default to `enabled = true`.
    pub fn add_repository(&self, name: &str, url: &str, priority: i64) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO repositories (name, url, priority, enabled) VALUES (?1, ?2, ?3, 1)
            ON CONFLICT(name) DO UPDATE SET url = excluded.url, priority = excluded.priority
            ",
            params![name, url, priority],
        )?;
        Ok(())
    }

    /// What: List enabled repositories, highest priority first.
    ///
    /// Inputs: none.
    ///
    /// Output: `Ok(Vec<RepositoryRegistration>)`, `enabled` repositories
    /// only, sorted by `priority` descending.
    pub fn list_repositories(&self) -> Result<Vec<RepositoryRegistration>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, url, priority, enabled FROM repositories \
             WHERE enabled = 1 ORDER BY priority DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RepositoryRegistration {
                name: row.get(0)?,
                url: row.get(1)?,
                priority: row.get(2)?,
                enabled: row.get::<_, i64>(3)? != 0,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// What: Reverse-dependency scan: find installed packages that declare
    /// `name` as a dependency.
    ///
    /// Inputs:
    /// - `name`: the package being considered for removal.
    ///
    /// Output:
    /// - `Ok(Vec<String>)` of installed package names whose dependency list
    ///   names `name`; empty if none.
    pub fn reverse_dependencies(&self, name: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT DISTINCT p.name
            FROM packages p
            JOIN dependencies d ON d.package_id = p.id
            WHERE d.dep_name = ?1
            ORDER BY p.name
            ",
        )?;
        let rows = stmt.query_map(params![name], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}
