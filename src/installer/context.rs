//! `AlpContext` — the injected-dependency composition root. Wires the
//! database, repository index, and transaction log into a single value
//! passed by reference into command entry points, replacing the reference
//! implementation's global singleton (spec.md §9's Design Notes).

use std::path::PathBuf;

use crate::Result;
use crate::config::AlpConfig;
use crate::db::Database;
use crate::installer::log::TransactionLog;
use crate::repo::Index;

/// Owns every durable handle one ALP invocation needs: the installation
/// database, the repository index cache, the transaction log, and the
/// resolved configuration they were opened from.
///
/// Not `Sync` by construction — `rusqlite::Connection` inside `Database`
/// is not `Sync` — matching spec.md §5's "owned exclusively by one
/// `ALPContext` per process".
pub struct AlpContext {
    /// The installation database handle.
    pub database: Database,
    /// The repository index cache.
    pub index: Index,
    /// The append-only transaction log.
    pub transaction_log: TransactionLog,
    /// The configuration this context was opened from.
    pub config: AlpConfig,
}

impl AlpContext {
    /// What: Open every subsystem a command entry point needs from one
    /// resolved configuration.
    ///
    /// Inputs:
    /// - `config`: database path, cache directory, and log directory.
    ///
    /// Output: `Ok(AlpContext)` with all directories created as needed.
    pub fn open(config: AlpConfig) -> Result<Self> {
        let database = Database::open(&config.db_path)?;
        let index = Index::open(&config.cache_dir)?;
        let transaction_log = TransactionLog::open(&config.log_dir)?;
        Ok(Self { database, index, transaction_log, config })
    }

    /// Path new package archives are cached at before being registered.
    #[must_use]
    pub fn cache_path(&self, name: &str, version: &str) -> PathBuf {
        self.config.cache_dir.join(format!("{name}-{version}.alp"))
    }
}
