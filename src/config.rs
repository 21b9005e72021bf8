//! Resolved configuration: the three filesystem roots an `AlpContext`
//! opens, assembled from environment variables (spec.md §6) with
//! struct-based defaults.

use std::path::PathBuf;

/// Filesystem layout for one ALP invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlpConfig {
    /// Path to the SQLite installation database file.
    pub db_path: PathBuf,
    /// Root directory for cached package archives and repository indexes.
    pub cache_dir: PathBuf,
    /// Directory holding `transactions.log`.
    pub log_dir: PathBuf,
}

impl AlpConfig {
    /// What: Assemble configuration from `ALP_DB_PATH`, `ALP_CACHE_DIR`,
    /// and `ALP_LOG_DIR`, falling back to the documented defaults.
    ///
    /// Inputs: none (reads the process environment).
    ///
    /// Output: `AlpConfig` with every field populated.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            db_path: crate::env::db_path(),
            cache_dir: crate::env::cache_dir(),
            log_dir: crate::env::log_dir(),
        }
    }
}

impl Default for AlpConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_uses_documented_defaults_when_unset() {
        let config = AlpConfig::from_env();
        assert!(config.db_path.ends_with("alp_data/packages.db"));
        assert!(config.cache_dir.ends_with("alp_data/cache"));
        assert!(config.log_dir.ends_with("alp_data/logs"));
    }
}
