//! Environment variable configuration for alp.
//!
//! Zero-code configuration for the three paths the core needs: the
//! installation database file, the package/index cache root, and the
//! transaction log directory (spec.md §6).

use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "./alp_data/packages.db";
const DEFAULT_CACHE_DIR: &str = "./alp_data/cache";
const DEFAULT_LOG_DIR: &str = "./alp_data/logs";

/// What: Read the installation database path from `ALP_DB_PATH`.
///
/// Inputs: none.
///
/// Output: the environment value if set and non-empty, otherwise
/// `./alp_data/packages.db`.
#[must_use]
pub fn db_path() -> PathBuf {
    env_path("ALP_DB_PATH", DEFAULT_DB_PATH)
}

/// What: Read the package and index cache directory from `ALP_CACHE_DIR`.
///
/// Inputs: none.
///
/// Output: the environment value if set and non-empty, otherwise
/// `./alp_data/cache`.
#[must_use]
pub fn cache_dir() -> PathBuf {
    env_path("ALP_CACHE_DIR", DEFAULT_CACHE_DIR)
}

/// What: Read the transaction log directory from `ALP_LOG_DIR`.
///
/// Inputs: none.
///
/// Output: the environment value if set and non-empty, otherwise
/// `./alp_data/logs`.
#[must_use]
pub fn log_dir() -> PathBuf {
    env_path("ALP_LOG_DIR", DEFAULT_LOG_DIR)
}

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var(var)
        .ok()
        .filter(|value| !value.is_empty())
        .map_or_else(|| PathBuf::from(default), PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize these tests so
    // they don't race each other's set_var/remove_var calls.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn db_path_defaults_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::remove_var("ALP_DB_PATH");
        }
        assert_eq!(db_path(), PathBuf::from(DEFAULT_DB_PATH));
    }

    #[test]
    fn db_path_honors_environment_override() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("ALP_DB_PATH", "/tmp/custom/packages.db");
        }
        assert_eq!(db_path(), PathBuf::from("/tmp/custom/packages.db"));
        unsafe {
            std::env::remove_var("ALP_DB_PATH");
        }
    }

    #[test]
    fn empty_value_is_treated_as_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("ALP_CACHE_DIR", "");
        }
        assert_eq!(cache_dir(), PathBuf::from(DEFAULT_CACHE_DIR));
        unsafe {
            std::env::remove_var("ALP_CACHE_DIR");
        }
    }
}
