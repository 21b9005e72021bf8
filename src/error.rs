//! Unified error type for alp.

use thiserror::Error;

/// Unified error type for all alp core operations.
///
/// Covers the failure modes of every subsystem (package format, database,
/// resolver, installer) with one enum so callers can match on error kind
/// without downcasting.
#[derive(Error, Debug)]
pub enum AlpError {
    /// The resolver could not satisfy a declared dependency.
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// A minimum version requirement exceeds every available candidate.
    #[error("unsatisfiable constraint: {0}")]
    UnsatisfiableConstraint(String),

    /// Two packages in the plan or installed set conflict.
    #[error("conflict detected: {0}")]
    ConflictDetected(String),

    /// Fetching a package or repository index failed in transport.
    #[error("download failed for {package}: {reason}")]
    DownloadFailed {
        /// Name of the package or resource being fetched.
        package: String,
        /// Human-readable transport failure reason.
        reason: String,
    },

    /// The downloaded payload's SHA-256 does not match declared `checksum`.
    #[error("checksum mismatch for {package}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Package whose payload failed verification.
        package: String,
        /// Checksum declared in the package metadata.
        expected: String,
        /// Checksum actually computed from the payload bytes.
        actual: String,
    },

    /// An archive is malformed or its metadata member is missing/invalid.
    #[error("package format error: {0}")]
    PackageFormatError(String),

    /// The installation database failed to read or write.
    #[error("database error: {0}")]
    DatabaseError(String),

    /// The user declined a confirmation prompt.
    #[error("user cancelled")]
    UserCancelled,

    /// Removal was refused because other installed packages depend on it.
    #[error("cannot remove {name}: required by {dependents:?}")]
    ReverseDependencyBlock {
        /// Package the caller attempted to remove.
        name: String,
        /// Installed packages whose dependencies name it.
        dependents: Vec<String>,
    },

    /// Filesystem error surfacing from any of the above.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite error surfacing from the installation database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON (de)serialization error, mainly repository index documents.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error, package metadata documents.
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error, package metadata documents.
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Network transport error. Built from `reqwest::Error` when the
    /// `network` feature is enabled; kept as a plain string variant so the
    /// enum's shape does not change across feature combinations.
    #[error("network error: {0}")]
    Network(String),
}

#[cfg(feature = "network")]
impl From<reqwest::Error> for AlpError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Result type alias for alp core operations.
pub type Result<T> = std::result::Result<T, AlpError>;
