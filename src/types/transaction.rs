//! Transaction log record types — the line-delimited, append-only history
//! of every install/remove/update/upgrade attempt.

use serde::{Deserialize, Serialize};

/// The kind of user-level operation a transaction represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Installing one or more packages.
    Install,
    /// Removing one or more packages.
    Remove,
    /// Updating repository indexes.
    Update,
    /// Upgrading already-installed packages to newer versions.
    Upgrade,
}

/// The state machine a transaction traverses:
///
/// ```text
/// pending -> in_progress -> completed
///                |
///                +-> failed -> (rolled_back on successful compensation)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Recorded before planning.
    Pending,
    /// Recorded after confirmation, before any mutation.
    InProgress,
    /// Terminal: every planned package is present and recorded.
    Completed,
    /// Terminal: a per-package failure occurred; `error` is populated.
    Failed,
    /// Post-hoc annotation: a failed transaction whose compensation
    /// (rollback) completed.
    RolledBack,
}

/// One action taken while executing a transaction (one package install or
/// removal), recorded for audit purposes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionAction {
    /// `"install"` or `"remove"`.
    pub action: String,
    /// The package name the action applied to.
    pub package: String,
    /// The package version the action applied to, when known.
    #[serde(default)]
    pub version: String,
}

/// An immutable transaction record, appended once per status transition.
/// Readers replaying the log by `id` treat the last line for a given `id`
/// as authoritative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Monotonically increasing textual key (sub-second timestamp).
    pub id: String,
    /// The kind of operation this transaction represents.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Package names requested for this transaction.
    pub packages: Vec<String>,
    /// Current status.
    pub status: TransactionStatus,
    /// RFC 3339 timestamp of this record.
    pub timestamp: String,
    /// Actions taken so far in this transaction.
    #[serde(default)]
    pub actions: Vec<TransactionAction>,
    /// Error description, populated only when `status == Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransactionRecord {
    /// What: Start a new transaction record in the `pending` state.
    ///
    /// Inputs:
    /// - `id`: monotonically increasing textual key for this transaction.
    /// - `kind`: the operation type.
    /// - `packages`: the requested package names.
    ///
    /// Output:
    /// - A `TransactionRecord` with `status = Pending`, no actions, no
    ///   error, and `timestamp` set to the current instant.
    #[must_use]
    pub fn pending(id: String, kind: TransactionType, packages: Vec<String>) -> Self {
        Self {
            id,
            kind,
            packages,
            status: TransactionStatus::Pending,
            timestamp: chrono::Utc::now().to_rfc3339(),
            actions: Vec::new(),
            error: None,
        }
    }

    /// What: Produce the next record for this transaction in a new status.
    ///
    /// Inputs:
    /// - `self`: the current record.
    /// - `status`: the status to transition into.
    ///
    /// Output:
    /// - A clone of `self` with `status` and `timestamp` updated; `actions`
    ///   and `error` are carried over unchanged so the caller can set them
    ///   explicitly before appending.
    #[must_use]
    pub fn with_status(&self, status: TransactionStatus) -> Self {
        let mut next = self.clone();
        next.status = status;
        next.timestamp = chrono::Utc::now().to_rfc3339();
        next
    }

    /// What: Attach an error description and transition to `failed`.
    ///
    /// Inputs:
    /// - `self`: the current record.
    /// - `error`: a human-readable description of the failure.
    ///
    /// Output:
    /// - A clone of `self` with `status = Failed` and `error` populated.
    #[must_use]
    pub fn failed(&self, error: impl Into<String>) -> Self {
        let mut next = self.with_status(TransactionStatus::Failed);
        next.error = Some(error.into());
        next
    }

    /// What: Append an action to this record.
    ///
    /// Inputs:
    /// - `self`: the record being built up during execution.
    /// - `action`: the action performed.
    ///
    /// Output: `Self` with `action` appended, for chaining.
    #[must_use]
    pub fn with_action(mut self, action: TransactionAction) -> Self {
        self.actions.push(action);
        self
    }
}

/// What: Derive a monotonically increasing textual transaction id from the
/// current instant.
///
/// Inputs: none.
///
/// Output:
/// - A string of the form `{unix_seconds}.{nanos}`, which sorts
///   lexicographically in timestamp order because the seconds component is
///   a fixed-width decimal for any date this crate will run against.
///
/// Details:
/// - Sub-second resolution distinguishes transactions started within the
///   same second.
#[must_use]
pub fn next_transaction_id() -> String {
    let now = chrono::Utc::now();
    format!("{}.{:09}", now.timestamp(), now.timestamp_subsec_nanos())
}
