//! Removal procedure: per-package, tolerant of individual refusals.
//!
//! Unlike install, a remove transaction is not all-or-nothing (spec.md
//! §4.5: "refusal is a user-fixable condition rather than a fault") — one
//! package blocked by reverse dependencies does not abort the rest of the
//! batch.

use tracing::{info, instrument, warn};

use crate::Result;
use crate::installer::context::AlpContext;
use crate::resolver::can_remove;
use crate::types::{TransactionRecord, TransactionStatus, TransactionType, next_transaction_id};

/// Outcome of attempting to remove a single requested package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The package was installed, nothing depends on it, and it was
    /// deleted from the database.
    Removed,
    /// The package was not installed; nothing to do.
    NotInstalled,
    /// Other installed packages still depend on this one; the listed
    /// names are the blockers.
    Blocked(Vec<String>),
}

/// Per-package result of a remove transaction, in request order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovalReport {
    /// The package name as requested.
    pub package: String,
    /// What happened to it.
    pub outcome: RemovalOutcome,
}

/// What: Remove every name in `requested`, isolating per-package refusals.
///
/// Inputs:
/// - `ctx`: the opened context.
/// - `requested`: package names the caller asked to remove.
///
/// Output:
/// - `Ok((record, reports))`: `record.status` is always `Completed` —
///   per-package blocks are reported in `reports`, not transaction
///   failure, per spec.md §7's propagation policy ("per-package errors
///   during remove are isolated... and do not abort the transaction").
/// - `Err` only if the database itself fails (a fault, not a refusal).
#[instrument(skip(ctx), fields(requested = requested.len()))]
pub fn remove(
    ctx: &mut AlpContext,
    requested: &[String],
) -> Result<(TransactionRecord, Vec<RemovalReport>)> {
    let mut record =
        TransactionRecord::pending(next_transaction_id(), TransactionType::Remove, requested.to_vec());
    ctx.transaction_log.append(&record)?;
    record = record.with_status(TransactionStatus::InProgress);
    ctx.transaction_log.append(&record)?;

    let mut reports = Vec::with_capacity(requested.len());

    for name in requested {
        if !ctx.database.is_installed(name)? {
            info!(package = %name, "not installed, nothing to remove");
            reports.push(RemovalReport { package: name.clone(), outcome: RemovalOutcome::NotInstalled });
            continue;
        }

        let (allowed, dependents) = can_remove(&ctx.database, name)?;
        if !allowed {
            warn!(package = %name, blockers = ?dependents, "removal blocked by reverse dependencies");
            reports.push(RemovalReport {
                package: name.clone(),
                outcome: RemovalOutcome::Blocked(dependents),
            });
            continue;
        }

        ctx.database.remove_package(name)?;
        record = record.with_action(crate::types::TransactionAction {
            action: "remove".to_string(),
            package: name.clone(),
            version: String::new(),
        });
        ctx.transaction_log.append(&record)?;
        info!(package = %name, "removed");
        reports.push(RemovalReport { package: name.clone(), outcome: RemovalOutcome::Removed });
    }

    record = record.with_status(TransactionStatus::Completed);
    ctx.transaction_log.append(&record)?;
    Ok((record, reports))
}
