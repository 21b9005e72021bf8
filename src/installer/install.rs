//! Install procedure: resolve, confirm, snapshot, fetch-verify-register
//! per package, rolling back everything on the first per-package failure.
//!
//! Re-expressed per spec.md §9's Design Notes as a staged procedure
//! returning a `Result` rather than a `try`/`except`-shaped loop: the
//! rollback compensator ([`rollback_partial_install`]) is a separate,
//! independently testable function invoked from the failure arm.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use tracing::{info, instrument, warn};

use crate::Result;
use crate::db::Database;
use crate::error::AlpError;
use crate::format::Package;
use crate::installer::context::AlpContext;
use crate::installer::download::download;
use crate::repo::{Index, IndexSource};
use crate::resolver::resolve;
use crate::types::{
    PackageMetadata, RepositoryEntry, TransactionAction, TransactionRecord, TransactionStatus,
    TransactionType, next_transaction_id,
};

/// What: Run the full install transaction for `requested`.
///
/// Inputs:
/// - `ctx`: the opened context (database, index, log, cache directory).
/// - `requested`: package names the caller asked to install.
/// - `no_deps`: when `true`, skip dependency resolution and install
///   exactly the requested names at whatever version each repository
///   publishes.
/// - `confirm`: called once with the resolved plan; returning `false`
///   cancels the transaction. The CLI's `--yes` flag and stdin prompt are
///   expressed entirely in this closure — the core never reads stdin.
/// - `progress`: called as `(package_name, bytes_so_far, total_bytes)`
///   while each archive downloads.
///
/// Output:
/// - `Ok(record)` whenever the transaction reaches a terminal status
///   without an in-flight exception: `completed`, or `failed` because the
///   plan was unsatisfiable or the user declined — these are structured
///   outcomes, not errors (spec.md §7: "Resolver errors are returned as
///   structured data, never thrown").
/// - `Err(original_error)` if a per-package failure occurred after at
///   least one mutation; rollback has already run and the transaction log
///   already carries a terminal `failed` record before this returns.
#[instrument(skip(ctx, confirm, progress), fields(requested = requested.len()))]
pub fn install(
    ctx: &mut AlpContext,
    requested: &[String],
    no_deps: bool,
    confirm: impl FnOnce(&[RepositoryEntry]) -> bool,
    progress: &dyn Fn(&str, u64, u64),
) -> Result<TransactionRecord> {
    let mut record =
        TransactionRecord::pending(next_transaction_id(), TransactionType::Install, requested.to_vec());
    ctx.transaction_log.append(&record)?;

    let to_install = if no_deps {
        let mut entries = Vec::new();
        for name in requested {
            if let Some(entry) = ctx.index.get_package_metadata(&ctx.database, name)? {
                entries.push(entry);
            }
        }
        entries
    } else {
        let source = IndexSource::new(&ctx.index, &ctx.database);
        let plan = resolve(&ctx.database, &source, requested)?;
        if !plan.is_satisfiable() {
            let mut reasons = Vec::new();
            if !plan.missing.is_empty() {
                reasons.push(format!("missing: {}", plan.missing.join(", ")));
            }
            if !plan.conflicts.is_empty() {
                reasons.push(format!("conflicts: {}", plan.conflicts.join(", ")));
            }
            record = record.failed(reasons.join("; "));
            ctx.transaction_log.append(&record)?;
            return Ok(record);
        }
        plan.install
    };

    if to_install.is_empty() {
        record = record.with_status(TransactionStatus::Completed);
        ctx.transaction_log.append(&record)?;
        return Ok(record);
    }

    if !confirm(&to_install) {
        record = record.failed("user cancelled");
        ctx.transaction_log.append(&record)?;
        return Ok(record);
    }

    record = record.with_status(TransactionStatus::InProgress);
    ctx.transaction_log.append(&record)?;

    let mut snapshots: HashMap<String, PackageMetadata> = HashMap::new();
    let mut newly_installed: HashSet<String> = HashSet::new();
    for entry in &to_install {
        match ctx.database.get_package(&entry.metadata.name)? {
            Some(existing) => {
                snapshots.insert(entry.metadata.name.clone(), existing);
            }
            None => {
                newly_installed.insert(entry.metadata.name.clone());
            }
        }
    }

    let mut downloaded_files: Vec<PathBuf> = Vec::new();
    let mut registered_new: Vec<String> = Vec::new();

    for entry in &to_install {
        match install_one(&mut ctx.database, &ctx.index, &ctx.config.cache_dir, entry, progress) {
            Ok((action, dest)) => {
                downloaded_files.push(dest);
                if newly_installed.contains(&entry.metadata.name) {
                    registered_new.push(entry.metadata.name.clone());
                }
                record = record.with_action(action);
                ctx.transaction_log.append(&record)?;
                info!(package = %entry.metadata.name, version = %entry.metadata.version, "installed");
            }
            Err(err) => {
                warn!(package = %entry.metadata.name, error = %err, "installation failed, rolling back");
                rollback_partial_install(&mut ctx.database, &registered_new, &snapshots);
                cleanup_cache_files(&downloaded_files);
                record = record.failed(err.to_string());
                ctx.transaction_log.append(&record)?;
                return Err(err);
            }
        }
    }

    record = record.with_status(TransactionStatus::Completed);
    ctx.transaction_log.append(&record)?;
    Ok(record)
}

fn install_one(
    database: &mut Database,
    index: &Index,
    cache_dir: &std::path::Path,
    entry: &RepositoryEntry,
    progress: &dyn Fn(&str, u64, u64),
) -> Result<(TransactionAction, PathBuf)> {
    let name = &entry.metadata.name;
    let version = &entry.metadata.version;
    let dest = cache_dir.join(format!("{name}-{version}.alp"));

    let url = index.get_package_url(database, name, version)?.ok_or_else(|| {
        AlpError::DownloadFailed {
            package: name.clone(),
            reason: "no repository carries this package".to_string(),
        }
    })?;

    download(&url, &dest, &|downloaded, total| progress(name, downloaded, total))
        .map_err(|err| AlpError::DownloadFailed { package: name.clone(), reason: err.to_string() })?;

    if !entry.metadata.checksum.is_empty() {
        let loaded = Package::load(&dest)?;
        let actual = loaded.compute_checksum()?;
        if actual != entry.metadata.checksum {
            return Err(AlpError::ChecksumMismatch {
                package: name.clone(),
                expected: entry.metadata.checksum.clone(),
                actual,
            });
        }
    }

    database.add_package(&entry.metadata)?;

    Ok((
        TransactionAction {
            action: "install".to_string(),
            package: name.clone(),
            version: version.clone(),
        },
        dest,
    ))
}

/// What: Undo a partially executed install after a per-package failure.
///
/// Inputs:
/// - `database`: the installation database to restore.
/// - `registered_new`: names successfully added this transaction that were
///   not previously installed — removed entirely.
/// - `snapshots`: pre-transaction records for names that were already
///   installed and got overwritten — restored verbatim.
///
/// Output: none; every step is best-effort. Individual failures are
/// logged, never abort the remaining compensation steps (spec.md §4.5
/// step 7).
fn rollback_partial_install(
    database: &mut Database,
    registered_new: &[String],
    snapshots: &HashMap<String, PackageMetadata>,
) {
    for name in registered_new {
        if let Err(err) = database.remove_package(name) {
            warn!(package = %name, error = %err, "rollback: failed to remove newly installed package");
        }
    }
    for (name, snapshot) in snapshots {
        if let Err(err) = database.add_package(snapshot) {
            warn!(package = %name, error = %err, "rollback: failed to restore previous package record");
        }
    }
}

fn cleanup_cache_files(paths: &[PathBuf]) {
    for path in paths {
        if let Err(err) = std::fs::remove_file(path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %err, "rollback: failed to delete cache file");
            }
        }
    }
}
