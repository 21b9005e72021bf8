//! Black-box end-to-end scenarios (spec.md §8) driven entirely through
//! `file://` repositories so they run offline and deterministically.

use alp::config::AlpConfig;
use alp::format::Package;
use alp::installer::{AlpContext, RemovalOutcome, install, remove};
use alp::types::{PackageMetadata, RepositoryCatalog, TransactionStatus};

struct Harness {
    ctx: AlpContext,
    repo_dir: tempfile::TempDir,
    _root: tempfile::TempDir,
}

fn meta(name: &str, version: &str, deps: Vec<&str>, conflicts: Vec<&str>) -> PackageMetadata {
    PackageMetadata {
        name: name.to_string(),
        version: version.to_string(),
        architecture: "x86_64".to_string(),
        dependencies: deps.into_iter().map(str::to_string).collect(),
        conflicts: conflicts.into_iter().map(str::to_string).collect(),
        ..Default::default()
    }
}

/// Builds a real `.alp` archive under `{repo_dir}/packages/{name}-{version}.alp`
/// and returns its metadata (with a correct, freshly computed checksum).
fn build_package(repo_dir: &std::path::Path, name: &str, version: &str, deps: Vec<&str>) -> PackageMetadata {
    let src = tempfile::tempdir().unwrap();
    std::fs::write(src.path().join("payload.txt"), format!("{name}-{version} payload")).unwrap();
    let output_base = repo_dir.join("packages").join(format!("{name}-{version}"));
    let built = Package::create(name, version, src.path(), &output_base, meta(name, version, deps, vec![]))
        .unwrap();
    built.metadata
}

impl Harness {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let repo_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(repo_dir.path().join("packages")).unwrap();

        let config = AlpConfig {
            db_path: root.path().join("packages.db"),
            cache_dir: root.path().join("cache"),
            log_dir: root.path().join("logs"),
        };
        let ctx = AlpContext::open(config).unwrap();
        Self { ctx, repo_dir, _root: root }
    }

    fn publish(&mut self, packages: Vec<PackageMetadata>) {
        let catalog = RepositoryCatalog {
            name: "main".to_string(),
            description: "test repository".to_string(),
            version: "1".to_string(),
            packages,
        };
        std::fs::write(
            self.repo_dir.path().join("index.json"),
            serde_json::to_vec(&catalog).unwrap(),
        )
        .unwrap();

        let url = format!("file://{}", self.repo_dir.path().display());
        self.ctx.database.add_repository("main", &url, 0).unwrap();
        assert!(self.ctx.index.update_index(&url).unwrap(), "index must fetch cleanly");
    }
}

#[test]
fn fresh_install_with_no_dependencies() {
    let mut h = Harness::new();
    let hello = build_package(h.repo_dir.path(), "hello-world", "1.0.0", vec![]);
    h.publish(vec![hello]);

    let record =
        install(&mut h.ctx, &["hello-world".to_string()], false, |_plan| true, &|_, _, _| {}).unwrap();

    assert_eq!(record.status, TransactionStatus::Completed);
    assert!(h.ctx.database.is_installed("hello-world").unwrap());
}

#[test]
fn transitive_dependency_is_pulled_in_and_installed() {
    let mut h = Harness::new();
    let lib = build_package(h.repo_dir.path(), "lib", "2.1.0", vec![]);
    let app = build_package(h.repo_dir.path(), "app", "1.0.0", vec!["lib>=2.0.0"]);
    h.publish(vec![app, lib]);

    let record = install(&mut h.ctx, &["app".to_string()], false, |_plan| true, &|_, _, _| {}).unwrap();

    assert_eq!(record.status, TransactionStatus::Completed);
    assert!(h.ctx.database.is_installed("app").unwrap());
    assert!(h.ctx.database.is_installed("lib").unwrap());
}

#[test]
fn missing_dependency_fails_the_transaction_without_mutating_the_db() {
    let mut h = Harness::new();
    let app = build_package(h.repo_dir.path(), "app", "1.0.0", vec!["lib>=2.0.0"]);
    h.publish(vec![app]);

    let record = install(&mut h.ctx, &["app".to_string()], false, |_plan| true, &|_, _, _| {}).unwrap();

    assert_eq!(record.status, TransactionStatus::Failed);
    assert!(record.error.as_deref().unwrap_or_default().contains("lib"));
    assert!(!h.ctx.database.is_installed("app").unwrap());
}

#[test]
fn version_too_low_is_reported_as_missing() {
    let mut h = Harness::new();
    let lib = build_package(h.repo_dir.path(), "lib", "1.5.0", vec![]);
    let app = build_package(h.repo_dir.path(), "app", "1.0.0", vec!["lib>=2.0.0"]);
    h.publish(vec![app, lib]);

    let record = install(&mut h.ctx, &["app".to_string()], false, |_plan| true, &|_, _, _| {}).unwrap();

    assert_eq!(record.status, TransactionStatus::Failed);
    let error = record.error.unwrap();
    assert!(error.contains("lib>=2.0.0"));
    assert!(error.contains("1.5.0"));
}

#[test]
fn checksum_mismatch_rolls_back_the_whole_transaction() {
    let mut h = Harness::new();
    let a = build_package(h.repo_dir.path(), "a", "1.0.0", vec![]);
    let mut b = build_package(h.repo_dir.path(), "b", "1.0.0", vec![]);
    b.checksum = "0".repeat(64);
    h.publish(vec![a, b]);

    let cache_dir = h.ctx.config.cache_dir.clone();
    let result = install(&mut h.ctx, &["a".to_string(), "b".to_string()], false, |_plan| true, &|_, _, _| {});

    assert!(result.is_err());
    assert!(!h.ctx.database.is_installed("a").unwrap());
    assert!(!h.ctx.database.is_installed("b").unwrap());
    assert!(!cache_dir.join("a-1.0.0.alp").exists());
    assert!(!cache_dir.join("b-1.0.0.alp").exists());

    let tail = h.ctx.transaction_log.tail(1).unwrap();
    assert_eq!(tail[0].status, TransactionStatus::Failed);
    assert!(tail[0].error.as_deref().unwrap_or_default().contains("checksum"));
}

#[test]
fn upgrade_rollback_restores_the_prior_version() {
    let mut h = Harness::new();
    let lib_old = build_package(h.repo_dir.path(), "lib", "1.0.0", vec![]);
    h.publish(vec![lib_old]);
    let first = install(&mut h.ctx, &["lib".to_string()], false, |_plan| true, &|_, _, _| {}).unwrap();
    assert_eq!(first.status, TransactionStatus::Completed);

    let lib_new = build_package(h.repo_dir.path(), "lib", "2.0.0", vec![]);
    // "tool" is published in the catalog but its archive is never written to
    // disk, so the file:// download fails mid-transaction.
    let mut tool = meta("tool", "1.0.0", vec![], vec![]);
    tool.checksum = "1".repeat(64);
    h.publish(vec![lib_new, tool]);

    let result = install(
        &mut h.ctx,
        &["lib".to_string(), "tool".to_string()],
        true,
        |_plan| true,
        &|_, _, _| {},
    );

    assert!(result.is_err());
    let restored = h.ctx.database.get_package("lib").unwrap().unwrap();
    assert_eq!(restored.version, "1.0.0");
    assert!(!h.ctx.database.is_installed("tool").unwrap());
}

#[test]
fn removal_is_refused_while_a_reverse_dependency_exists() {
    let mut h = Harness::new();
    let lib = build_package(h.repo_dir.path(), "lib", "1.0.0", vec![]);
    let app = build_package(h.repo_dir.path(), "app", "1.0.0", vec!["lib>=1.0.0"]);
    h.publish(vec![app, lib]);
    install(&mut h.ctx, &["app".to_string()], false, |_plan| true, &|_, _, _| {}).unwrap();

    let (record, reports) = remove(&mut h.ctx, &["lib".to_string()]).unwrap();

    assert_eq!(record.status, TransactionStatus::Completed);
    assert_eq!(reports.len(), 1);
    match &reports[0].outcome {
        RemovalOutcome::Blocked(dependents) => assert_eq!(dependents, &vec!["app".to_string()]),
        other => panic!("expected Blocked, got {other:?}"),
    }
    assert!(h.ctx.database.is_installed("lib").unwrap());
}
