//! Breadth-first dependency resolution: turns a list of requested package
//! names into a conflict-free installation plan.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, warn};

use super::version::{compare_versions, version_meets_minimum};
use crate::Result;
use crate::db::Database;
use crate::types::{PackageMetadata, RepositoryEntry};

/// Looks up published package metadata by name. Implemented by the
/// repository index; abstracted here so the resolver can be tested
/// without a live catalog.
pub trait PackageSource {
    /// Return the highest-priority published entry for `name`, if any
    /// enabled repository carries it.
    fn get_package_metadata(&self, name: &str) -> Option<RepositoryEntry>;
}

/// The output of [`resolve`]: what to install, and why the rest of the
/// request could not be satisfied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedPlan {
    /// Packages to install, in discovery order (BFS from the request).
    pub install: Vec<RepositoryEntry>,
    /// Requested or transitively required package names that conflict
    /// with something already in the plan or already installed.
    pub conflicts: Vec<String>,
    /// Package names (optionally annotated with the unmet constraint)
    /// that could not be found or whose available version is too low.
    pub missing: Vec<String>,
}

impl ResolvedPlan {
    /// `true` iff the plan can be executed as-is: nothing missing, nothing
    /// conflicting.
    #[must_use]
    pub fn is_satisfiable(&self) -> bool {
        self.conflicts.is_empty() && self.missing.is_empty()
    }
}

/// What: Resolve a set of requested package names into an installation
/// plan, breadth-first, tightening version requirements as they are
/// discovered.
///
/// Inputs:
/// - `db`: the installation database, consulted for already-installed
///   versions and conflict membership.
/// - `source`: the repository index (or a test double) to look up
///   candidate metadata.
/// - `requested`: package names the caller asked to install.
///
/// Output:
/// - `Ok(ResolvedPlan)`, always — an unsatisfiable request produces a plan
///   with non-empty `conflicts`/`missing` rather than an error; callers
///   decide whether that is fatal.
/// - `Err` only if the database itself fails.
///
/// Details:
/// - Deterministic: the same `requested` list and the same database and
///   repository state always produce the same plan, because packages are
///   dequeued and the plan is built in a single well-defined order.
pub fn resolve(
    db: &Database,
    source: &impl PackageSource,
    requested: &[String],
) -> Result<ResolvedPlan> {
    let mut plan = ResolvedPlan::default();
    let mut requirements: HashMap<String, String> = HashMap::new();
    let mut visited: HashMap<String, Option<String>> = HashMap::new();
    let mut queue: VecDeque<String> = requested.iter().cloned().collect();

    while let Some(name) = queue.pop_front() {
        let req = requirements.get(&name).cloned();

        if let Some(prev) = visited.get(&name) {
            let strictly_stronger = match (&req, prev) {
                (Some(r), Some(p)) => compare_versions(r, p) == std::cmp::Ordering::Greater,
                (Some(_), None) => true,
                _ => false,
            };
            if !strictly_stronger {
                continue;
            }
        }
        visited.insert(name.clone(), req.clone());

        let Some(entry) = source.get_package_metadata(&name) else {
            debug!(package = %name, "no repository carries this package");
            plan.missing.push(name);
            continue;
        };

        if let Some(req) = &req {
            if !version_meets_minimum(&entry.metadata.version, req) {
                plan.missing.push(format!(
                    "{name}>={req} (available: {})",
                    entry.metadata.version
                ));
                continue;
            }
        }

        if let Some(installed) = db.get_package(&name)? {
            let floor = req.as_deref().unwrap_or(&entry.metadata.version);
            if version_meets_minimum(&installed.version, floor) {
                continue;
            }
        }

        if conflicts_with_plan_or_installed(db, &entry.metadata, &plan.install)? {
            plan.conflicts.push(name);
            continue;
        }

        if let Some(existing) = plan.install.iter_mut().find(|p| p.metadata.name == name) {
            *existing = entry.clone();
        } else {
            plan.install.push(entry.clone());
        }

        for dep in &entry.metadata.dependencies {
            let (dep_name, dep_version) = PackageMetadata::parse_dependency(dep);
            let dep_name = dep_name.to_string();

            if let Some(dep_version) = dep_version {
                let should_requeue = match requirements.get(&dep_name) {
                    Some(existing) => {
                        compare_versions(dep_version, existing) == std::cmp::Ordering::Greater
                    }
                    None => true,
                };
                if should_requeue {
                    requirements.insert(dep_name.clone(), dep_version.to_string());
                    if visited.contains_key(&dep_name) {
                        queue.push_back(dep_name.clone());
                    }
                }
            }

            let sufficient_already = match db.get_package(&dep_name)? {
                Some(installed) => {
                    let floor = requirements.get(&dep_name).map(String::as_str);
                    match floor {
                        Some(floor) => version_meets_minimum(&installed.version, floor),
                        None => true,
                    }
                }
                None => false,
            };
            if !sufficient_already {
                queue.push_back(dep_name);
            }
        }
    }

    if !plan.missing.is_empty() || !plan.conflicts.is_empty() {
        warn!(
            missing = plan.missing.len(),
            conflicts = plan.conflicts.len(),
            "resolution produced an unsatisfiable plan"
        );
    }
    Ok(plan)
}

fn conflicts_with_plan_or_installed(
    db: &Database,
    candidate: &PackageMetadata,
    planned: &[RepositoryEntry],
) -> Result<bool> {
    for entry in planned {
        if candidate.conflicts.iter().any(|c| c == &entry.metadata.name) {
            return Ok(true);
        }
        if entry.metadata.conflicts.iter().any(|c| c == &candidate.name) {
            return Ok(true);
        }
    }
    for conflict in &candidate.conflicts {
        if db.is_installed(conflict)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// What: Determine whether an installed package can be safely removed.
///
/// Inputs:
/// - `db`: the installation database.
/// - `name`: the package being considered for removal.
///
/// Output:
/// - `Ok((true, []))` if nothing installed depends on `name`.
/// - `Ok((false, dependents))` listing the installed packages that do.
pub fn can_remove(db: &Database, name: &str) -> Result<(bool, Vec<String>)> {
    let dependents = db.reverse_dependencies(name)?;
    if dependents.is_empty() {
        Ok((true, Vec::new()))
    } else {
        Ok((false, dependents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    struct FakeSource {
        entries: Map<String, RepositoryEntry>,
    }

    impl FakeSource {
        fn new(metas: Vec<PackageMetadata>) -> Self {
            let entries = metas
                .into_iter()
                .map(|metadata| {
                    let name = metadata.name.clone();
                    (
                        name,
                        RepositoryEntry {
                            metadata,
                            repository: "main".to_string(),
                            repository_url: "file:///repo".to_string(),
                        },
                    )
                })
                .collect();
            Self { entries }
        }
    }

    impl PackageSource for FakeSource {
        fn get_package_metadata(&self, name: &str) -> Option<RepositoryEntry> {
            self.entries.get(name).cloned()
        }
    }

    fn meta(name: &str, version: &str, deps: Vec<&str>, conflicts: Vec<&str>) -> PackageMetadata {
        PackageMetadata {
            name: name.to_string(),
            version: version.to_string(),
            architecture: "x86_64".to_string(),
            dependencies: deps.into_iter().map(str::to_string).collect(),
            conflicts: conflicts.into_iter().map(str::to_string).collect(),
            size: 1,
            checksum: "a".repeat(64),
            ..Default::default()
        }
    }

    #[test]
    fn resolves_fresh_install_with_no_dependencies() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeSource::new(vec![meta("app", "1.0.0", vec![], vec![])]);
        let plan = resolve(&db, &source, &["app".to_string()]).unwrap();
        assert!(plan.is_satisfiable());
        assert_eq!(plan.install.len(), 1);
        assert_eq!(plan.install[0].metadata.name, "app");
    }

    #[test]
    fn pulls_in_transitive_dependency() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeSource::new(vec![
            meta("app", "1.0.0", vec!["lib>=2.0.0"], vec![]),
            meta("lib", "2.0.0", vec![], vec![]),
        ]);
        let plan = resolve(&db, &source, &["app".to_string()]).unwrap();
        assert!(plan.is_satisfiable());
        let names: Vec<_> = plan.install.iter().map(|e| e.metadata.name.clone()).collect();
        assert!(names.contains(&"app".to_string()));
        assert!(names.contains(&"lib".to_string()));
    }

    #[test]
    fn reports_missing_dependency() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeSource::new(vec![meta("app", "1.0.0", vec!["lib"], vec![])]);
        let plan = resolve(&db, &source, &["app".to_string()]).unwrap();
        assert!(!plan.is_satisfiable());
        assert_eq!(plan.missing, vec!["lib".to_string()]);
    }

    #[test]
    fn reports_version_too_low() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeSource::new(vec![
            meta("app", "1.0.0", vec!["lib>=2.0.0"], vec![]),
            meta("lib", "1.5.0", vec![], vec![]),
        ]);
        let plan = resolve(&db, &source, &["app".to_string()]).unwrap();
        assert!(!plan.is_satisfiable());
        assert_eq!(plan.missing.len(), 1);
        assert!(plan.missing[0].starts_with("lib>=2.0.0"));
    }

    #[test]
    fn skips_package_already_installed_at_sufficient_version() {
        let mut db = Database::open_in_memory().unwrap();
        db.add_package(&meta("lib", "2.0.0", vec![], vec![])).unwrap();
        let source = FakeSource::new(vec![
            meta("app", "1.0.0", vec!["lib>=1.0.0"], vec![]),
            meta("lib", "2.0.0", vec![], vec![]),
        ]);
        let plan = resolve(&db, &source, &["app".to_string()]).unwrap();
        assert!(plan.is_satisfiable());
        let names: Vec<_> = plan.install.iter().map(|e| e.metadata.name.clone()).collect();
        assert_eq!(names, vec!["app".to_string()]);
    }

    #[test]
    fn detects_declared_conflict_between_planned_packages() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeSource::new(vec![
            meta("app", "1.0.0", vec!["other"], vec![]),
            meta("other", "1.0.0", vec![], vec!["app"]),
        ]);
        let plan = resolve(&db, &source, &["app".to_string(), "other".to_string()]).unwrap();
        assert!(plan.conflicts.contains(&"other".to_string()));
    }

    #[test]
    fn detects_conflict_with_already_installed_package() {
        let mut db = Database::open_in_memory().unwrap();
        db.add_package(&meta("old", "1.0.0", vec![], vec![])).unwrap();
        let source = FakeSource::new(vec![meta("new", "1.0.0", vec![], vec!["old"])]);
        let plan = resolve(&db, &source, &["new".to_string()]).unwrap();
        assert!(plan.conflicts.contains(&"new".to_string()));
    }

    #[test]
    fn can_remove_refuses_when_dependents_exist() {
        let mut db = Database::open_in_memory().unwrap();
        db.add_package(&meta("lib", "1.0.0", vec![], vec![])).unwrap();
        db.add_package(&meta("app", "1.0.0", vec!["lib"], vec![])).unwrap();
        let (ok, dependents) = can_remove(&db, "lib").unwrap();
        assert!(!ok);
        assert_eq!(dependents, vec!["app".to_string()]);
    }

    #[test]
    fn can_remove_allows_leaf_packages() {
        let mut db = Database::open_in_memory().unwrap();
        db.add_package(&meta("lib", "1.0.0", vec![], vec![])).unwrap();
        let (ok, dependents) = can_remove(&db, "lib").unwrap();
        assert!(ok);
        assert!(dependents.is_empty());
    }
}
