//! Install List Builder: turns an activated [`SuiteConfig`] plus the
//! package universe into a dependency-closed, ordered list of packages.

use std::collections::BTreeSet;

use debuniverse::{Package, PackageTable, Priority, Status};

use crate::context::Context;
use crate::suiteconfig::{PackageToken, SuiteConfig};

/// Builds the initial InstallList from every active section's active
/// package groups, the universe-wide `essential`/priority scan, and the
/// `Context`'s CLI `--include`/`--exclude` overlay.
pub fn build_install_list<'a>(
    suite: &SuiteConfig,
    table: &'a PackageTable,
    ctx: &Context,
) -> Vec<&'a Package> {
    let mut include: BTreeSet<String> = BTreeSet::new();
    let mut exclude: BTreeSet<String> = BTreeSet::new();
    let mut select_required = false;
    let mut select_important = false;

    for section in suite.sections.values().filter(|s| s.activate) {
        for group in section.packages.iter().filter(|g| g.activate) {
            for token in &group.packages {
                match token {
                    PackageToken::PriorityRequired => select_required = true,
                    PackageToken::PriorityImportant => select_important = true,
                    PackageToken::Exclude(name) => {
                        if table.get(name).is_some() {
                            exclude.insert(name.clone());
                        } else {
                            tracing::info!(package = %name, "excluded package not found in universe");
                        }
                    }
                    PackageToken::Include(name) => {
                        if table.get(name).is_some() {
                            include.insert(name.clone());
                        } else {
                            tracing::warn!(package = %name, "included package not found in universe");
                        }
                    }
                }
            }
        }
    }

    for p in table.iter() {
        if p.essential
            || (select_required && p.priority == Priority::Required)
            || (select_important && p.priority == Priority::Important)
        {
            include.insert(p.name.clone());
        }
    }

    apply_overlay(table, &ctx.include, &mut include, &mut exclude, true);
    apply_overlay(table, &ctx.exclude, &mut exclude, &mut include, false);

    let candidates: Vec<&str> = include
        .iter()
        .filter(|name| !exclude.contains(*name))
        .map(String::as_str)
        .collect();

    table
        .resolve_dependencies(candidates)
        .into_iter()
        .filter(|p| !exclude.contains(&p.name))
        .collect()
}

/// Applies a CLI `--include`/`--exclude` overlay onto `target`, removing
/// any overlapping name from `other` (an explicit CLI choice wins over
/// whatever the suite config selected). Misses are non-fatal.
fn apply_overlay(
    table: &PackageTable,
    names: &[String],
    target: &mut BTreeSet<String>,
    other: &mut BTreeSet<String>,
    is_include: bool,
) {
    for name in names {
        if table.get(name).is_none() {
            let verb = if is_include { "--include" } else { "--exclude" };
            tracing::warn!(package = %name, option = verb, "package not found in universe");
            continue;
        }
        other.remove(name);
        target.insert(name.clone());
    }
}

/// Filters `install` to packages at or above `min_priority` and below
/// `max_status`, resolves the dependency closure of that seed set, then
/// re-filters the closure by `max_status`.
///
/// Used by the Action Engine to materialize the package list for a given
/// priority threshold without re-running the full Install List Builder.
/// Takes and returns package *names* rather than borrowed [`Package`]s:
/// the Action Engine calls this in between mutating the same table's
/// package statuses, so the result can't hold a borrow of it.
pub fn install_list(
    table: &PackageTable,
    install: &[String],
    min_priority: Priority,
    max_status: Status,
) -> Vec<String> {
    let seeds: Vec<&str> = install
        .iter()
        .filter_map(|name| table.get(name))
        .filter(|p| p.priority >= min_priority && p.status < max_status)
        .map(|p| p.name.as_str())
        .collect();

    table
        .resolve_dependencies(seeds)
        .into_iter()
        .filter(|p| p.status < max_status)
        .map(|p| p.name.clone())
        .collect()
}

/// Single-package seed plus its dependency closure, filtered by status.
pub fn install_list_package(table: &PackageTable, name: &str, max_status: Status) -> Vec<String> {
    table
        .resolve_dependencies([name])
        .into_iter()
        .filter(|p| p.status < max_status)
        .map(|p| p.name.clone())
        .collect()
}

/// A single named package with no dependency closure, filtered by status.
pub fn install_list_package_only(table: &PackageTable, name: &str, max_status: Status) -> Option<String> {
    table.get(name).filter(|p| p.status < max_status).map(|p| p.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::Mirror;
    use crate::suiteconfig::{Action, ActionFlags, ActionKind, PackageGroup, Section};
    use camino::Utf8PathBuf;
    use debuniverse::{Dependency, DependencyGroup};
    use std::collections::BTreeMap;

    fn pkg(name: &str, priority: Priority, essential: bool, deps: &[&str]) -> Package {
        Package {
            name: name.to_string(),
            version: "1".to_string(),
            priority,
            essential,
            filename: Utf8PathBuf::from(format!("pool/{name}.deb")),
            size: 100,
            sha256: None,
            status: Status::NotInstalled,
            depends: deps
                .iter()
                .map(|d| {
                    DependencyGroup(vec![Dependency {
                        name: d.to_string(),
                        version_constraint: None,
                    }])
                })
                .collect(),
            pre_depends: Vec::new(),
        }
    }

    fn sample_ctx() -> Context {
        Context {
            target_root: Utf8PathBuf::from("/tmp/target"),
            mirror: Mirror::parse("http://ftp.debian.org/debian").unwrap(),
            suite_name: "bookworm".to_string(),
            arch: "amd64".to_string(),
            flavour: "standard".to_string(),
            configdir: Utf8PathBuf::from("/etc/cdebootstrap-rs"),
            helperdir: None,
            keyring: None,
            authentication: true,
            download_only: false,
            foreign: false,
            include: Vec::new(),
            exclude: Vec::new(),
            suite_config: None,
            variant: None,
        }
    }

    fn sample_suite(group: PackageGroup) -> SuiteConfig {
        let mut sections = BTreeMap::new();
        sections.insert(
            "base".to_string(),
            Section {
                name: "base".to_string(),
                flavour: Vec::new(),
                packages: vec![group],
                activate: true,
            },
        );
        SuiteConfig {
            name: "bookworm".to_string(),
            actions: vec![Action {
                kind: ActionKind::Extract,
                what: Some("required".to_string()),
                comment: None,
                flags: ActionFlags::default(),
                flavour: Vec::new(),
                activate: true,
            }],
            sections,
            flavour_valid: true,
        }
    }

    #[test]
    fn closes_over_explicit_includes() {
        let table = PackageTable::new(vec![
            pkg("bash", Priority::Important, false, &["libc6"]),
            pkg("libc6", Priority::Required, true, &[]),
        ]);
        let group = PackageGroup {
            arch: Vec::new(),
            packages: vec![PackageToken::Include("bash".to_string())],
            activate: true,
        };
        let suite = sample_suite(group);
        let ctx = sample_ctx();

        let list = build_install_list(&suite, &table, &ctx);
        let names: Vec<&str> = list.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"bash"));
        assert!(names.contains(&"libc6"));
    }

    #[test]
    fn priority_required_token_pulls_in_all_required_packages() {
        let table = PackageTable::new(vec![
            pkg("libc6", Priority::Required, false, &[]),
            pkg("bash", Priority::Important, false, &[]),
        ]);
        let group = PackageGroup {
            arch: Vec::new(),
            packages: vec![PackageToken::PriorityRequired],
            activate: true,
        };
        let suite = sample_suite(group);
        let ctx = sample_ctx();

        let list = build_install_list(&suite, &table, &ctx);
        let names: Vec<&str> = list.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"libc6"));
        assert!(!names.contains(&"bash"));
    }

    #[test]
    fn essential_packages_are_always_included() {
        let table = PackageTable::new(vec![pkg("dpkg", Priority::Unknown, true, &[])]);
        let group = PackageGroup {
            arch: Vec::new(),
            packages: Vec::new(),
            activate: true,
        };
        let suite = sample_suite(group);
        let ctx = sample_ctx();

        let list = build_install_list(&suite, &table, &ctx);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "dpkg");
    }

    #[test]
    fn cli_exclude_overrides_config_include() {
        let table = PackageTable::new(vec![pkg("bash", Priority::Important, false, &[])]);
        let group = PackageGroup {
            arch: Vec::new(),
            packages: vec![PackageToken::Include("bash".to_string())],
            activate: true,
        };
        let suite = sample_suite(group);
        let mut ctx = sample_ctx();
        ctx.exclude.push("bash".to_string());

        let list = build_install_list(&suite, &table, &ctx);
        assert!(list.is_empty());
    }

    #[test]
    fn excluded_package_does_not_reappear_via_dependency_closure() {
        let table = PackageTable::new(vec![
            pkg("bash", Priority::Important, false, &["libc6"]),
            pkg("libc6", Priority::Required, false, &[]),
        ]);
        let group = PackageGroup {
            arch: Vec::new(),
            packages: vec![
                PackageToken::Include("bash".to_string()),
                PackageToken::Exclude("libc6".to_string()),
            ],
            activate: true,
        };
        let suite = sample_suite(group);
        let ctx = sample_ctx();

        let list = build_install_list(&suite, &table, &ctx);
        let names: Vec<&str> = list.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"bash"));
        assert!(!names.contains(&"libc6"));
    }

    #[test]
    fn install_list_filters_by_priority_and_status() {
        let mut installed = pkg("libc6", Priority::Required, false, &[]);
        installed.status = Status::Installed;
        let table = PackageTable::new(vec![
            installed,
            pkg("bash", Priority::Important, false, &[]),
        ]);
        let seeds: Vec<String> = table.iter().map(|p| p.name.clone()).collect();

        let result = install_list(&table, &seeds, Priority::Required, Status::Installed);
        assert!(!result.iter().any(|n| n == "libc6"));
    }

    #[test]
    fn install_list_package_only_has_no_closure() {
        let table = PackageTable::new(vec![pkg("bash", Priority::Important, false, &["libc6"])]);
        let only = install_list_package_only(&table, "bash", Status::Installed).unwrap();
        assert_eq!(only, "bash");
    }
}
