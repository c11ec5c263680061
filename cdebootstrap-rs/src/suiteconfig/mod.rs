//! Suite configuration: RFC-822 config files, two-phase catalogue
//! resolution, and arch/flavour filtering.

mod parser;
mod types;

use std::collections::BTreeMap;

use camino::Utf8Path;

use crate::error::RdebootstrapError;

pub use types::{
    Action, ActionFlags, ActionKind, PackageGroup, PackageToken, Section, SuiteConfig,
    SuitesCatalogueEntry,
};

/// Outcome of the primary suite-config resolution pass.
pub enum LoadOutcome {
    /// A concrete configuration was loaded immediately.
    Loaded(SuiteConfig),
    /// The suite name matched a catalogue entry with no `Config`
    /// subdirectory; resolution must wait for the real codename from the
    /// downloaded `Release` file (see [`init_secondary`]).
    Deferred,
}

fn read_to_string(path: &Utf8Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

/// Reads the three suite-specific files (`action`, `sections`, `packages`)
/// from `dir` and assembles an unfiltered [`SuiteConfig`] named `name`.
fn read_suite_config(name: &str, dir: &Utf8Path) -> Result<SuiteConfig, RdebootstrapError> {
    let actions = read_to_string(&dir.join("action"))
        .map(|text| parser::parse_actions(&text))
        .ok_or_else(|| {
            RdebootstrapError::Config(format!("cannot read {}/action", dir))
        })?;

    let section_list = read_to_string(&dir.join("sections"))
        .map(|text| parser::parse_sections(&text))
        .ok_or_else(|| {
            RdebootstrapError::Config(format!("cannot read {}/sections", dir))
        })?;

    let mut sections: BTreeMap<String, Section> = section_list
        .into_iter()
        .map(|s| (s.name.clone(), s))
        .collect();

    if let Some(text) = read_to_string(&dir.join("packages")) {
        for stanza in parser::parse_packages_stanzas(&text) {
            match stanza.section_name {
                Some(name) => match sections.get_mut(&name) {
                    Some(section) => section.packages.push(stanza.group),
                    None => tracing::warn!(section = %name, "unknown config section"),
                },
                None => tracing::warn!("packages stanza with no Section field, dropping"),
            }
        }
    }

    Ok(SuiteConfig {
        name: name.to_string(),
        actions,
        sections,
        flavour_valid: false,
    })
}

/// Reads the `suites` catalogue file from `configdir`, if present.
fn read_catalogue(configdir: &Utf8Path) -> Option<Vec<SuitesCatalogueEntry>> {
    read_to_string(&configdir.join("suites")).map(|text| parser::parse_suites_catalogue(&text))
}

/// Shared catalogue-lookup step used by both the primary and secondary
/// init passes.
fn init_common(
    configdir: &Utf8Path,
    suite_name: &str,
) -> Result<Option<LoadOutcome>, RdebootstrapError> {
    let Some(catalogue) = read_catalogue(configdir) else {
        return Ok(None);
    };

    let Some(entry) = catalogue.iter().find(|e| e.suite == suite_name) else {
        tracing::warn!(suite = suite_name, "unknown suite in catalogue");
        return Ok(None);
    };

    match &entry.config {
        Some(subdir) => {
            let dir = configdir.join(subdir);
            Ok(Some(LoadOutcome::Loaded(read_suite_config(
                &entry.suite,
                &dir,
            )?)))
        }
        None => Ok(Some(LoadOutcome::Deferred)),
    }
}

/// Primary suite-config resolution: look up `suite_name` in the `suites`
/// catalogue; if it names a config subdirectory, load from there. If the
/// catalogue doesn't exist, doesn't mention the suite, or mentions it
/// without a subdirectory without deferring further work here, fall back
/// to loading directly from `configdir` using `suite_name` as both the
/// directory and the config name — except the "entry matched, no
/// subdirectory" case, which legitimately defers to [`init_secondary`].
pub fn init_primary(
    configdir: &Utf8Path,
    suite_name: &str,
) -> Result<LoadOutcome, RdebootstrapError> {
    match init_common(configdir, suite_name)? {
        Some(LoadOutcome::Deferred) => Ok(LoadOutcome::Deferred),
        Some(loaded @ LoadOutcome::Loaded(_)) => Ok(loaded),
        None => Ok(LoadOutcome::Loaded(read_suite_config(
            suite_name, configdir,
        )?)),
    }
}

/// Secondary suite-config resolution, run once the real `codename` is
/// known from a downloaded `Release` file. Returns `None` if the
/// catalogue still doesn't resolve a concrete configuration (the caller
/// should treat this as fatal — by this point there is no further
/// fallback).
pub fn init_secondary(
    configdir: &Utf8Path,
    codename: &str,
) -> Result<Option<SuiteConfig>, RdebootstrapError> {
    match init_common(configdir, codename)? {
        Some(LoadOutcome::Loaded(cfg)) => Ok(Some(cfg)),
        Some(LoadOutcome::Deferred) | None => Ok(None),
    }
}

impl SuiteConfig {
    /// Filters every action/section/package-group by the current
    /// `(arch, flavour)` and sets `flavour_valid`. Fails if no section
    /// mentions the chosen flavour at all.
    pub fn filter(&mut self, arch: &str, flavour: &str) -> Result<(), RdebootstrapError> {
        for action in &mut self.actions {
            action.activate = Action::flavour_matches(&action.flavour, flavour);
        }

        let mut flavour_valid = false;
        for section in self.sections.values_mut() {
            if !section.flavour.is_empty() {
                flavour_valid |= section
                    .flavour
                    .iter()
                    .any(|f| f.eq_ignore_ascii_case(flavour));
            }
            section.activate = Action::flavour_matches(&section.flavour, flavour);
            for group in &mut section.packages {
                group.activate = PackageGroup::arch_matches(&group.arch, arch);
            }
        }
        self.flavour_valid = flavour_valid;

        if !flavour_valid {
            return Err(RdebootstrapError::Config(format!(
                "flavour {flavour:?} is not mentioned by any section"
            )));
        }

        Ok(())
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_suite_files(dir: &Utf8Path, action: &str, sections: &str, packages: &str) {
        std::fs::write(dir.join("action"), action).unwrap();
        std::fs::write(dir.join("sections"), sections).unwrap();
        std::fs::write(dir.join("packages"), packages).unwrap();
    }

    #[test]
    fn direct_load_without_catalogue() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        write_suite_files(
            root,
            "Action: extract\nWhat: required\n",
            "Section: base\nFlavour: standard\n",
            "Section: base\nArch: any\nPackages: libc6\n",
        );

        let outcome = init_primary(root, "bookworm").unwrap();
        let LoadOutcome::Loaded(mut config) = outcome else {
            panic!("expected direct load");
        };
        config.filter("amd64", "standard").unwrap();
        assert_eq!(config.actions.len(), 1);
        assert!(config.actions[0].activate);
        assert!(config.section("base").unwrap().activate);
    }

    #[test]
    fn catalogue_entry_with_config_subdir_loads_from_it() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        std::fs::write(root.join("suites"), "Suite: stable\nConfig: bookworm\n").unwrap();
        let sub = root.join("bookworm");
        std::fs::create_dir(&sub).unwrap();
        write_suite_files(
            &sub,
            "Action: extract\nWhat: required\n",
            "Section: base\nFlavour: standard\n",
            "Section: base\nArch: any\nPackages: libc6\n",
        );

        let outcome = init_primary(root, "stable").unwrap();
        assert!(matches!(outcome, LoadOutcome::Loaded(_)));
    }

    #[test]
    fn catalogue_entry_without_config_defers() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        std::fs::write(root.join("suites"), "Suite: stable\n").unwrap();

        let outcome = init_primary(root, "stable").unwrap();
        assert!(matches!(outcome, LoadOutcome::Deferred));
    }

    #[test]
    fn filter_fails_when_flavour_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        write_suite_files(
            root,
            "",
            "Section: base\nFlavour: standard\n",
            "",
        );
        let LoadOutcome::Loaded(mut config) = init_primary(root, "bookworm").unwrap() else {
            panic!("expected load");
        };
        assert!(config.filter("amd64", "minimal").is_err());
    }

    #[test]
    fn unknown_section_reference_is_a_warning_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        write_suite_files(
            root,
            "",
            "Section: base\nFlavour: standard\n",
            "Section: missing\nPackages: libc6\n",
        );
        let outcome = init_primary(root, "bookworm").unwrap();
        assert!(matches!(outcome, LoadOutcome::Loaded(_)));
    }
}
