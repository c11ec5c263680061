//! Data types for the parsed, flavour/arch-filtered suite configuration.

use std::collections::BTreeMap;

/// The fixed set of action kinds the Action Engine knows how to dispatch.
///
/// Modeled as a closed enum rather than open polymorphism, per the
/// function-pointer-dispatch-table guidance for this component: the set
/// of kinds is fixed and will not grow from user configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum ActionKind {
    #[strum(serialize = "apt-install")]
    AptInstall,
    #[strum(serialize = "dpkg-configure")]
    DpkgConfigure,
    #[strum(serialize = "dpkg-install")]
    DpkgInstall,
    #[strum(serialize = "dpkg-unpack")]
    DpkgUnpack,
    #[strum(serialize = "extract")]
    Extract,
    #[strum(serialize = "helper-install")]
    HelperInstall,
    #[strum(serialize = "helper-remove")]
    HelperRemove,
    #[strum(serialize = "mount")]
    Mount,
}

impl ActionKind {
    /// Parses an action kind name case-insensitively, matching the
    /// original parser's tolerant matching of action names.
    pub fn parse(s: &str) -> Option<Self> {
        s.to_ascii_lowercase().parse().ok()
    }
}

/// `Flags` field of an `action` stanza: a comma-separated set drawn from
/// `{force, only}`, case-insensitive, unknown tokens silently ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionFlags {
    pub force: bool,
    pub only: bool,
}

impl ActionFlags {
    pub fn parse(value: &str) -> Self {
        let mut flags = Self::default();
        for token in value.split(',').map(str::trim) {
            match token.to_ascii_lowercase().as_str() {
                "force" => flags.force = true,
                "only" => flags.only = true,
                _ => {}
            }
        }
        flags
    }
}

/// One stanza of the `action` file.
#[derive(Debug, Clone)]
pub struct Action {
    pub kind: ActionKind,
    pub what: Option<String>,
    pub comment: Option<String>,
    pub flags: ActionFlags,
    pub flavour: Vec<String>,
    pub activate: bool,
}

impl Action {
    /// Whether `flavour` filters pass for the given chosen flavour
    /// (ASCII case-insensitive; an empty list always activates).
    pub fn flavour_matches(flavour_list: &[String], chosen: &str) -> bool {
        flavour_list.is_empty()
            || flavour_list.iter().any(|f| f.eq_ignore_ascii_case(chosen))
    }
}

/// One token inside a `Packages` field of a `packages` stanza.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageToken {
    Include(String),
    Exclude(String),
    PriorityRequired,
    PriorityImportant,
}

impl PackageToken {
    pub fn parse(token: &str) -> Self {
        match token {
            "priority-required" => Self::PriorityRequired,
            "priority-important" => Self::PriorityImportant,
            t if t.starts_with('-') => Self::Exclude(t[1..].to_string()),
            t => Self::Include(t.to_string()),
        }
    }
}

/// One stanza of the `packages` file: a list of tokens bound to a named
/// section, filtered by architecture.
#[derive(Debug, Clone)]
pub struct PackageGroup {
    pub arch: Vec<String>,
    pub packages: Vec<PackageToken>,
    pub activate: bool,
}

impl PackageGroup {
    /// Whether `arch` filters pass: empty, contains `any`
    /// (case-insensitive), or contains the target arch.
    pub fn arch_matches(arch_list: &[String], target_arch: &str) -> bool {
        arch_list.is_empty()
            || arch_list
                .iter()
                .any(|a| a.eq_ignore_ascii_case("any") || a.eq_ignore_ascii_case(target_arch))
    }
}

/// A named grouping of package-selection rules, referenced from the
/// `packages` file's `Section` field.
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub flavour: Vec<String>,
    pub packages: Vec<PackageGroup>,
    pub activate: bool,
}

/// One stanza of the top-level `suites` catalogue file.
#[derive(Debug, Clone)]
pub struct SuitesCatalogueEntry {
    pub suite: String,
    pub config: Option<String>,
    pub keyring: Option<String>,
}

/// The fully loaded, not-yet-filtered suite configuration.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    pub name: String,
    pub actions: Vec<Action>,
    pub sections: BTreeMap<String, Section>,
    /// Set true once some section is found to mention the chosen flavour.
    pub flavour_valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kind_parses_case_insensitively() {
        assert_eq!(ActionKind::parse("Apt-Install"), Some(ActionKind::AptInstall));
        assert_eq!(ActionKind::parse("MOUNT"), Some(ActionKind::Mount));
        assert_eq!(ActionKind::parse("bogus"), None);
    }

    #[test]
    fn action_flags_ignores_unknown_tokens() {
        let flags = ActionFlags::parse("Force, bogus, ONLY");
        assert!(flags.force);
        assert!(flags.only);
    }

    #[test]
    fn package_token_parses_pseudo_tokens_and_exclusions() {
        assert_eq!(PackageToken::parse("priority-required"), PackageToken::PriorityRequired);
        assert_eq!(PackageToken::parse("-foo"), PackageToken::Exclude("foo".to_string()));
        assert_eq!(PackageToken::parse("bar"), PackageToken::Include("bar".to_string()));
    }

    #[test]
    fn flavour_matches_empty_list_always() {
        assert!(Action::flavour_matches(&[], "minimal"));
        assert!(Action::flavour_matches(&["Standard".to_string()], "standard"));
        assert!(!Action::flavour_matches(&["build".to_string()], "standard"));
    }

    #[test]
    fn arch_matches_any_case_insensitive() {
        assert!(PackageGroup::arch_matches(&[], "amd64"));
        assert!(PackageGroup::arch_matches(&["ANY".to_string()], "amd64"));
        assert!(PackageGroup::arch_matches(&["amd64".to_string()], "amd64"));
        assert!(!PackageGroup::arch_matches(&["arm64".to_string()], "amd64"));
    }
}
