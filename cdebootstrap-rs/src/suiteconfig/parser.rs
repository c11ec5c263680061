//! RFC-822 stanza parsing for the four suite-config files.

use debuniverse::rfc822::{self, Stanza};

use super::types::{Action, ActionFlags, PackageGroup, PackageToken, Section, SuitesCatalogueEntry};

/// Splits a `Flavour`/`Arch`/`Packages`-style list field on runs of
/// whitespace and/or commas.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses an `action` file's stanzas. Stanzas with no `Action` field are
/// dropped (matching the original parser, which never appends an action
/// whose `action` string is empty).
pub fn parse_actions(text: &str) -> Vec<Action> {
    rfc822::stanzas(text)
        .iter()
        .filter_map(|stanza| parse_action_stanza(stanza))
        .collect()
}

fn parse_action_stanza(stanza: &Stanza) -> Option<Action> {
    let kind_str = rfc822::field(stanza, "Action")?;
    let kind = match super::types::ActionKind::parse(kind_str) {
        Some(kind) => kind,
        None => {
            tracing::warn!(kind = %kind_str, "unknown action kind, skipping");
            return None;
        }
    };
    let what = rfc822::field(stanza, "What").map(str::to_string);
    let comment = rfc822::field(stanza, "Comment").map(str::to_string);
    let flags = rfc822::field(stanza, "Flags")
        .map(ActionFlags::parse)
        .unwrap_or_default();
    let flavour = rfc822::field(stanza, "Flavour")
        .map(split_list)
        .unwrap_or_default();

    Some(Action {
        kind,
        what,
        comment,
        flags,
        flavour,
        activate: false,
    })
}

/// Parses a `sections` file's stanzas, keyed by section name. Stanzas
/// with no `Section` field are dropped.
pub fn parse_sections(text: &str) -> Vec<Section> {
    rfc822::stanzas(text)
        .iter()
        .filter_map(|stanza| {
            let name = rfc822::field(stanza, "Section")?.to_string();
            let flavour = rfc822::field(stanza, "Flavour")
                .map(split_list)
                .unwrap_or_default();
            Some(Section {
                name,
                flavour,
                packages: Vec::new(),
                activate: false,
            })
        })
        .collect()
}

/// One `packages` stanza plus the section name it should be attached to.
pub struct PackagesStanza {
    pub section_name: Option<String>,
    pub group: PackageGroup,
}

/// Parses a `packages` file's stanzas. Each stanza names the section it
/// belongs to via its `Section` field; attaching (and warning on a
/// missing section) is the caller's job since this parser has no access
/// to the sections map.
pub fn parse_packages_stanzas(text: &str) -> Vec<PackagesStanza> {
    rfc822::stanzas(text)
        .iter()
        .map(|stanza| {
            let section_name = rfc822::field(stanza, "Section").map(str::to_string);
            let arch = rfc822::field(stanza, "Arch")
                .map(split_list)
                .unwrap_or_default();
            let packages = rfc822::field(stanza, "Packages")
                .map(split_list)
                .unwrap_or_default()
                .iter()
                .map(|t| PackageToken::parse(t))
                .collect();
            PackagesStanza {
                section_name,
                group: PackageGroup {
                    arch,
                    packages,
                    activate: false,
                },
            }
        })
        .collect()
}

/// Parses the top-level `suites` catalogue file.
pub fn parse_suites_catalogue(text: &str) -> Vec<SuitesCatalogueEntry> {
    rfc822::stanzas(text)
        .iter()
        .filter_map(|stanza| {
            let suite = rfc822::field(stanza, "Suite")?.to_string();
            let config = rfc822::field(stanza, "Config").map(str::to_string);
            let keyring = rfc822::field(stanza, "Keyring").map(str::to_string);
            Some(SuitesCatalogueEntry {
                suite,
                config,
                keyring,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_splits_on_whitespace_and_commas() {
        assert_eq!(
            split_list("build, minimal\tstandard"),
            vec!["build", "minimal", "standard"]
        );
    }

    #[test]
    fn parse_actions_drops_stanzas_with_no_action_field() {
        let text = "Comment: orphaned\n\nAction: extract\nWhat: required\n";
        let actions = parse_actions(text);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].what.as_deref(), Some("required"));
    }

    #[test]
    fn parse_actions_drops_unknown_action_names() {
        let text = "Action: frobnicate\n";
        assert!(parse_actions(text).is_empty());
    }

    #[test]
    fn parse_sections_reads_flavour_list() {
        let text = "Section: base\nFlavour: standard, build\n";
        let sections = parse_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].flavour, vec!["standard", "build"]);
    }

    #[test]
    fn parse_packages_stanzas_reads_tokens() {
        let text = "Section: base\nArch: any\nPackages: libc6 -perl priority-required\n";
        let stanzas = parse_packages_stanzas(text);
        assert_eq!(stanzas.len(), 1);
        assert_eq!(stanzas[0].section_name.as_deref(), Some("base"));
        assert_eq!(stanzas[0].group.packages.len(), 3);
    }

    #[test]
    fn parse_suites_catalogue_reads_entries() {
        let text = "Suite: bookworm\nConfig: bookworm\nKeyring: /usr/share/keyrings/debian.gpg\n";
        let entries = parse_suites_catalogue(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].suite, "bookworm");
        assert_eq!(entries[0].config.as_deref(), Some("bookworm"));
    }
}
