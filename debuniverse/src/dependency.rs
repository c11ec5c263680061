//! Dependency relations between packages.

/// One disjunct of an or-group from a `Depends`/`Pre-Depends` field.
///
/// The version constraint is kept only for display; dependency closure
/// resolves purely by name reachability, exactly as the system this crate
/// models does (it never evaluates version constraints).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub version_constraint: Option<String>,
}

/// An or-group of alternatives (`a | b | c`). Resolution only ever follows
/// the first alternative, matching the non-backtracking resolver this
/// crate reimplements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGroup(pub Vec<Dependency>);

impl DependencyGroup {
    pub fn primary(&self) -> Option<&Dependency> {
        self.0.first()
    }
}

/// Parses a `Depends`-style field value into or-groups.
///
/// Grammar: comma-separated list of or-groups; each or-group is a
/// `|`-separated list of `name` or `name (constraint)` terms.
pub fn parse_depends_field(value: &str) -> Vec<DependencyGroup> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|group| {
            let alts = group
                .split('|')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(parse_dependency_term)
                .collect();
            DependencyGroup(alts)
        })
        .collect()
}

fn parse_dependency_term(term: &str) -> Dependency {
    if let Some(open) = term.find('(') {
        let name = term[..open].trim().to_string();
        let constraint = term[open + 1..]
            .trim_end_matches(')')
            .trim()
            .to_string();
        Dependency {
            name,
            version_constraint: Some(constraint),
        }
    } else {
        Dependency {
            name: term.trim().to_string(),
            version_constraint: None,
        }
    }
}
