//! Package installation priority.

use std::fmt;

/// A package's `Priority` field from a `Packages` stanza.
///
/// Declaration order doubles as the `Ord` implementation. `Unknown` sorts
/// below every real priority so it never satisfies a `priority >= X`
/// threshold used by the install-list filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Unknown,
    Required,
    Important,
    Standard,
    Optional,
    Extra,
}

impl Priority {
    /// Parses a priority name as it appears in a `Packages` stanza or an
    /// action's `What` field (`required`, `important`, `standard`,
    /// `optional`, `extra`, case-insensitive). Returns `None` for anything
    /// else rather than `Priority::Unknown` — callers that need "this is
    /// not a priority name at all" distinct from "this is the `unknown`
    /// priority" should match on this `Option`.
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "required" => Some(Self::Required),
            "important" => Some(Self::Important),
            "standard" => Some(Self::Standard),
            "optional" => Some(Self::Optional),
            "extra" => Some(Self::Extra),
            _ => None,
        }
    }

    /// Parses the `Priority` field of a `Packages` stanza, where an
    /// unrecognized or absent value is `Unknown` rather than an error.
    pub fn parse_field(s: &str) -> Self {
        Self::parse_name(s).unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Required => "required",
            Self::Important => "important",
            Self::Standard => "standard",
            Self::Optional => "optional",
            Self::Extra => "extra",
        };
        f.write_str(s)
    }
}
