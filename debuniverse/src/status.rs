//! Package installation status, as reported on dpkg's `--status-fd`.

use std::fmt;

/// Declaration order is dpkg's real status lifecycle and doubles as the
/// `Ord` implementation: `not-installed -> half-installed -> unpacked ->
/// half-configured -> installed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Status {
    #[default]
    NotInstalled,
    HalfInstalled,
    Unpacked,
    HalfConfigured,
    Installed,
}

impl Status {
    /// Parses the state token of a `status: <pkg>: <state>` line.
    /// Unrecognized tokens return `None`; callers should log and ignore
    /// the line rather than error.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not-installed" => Some(Self::NotInstalled),
            "half-installed" => Some(Self::HalfInstalled),
            "unpacked" => Some(Self::Unpacked),
            "half-configured" => Some(Self::HalfConfigured),
            "installed" => Some(Self::Installed),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotInstalled => "not-installed",
            Self::HalfInstalled => "half-installed",
            Self::Unpacked => "unpacked",
            Self::HalfConfigured => "half-configured",
            Self::Installed => "installed",
        };
        f.write_str(s)
    }
}
