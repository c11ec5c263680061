//! The `Package` type and `Packages`-file parsing.

use camino::Utf8PathBuf;

use crate::dependency::{parse_depends_field, DependencyGroup};
use crate::error::UniverseError;
use crate::priority::Priority;
use crate::rfc822::{self, Stanza};
use crate::status::Status;

/// A single binary package, as recorded in a `Packages` index.
///
/// Field naming follows Debian's own `Packages` field names where a
/// direct mapping exists (`Installed-Size`-style registers informed this
/// struct's shape, though values here are the parsed/typed form, not raw
/// RFC-822 strings).
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub name: String,
    pub version: String,
    pub priority: Priority,
    pub essential: bool,
    pub filename: Utf8PathBuf,
    pub size: u64,
    pub sha256: Option<String>,
    pub status: Status,
    pub depends: Vec<DependencyGroup>,
    pub pre_depends: Vec<DependencyGroup>,
}

impl Package {
    fn from_stanza(stanza: &Stanza, file: &str) -> Result<Self, UniverseError> {
        let name = rfc822::field(stanza, "Package")
            .ok_or(UniverseError::MissingField {
                file: file.to_string(),
                field: "Package",
            })?
            .to_string();
        let version = rfc822::field(stanza, "Version")
            .ok_or(UniverseError::MissingField {
                file: file.to_string(),
                field: "Version",
            })?
            .to_string();
        let filename = rfc822::field(stanza, "Filename")
            .ok_or(UniverseError::MissingField {
                file: file.to_string(),
                field: "Filename",
            })?;
        let priority = rfc822::field(stanza, "Priority")
            .map(Priority::parse_field)
            .unwrap_or(Priority::Unknown);
        let essential = rfc822::field(stanza, "Essential")
            .map(|v| v.eq_ignore_ascii_case("yes"))
            .unwrap_or(false);
        let size = rfc822::field(stanza, "Size")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        let sha256 = rfc822::field(stanza, "SHA256").map(str::to_string);
        let depends = rfc822::field(stanza, "Depends")
            .map(parse_depends_field)
            .unwrap_or_default();
        let pre_depends = rfc822::field(stanza, "Pre-Depends")
            .map(parse_depends_field)
            .unwrap_or_default();

        Ok(Package {
            name,
            version,
            priority,
            essential,
            filename: Utf8PathBuf::from(filename),
            size,
            sha256,
            status: Status::NotInstalled,
            depends,
            pre_depends,
        })
    }
}

/// Parses a decompressed `Packages` file into a list of packages.
///
/// Stanzas missing `Package`, `Version`, or `Filename` are a hard parse
/// error — every other field is optional and defaults conservatively
/// (`Priority::Unknown`, `essential = false`, `size = 0`).
pub fn parse_packages(text: &str) -> Result<Vec<Package>, UniverseError> {
    rfc822::stanzas(text)
        .iter()
        .map(|s| Package::from_stanza(s, "Packages"))
        .collect()
}
