//! Parsing of a suite's `Release` file.

use std::collections::BTreeMap;

use crate::error::UniverseError;
use crate::rfc822;

/// One entry of a `Release` file's `SHA256:` file-list field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFileEntry {
    pub size: u64,
    pub sha256: String,
}

/// A parsed `Release` (or `InRelease`) file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Release {
    pub codename: String,
    pub files: BTreeMap<String, ReleaseFileEntry>,
}

/// Parses a `Release`/`InRelease` body.
///
/// The `SHA256` field is a multi-line value (continuation lines already
/// folded by [`rfc822::stanzas`] into one space-joined string); each
/// "word triple" within it is `<sha256> <size> <path>`.
pub fn parse_release(text: &str) -> Result<Release, UniverseError> {
    let stanzas = rfc822::stanzas(text);
    let stanza = stanzas.first().ok_or_else(|| UniverseError::Parse {
        file: "Release".to_string(),
        reason: "empty file".to_string(),
    })?;

    let codename = rfc822::field(stanza, "Codename")
        .ok_or(UniverseError::MissingField {
            file: "Release".to_string(),
            field: "Codename",
        })?
        .to_string();

    let mut files = BTreeMap::new();
    if let Some(sha256_field) = rfc822::field(stanza, "SHA256") {
        let tokens: Vec<&str> = sha256_field.split_whitespace().collect();
        for chunk in tokens.chunks(3) {
            let [sha, size, path] = chunk else {
                continue;
            };
            let Ok(size) = size.parse::<u64>() else {
                continue;
            };
            files.insert(
                path.to_string(),
                ReleaseFileEntry {
                    size,
                    sha256: sha.to_string(),
                },
            );
        }
    }

    Ok(Release { codename, files })
}
