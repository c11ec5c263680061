//! A minimal RFC-822-style stanza reader shared by every index/config
//! format this workspace parses: `Packages`, `Release`, and (via the
//! orchestration crate) the `suites`/`action`/`sections`/`packages`
//! config files.
//!
//! A stanza is a run of non-blank lines; stanzas are separated by one or
//! more blank lines. Within a stanza, a line of the form `Key: value`
//! starts a field; subsequent lines beginning with whitespace are folded
//! onto the previous field's value (continuation lines), joined with a
//! single space.

/// One `Key: value` field, in stanza order, values already continuation-folded.
pub type Stanza = Vec<(String, String)>;

/// Splits `text` into stanzas.
pub fn stanzas(text: &str) -> Vec<Stanza> {
    let mut stanzas = Vec::new();
    let mut current: Stanza = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                stanzas.push(std::mem::take(&mut current));
            }
            continue;
        }

        if (line.starts_with(' ') || line.starts_with('\t')) && !current.is_empty() {
            if let Some((_, value)) = current.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            current.push((key.trim().to_string(), value.trim().to_string()));
        }
        // Lines with no `:` and no preceding field are silently ignored,
        // matching the original parser's tolerance of stray bytes.
    }

    if !current.is_empty() {
        stanzas.push(current);
    }

    stanzas
}

/// Looks up the first value for `key` in a stanza (case-sensitive, as the
/// formats this reads always use a fixed canonical case for field names).
pub fn field<'a>(stanza: &'a Stanza, key: &str) -> Option<&'a str> {
    stanza
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
