//! Mirror URL parsing: `scheme "://" [host] path`.

use camino::Utf8Path;

use crate::error::RdebootstrapError;
use crate::executor::CommandSpec;

/// A recognized mirror transport scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Scheme {
    Http,
    Ftp,
    File,
    Ssh,
}

/// A parsed mirror location: `{scheme, host, path}`.
///
/// `host` is empty for the `file` scheme and non-empty for every other
/// scheme (enforced at parse time). There is no fixed-size buffer behind
/// either field, so unlike the system this reimplements, there is no
/// truncation/overflow hazard to guard against — an empty host where one
/// is required is simply a validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mirror {
    pub scheme: Scheme,
    pub host: String,
    pub path: String,
}

impl Mirror {
    /// Parses a mirror URL per the grammar above. Trailing `/` characters
    /// on the path are stripped.
    pub fn parse(url: &str) -> Result<Self, RdebootstrapError> {
        let Some((scheme_str, rest)) = url.split_once("://") else {
            return Err(RdebootstrapError::Validation(format!(
                "mirror {url:?} is missing a \"://\" separator"
            )));
        };

        let scheme: Scheme = scheme_str.parse().map_err(|_| {
            RdebootstrapError::Validation(format!("mirror {url:?} has unknown scheme {scheme_str:?}"))
        })?;

        let (host, path) = match scheme {
            Scheme::File => {
                if !rest.starts_with('/') {
                    return Err(RdebootstrapError::Validation(format!(
                        "file mirror {url:?} must have no host and a path starting with '/'"
                    )));
                }
                (String::new(), rest.to_string())
            }
            Scheme::Http | Scheme::Ftp | Scheme::Ssh => {
                let Some(slash) = rest.find('/') else {
                    return Err(RdebootstrapError::Validation(format!(
                        "mirror {url:?} is missing a path after the host"
                    )));
                };
                let host = &rest[..slash];
                if host.is_empty() {
                    return Err(RdebootstrapError::Validation(format!(
                        "mirror {url:?} must have a non-empty host"
                    )));
                }
                (host.to_string(), rest[slash..].to_string())
            }
        };

        let path = path.trim_end_matches('/').to_string();
        let path = if path.is_empty() {
            "/".to_string()
        } else {
            path
        };

        Ok(Mirror { scheme, host, path })
    }

    /// Builds the child command that fetches `source_rel` (a path relative
    /// to the mirror root, e.g. `dists/bookworm/Release`) into `dest`,
    /// dispatching on transport per the External Interfaces mirror-command
    /// table: `wget` for `http`/`ftp`, `cp` for `file`, and a shelled-out
    /// `ssh ... | cat > dest` for `ssh` (the only transport that needs
    /// shell redirection rather than a plain argv).
    pub fn fetch_command(&self, source_rel: &str, dest: &Utf8Path) -> CommandSpec {
        match self.scheme {
            Scheme::Http | Scheme::Ftp => CommandSpec::new(
                "wget",
                vec![
                    "-q".to_string(),
                    "-O".to_string(),
                    dest.to_string(),
                    format!("{}://{}{}/{source_rel}", self.scheme, self.host, self.path),
                ],
            ),
            Scheme::File => CommandSpec::new(
                "cp",
                vec![format!("{}/{source_rel}", self.path), dest.to_string()],
            ),
            Scheme::Ssh => CommandSpec::new(
                "sh",
                vec![
                    "-c".to_string(),
                    format!(
                        "ssh -o BatchMode=yes {} 'cat {}/{source_rel}' > {dest}",
                        self.host, self.path
                    ),
                ],
            ),
        }
    }
}
