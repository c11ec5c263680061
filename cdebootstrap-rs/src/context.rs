//! The run-wide context threaded by shared reference into every component.
//!
//! Holds the state that would otherwise be global: the target root, the
//! chosen architecture/flavour, the authentication policy, and (in
//! foreign mode) the handle to the in-progress foreign script. Components
//! read from it but do not mutate it — the only in-place mutation during a
//! run is the package universe's `status` field and the Action Engine's
//! own priority memo, both owned by the component that mutates them.

use camino::Utf8PathBuf;

use crate::mirror::Mirror;

/// Mapping from CLI `--variant` legacy aliases onto their real meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Build,
    Standard,
}

impl Variant {
    /// Resolves a `--variant` value, including the legacy aliases
    /// `buildd -> build` and `fakechroot -> standard`.
    pub fn resolve(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "build" | "buildd" => Some(Self::Build),
            "standard" | "fakechroot" => Some(Self::Standard),
            _ => None,
        }
    }
}

/// Process-lifetime configuration, built once by the driver and shared by
/// reference into every component.
#[derive(Debug, Clone)]
pub struct Context {
    pub target_root: Utf8PathBuf,
    pub mirror: Mirror,
    pub suite_name: String,
    pub arch: String,
    pub flavour: String,
    pub configdir: Utf8PathBuf,
    pub helperdir: Option<Utf8PathBuf>,
    pub keyring: Option<Utf8PathBuf>,
    pub authentication: bool,
    pub download_only: bool,
    pub foreign: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Overrides which `configdir` subdirectory is consulted for the suite
    /// configuration, independent of the archive suite name in `suite_name`.
    pub suite_config: Option<String>,
    pub variant: Option<Variant>,
}

impl Context {
    /// The cache directory for downloaded index files and `.deb`s,
    /// relative to `target_root`.
    pub fn cache_dir(&self) -> Utf8PathBuf {
        self.target_root.join("var/cache/bootstrap")
    }

    /// The environment exported into every child process run against or
    /// inside the target (constant across runs).
    pub fn child_environment(&self) -> Vec<(String, String)> {
        vec![
            (
                "PATH".to_string(),
                "/usr/sbin:/usr/bin:/sbin:/bin".to_string(),
            ),
            ("DEBIAN_FRONTEND".to_string(), "noninteractive".to_string()),
            ("LC_ALL".to_string(), "C".to_string()),
            ("LANGUAGE".to_string(), "C".to_string()),
            ("LANG".to_string(), "C".to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_resolves_legacy_aliases() {
        assert_eq!(Variant::resolve("buildd"), Some(Variant::Build));
        assert_eq!(Variant::resolve("fakechroot"), Some(Variant::Standard));
        assert_eq!(Variant::resolve("build"), Some(Variant::Build));
        assert_eq!(Variant::resolve("bogus"), None);
    }

    fn sample_ctx() -> Context {
        Context {
            target_root: Utf8PathBuf::from("/tmp/target"),
            mirror: Mirror::parse("http://ftp.debian.org/debian").unwrap(),
            suite_name: "bookworm".to_string(),
            arch: "amd64".to_string(),
            flavour: "standard".to_string(),
            configdir: Utf8PathBuf::from("/etc/cdebootstrap-rs"),
            helperdir: None,
            keyring: None,
            authentication: true,
            download_only: false,
            foreign: false,
            include: Vec::new(),
            exclude: Vec::new(),
            suite_config: None,
            variant: None,
        }
    }

    #[test]
    fn cache_dir_is_under_target_root() {
        let ctx = sample_ctx();
        assert_eq!(ctx.cache_dir(), Utf8PathBuf::from("/tmp/target/var/cache/bootstrap"));
    }

    #[test]
    fn child_environment_is_constant_shape() {
        let ctx = sample_ctx();
        let env = ctx.child_environment();
        assert!(env.iter().any(|(k, v)| k == "DEBIAN_FRONTEND" && v == "noninteractive"));
        assert!(env.iter().any(|(k, _)| k == "PATH"));
    }
}
