//! The target root: directory/file creation relative to a canonicalized
//! root path.

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::RdebootstrapError;

/// Owns `target_root` and creates paths relative to it.
///
/// No path traversal protection is implemented because every relative
/// path passed to these operations is a literal constant chosen by this
/// crate, never user input.
#[derive(Debug, Clone)]
pub struct TargetTree {
    root: Utf8PathBuf,
}

impl TargetTree {
    /// Canonicalizes `root` and fails if it does not exist or is not a
    /// directory.
    pub fn new(root: &Utf8Path) -> Result<Self, RdebootstrapError> {
        let canonical = root
            .canonicalize_utf8()
            .map_err(|e| RdebootstrapError::io(root.to_string(), e))?;
        if !canonical.is_dir() {
            return Err(RdebootstrapError::Validation(format!(
                "target {canonical} is not a directory"
            )));
        }
        Ok(Self { root: canonical })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn resolve(&self, rel: &str) -> Utf8PathBuf {
        self.root.join(rel.trim_start_matches('/'))
    }

    /// Creates a directory relative to the target root. Succeeds silently
    /// if it already exists; any other failure is fatal.
    pub fn create_dir(&self, rel: &str) -> Result<(), RdebootstrapError> {
        let path = self.resolve(rel);
        match std::fs::create_dir(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(RdebootstrapError::io(path.to_string(), e)),
        }
    }

    /// Creates an empty, truncated file relative to the target root.
    pub fn create_empty_file(&self, rel: &str) -> Result<(), RdebootstrapError> {
        let path = self.resolve(rel);
        std::fs::File::create(&path).map_err(|e| RdebootstrapError::io(path.to_string(), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_dir_then_create_dir_again_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let tree = TargetTree::new(root).unwrap();
        tree.create_dir("var").unwrap();
        tree.create_dir("var").unwrap();
        assert!(tree.resolve("var").is_dir());
    }

    #[test]
    fn create_empty_file_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let tree = TargetTree::new(root).unwrap();
        std::fs::write(tree.resolve("status"), b"stale").unwrap();
        tree.create_empty_file("status").unwrap();
        assert_eq!(std::fs::read(tree.resolve("status")).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn rejects_nonexistent_root() {
        assert!(TargetTree::new(Utf8Path::new("/nonexistent/path/xyz")).is_err());
    }

    #[test]
    fn resolve_strips_leading_slash_from_relative() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let tree = TargetTree::new(root).unwrap();
        assert_eq!(tree.resolve("/etc/hosts"), tree.root().join("etc/hosts"));
    }
}
