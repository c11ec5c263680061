//! Runs commands inside the target root via `chroot`.

use camino::Utf8PathBuf;

use super::native::NativeExecutor;
use super::{CommandExecutor, CommandSpec, ExecutionResult};
use crate::error::RdebootstrapError;

/// Wraps every command's argv with `chroot <target_root> <command>
/// <args...>` before delegating to a [`NativeExecutor`].
///
/// The caller is responsible for having already unshared the mount
/// namespace once via [`super::prepare_mount_namespace`] — this executor
/// does not do that itself so it can be constructed freely per action.
pub struct ChrootExecutor {
    target_root: Utf8PathBuf,
    inner: NativeExecutor,
}

impl ChrootExecutor {
    pub fn new(target_root: Utf8PathBuf) -> Self {
        Self {
            target_root,
            inner: NativeExecutor::new(),
        }
    }

    fn wrap(&self, spec: &CommandSpec) -> CommandSpec {
        let mut args = Vec::with_capacity(spec.args.len() + 2);
        args.push(self.target_root.to_string());
        args.push(spec.command.clone());
        args.extend(spec.args.iter().cloned());

        CommandSpec {
            command: "chroot".to_string(),
            args,
            cwd: None,
            env: spec.env.clone(),
            status_fd: spec.status_fd,
        }
    }
}

impl CommandExecutor for ChrootExecutor {
    fn execute(&self, spec: &CommandSpec) -> Result<ExecutionResult, RdebootstrapError> {
        self.inner.execute(&self.wrap(spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_argv_with_chroot_prefix() {
        let executor = ChrootExecutor::new(Utf8PathBuf::from("/srv/target"));
        let spec = CommandSpec::new("dpkg", vec!["--configure".to_string(), "-a".to_string()]);
        let wrapped = executor.wrap(&spec);

        assert_eq!(wrapped.command, "chroot");
        assert_eq!(
            wrapped.args,
            vec!["/srv/target", "dpkg", "--configure", "-a"]
        );
    }

    #[test]
    fn preserves_status_fd_flag() {
        let executor = ChrootExecutor::new(Utf8PathBuf::from("/srv/target"));
        let spec = CommandSpec::new("dpkg", vec![]).with_status_fd(true);
        assert!(executor.wrap(&spec).status_fd);
    }
}
