//! Command execution abstraction.
//!
//! This module provides:
//! - [`CommandSpec`]: specification for a command to execute
//! - [`ExecutionResult`]: result of command execution, including any
//!   dpkg status-fd updates observed
//! - [`CommandExecutor`]: trait for the three execution strategies this
//!   tool needs (native, chroot, foreign/simulated)

mod chroot;
mod foreign;
mod mountns;
mod native;
mod pipe;
mod statuspipe;

use std::process::ExitStatus;

use camino::Utf8PathBuf;
use debuniverse::Status;

use crate::error::RdebootstrapError;

pub use chroot::ChrootExecutor;
pub use foreign::ForeignExecutor;
pub use mountns::prepare_mount_namespace;
pub use native::NativeExecutor;

/// Formats string arguments into a space-separated, debug-quoted string,
/// used by foreign-mode script lines and dry-run-style log messages.
pub(crate) fn format_command_args(args: &[String]) -> String {
    args.iter()
        .map(|a| format!("{a:?}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Specification for a command to be executed.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub command: String,
    pub args: Vec<String>,
    pub cwd: Option<Utf8PathBuf>,
    pub env: Vec<(String, String)>,
    /// Whether to attach an fd-3 status pipe and parse `status: <pkg>:
    /// <state>` lines out of it. Only meaningful for dpkg invocations.
    pub status_fd: bool,
}

impl CommandSpec {
    #[must_use]
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            cwd: None,
            env: Vec::new(),
            status_fd: false,
        }
    }

    #[must_use]
    pub fn with_cwd(mut self, cwd: Utf8PathBuf) -> Self {
        self.cwd = Some(cwd);
        self
    }

    #[must_use]
    pub fn with_envs<I, K, V>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(envs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    #[must_use]
    pub fn with_status_fd(mut self, status_fd: bool) -> Self {
        self.status_fd = status_fd;
        self
    }
}

/// Result of command execution.
#[derive(Debug)]
pub struct ExecutionResult {
    /// `None` in foreign mode, where nothing was actually executed.
    pub status: Option<ExitStatus>,
    /// Package status transitions observed on fd 3, in the order they
    /// were reported. Always empty unless `spec.status_fd` was set and
    /// the executor actually ran a child process.
    pub status_updates: Vec<(String, Status)>,
}

impl ExecutionResult {
    /// `None` status (foreign mode) counts as success, matching how a
    /// simulated command can't fail at script-generation time.
    pub fn success(&self) -> bool {
        self.status.is_none_or(|s| s.success())
    }

    pub fn code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }
}

/// Runs a command either on the host, inside the target root via
/// `chroot`, or as a line appended to a foreign-mode script.
///
/// Implementations must be `Send + Sync` so a single executor can be
/// shared across the Action Engine without re-wrapping it per action.
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, spec: &CommandSpec) -> Result<ExecutionResult, RdebootstrapError>;
}
