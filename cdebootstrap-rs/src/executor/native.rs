//! Native command execution: runs a child process on the host, streaming
//! stdout/stderr to `tracing` and, optionally, reading an fd-3 status
//! pipe for dpkg's `--status-fd` protocol.

use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::thread::JoinHandle;

use which::which;

use super::pipe::{panic_message, read_pipe_to_log, StreamType};
use super::statuspipe::read_status_pipe;
use super::{CommandExecutor, CommandSpec, ExecutionResult};
use crate::error::RdebootstrapError;

/// Executes commands directly on the host via `std::process::Command`.
pub struct NativeExecutor;

impl NativeExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Creates the pipe and `pre_exec` hook that installs its write end
    /// as fd 3 in the child, since `std::process::Command` has no
    /// first-class "extra fd" API. The caller must drop `command` once
    /// the child has been spawned, or the parent's own copy of the
    /// write end keeps the pipe open and EOF never arrives.
    fn attach_status_fd(command: &mut Command) -> std::io::Result<OwnedFd> {
        let (read_end, write_end) = rustix::pipe::pipe()?;
        unsafe {
            command.pre_exec(move || {
                rustix::io::dup2(&write_end, &rustix::fd::BorrowedFd::borrow_raw(3))
                    .map_err(std::io::Error::from)
            });
        }
        Ok(read_end)
    }
}

impl Default for NativeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor for NativeExecutor {
    fn execute(&self, spec: &CommandSpec) -> Result<ExecutionResult, RdebootstrapError> {
        let resolved = which(&spec.command).map_err(|e| RdebootstrapError::Execution {
            command: spec.command.clone(),
            status: format!("command not found: {e}"),
        })?;

        let mut command = Command::new(&resolved);
        command.args(&spec.args);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd.as_std_path());
        }
        for (key, value) in &spec.env {
            command.env(key, value);
        }
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let status_read_end = if spec.status_fd {
            Some(Self::attach_status_fd(&mut command).map_err(|e| RdebootstrapError::Execution {
                command: spec.command.clone(),
                status: format!("failed to set up status pipe: {e}"),
            })?)
        } else {
            None
        };

        let mut child = command.spawn().map_err(|e| RdebootstrapError::Execution {
            command: spec.command.clone(),
            status: format!("failed to spawn: {e}"),
        })?;
        // Drop the parent's copy of the `pre_exec` closure (and the write
        // end of the status pipe it captured) now that the child has its
        // own duplicate — otherwise the pipe never reaches EOF.
        drop(command);

        tracing::trace!(command = %spec.command, pid = child.id(), "spawned command");

        let (stdout_handle, stderr_handle) = spawn_output_readers(&mut child, spec)?;

        let status_handle = status_read_end.map(|read_end| {
            thread::Builder::new()
                .name("status-reader".to_string())
                .spawn(move || {
                    let file = unsafe { std::fs::File::from_raw_fd(read_end.as_raw_fd()) };
                    std::mem::forget(read_end);
                    read_status_pipe(Some(file))
                })
        });

        let status = child.wait().map_err(|e| RdebootstrapError::Execution {
            command: spec.command.clone(),
            status: format!("failed to wait: {e}"),
        })?;

        join_output_readers(stdout_handle, stderr_handle);

        let status_updates = match status_handle {
            Some(Ok(handle)) => handle.join().unwrap_or_else(|e| {
                tracing::error!(panic = panic_message(&*e), "status reader thread panicked");
                Vec::new()
            }),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "failed to spawn status reader thread");
                Vec::new()
            }
            None => Vec::new(),
        };

        Ok(ExecutionResult {
            status: Some(status),
            status_updates,
        })
    }
}

fn spawn_output_readers(
    child: &mut Child,
    spec: &CommandSpec,
) -> Result<(JoinHandle<()>, JoinHandle<()>), RdebootstrapError> {
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();

    let stdout_handle = thread::Builder::new()
        .name("stdout-reader".to_string())
        .spawn(move || read_pipe_to_log(stdout_pipe, StreamType::Stdout))
        .map_err(|e| RdebootstrapError::Execution {
            command: spec.command.clone(),
            status: format!("failed to spawn stdout reader thread: {e}"),
        })?;

    let stderr_handle = thread::Builder::new()
        .name("stderr-reader".to_string())
        .spawn(move || read_pipe_to_log(stderr_pipe, StreamType::Stderr))
        .map_err(|e| RdebootstrapError::Execution {
            command: spec.command.clone(),
            status: format!("failed to spawn stderr reader thread: {e}"),
        })?;

    Ok((stdout_handle, stderr_handle))
}

fn join_output_readers(stdout_handle: JoinHandle<()>, stderr_handle: JoinHandle<()>) {
    if let Err(e) = stdout_handle.join() {
        tracing::error!(stream = "stdout", panic = panic_message(&*e), "reader thread panicked");
    }
    if let Err(e) = stderr_handle.join() {
        tracing::error!(stream = "stderr", panic = panic_message(&*e), "reader thread panicked");
    }
}
