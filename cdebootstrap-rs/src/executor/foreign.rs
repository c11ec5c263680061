//! Simulated execution: instead of running anything, records each
//! command as a `run <argv...>` line in a generated shell script for a
//! two-stage "foreign" bootstrap.

use std::sync::Mutex;

use super::format_command_args;
use super::{CommandExecutor, CommandSpec, ExecutionResult};
use crate::error::RdebootstrapError;

/// Accumulates the foreign-mode script body. Status updates never occur
/// in this mode: the engine never attaches an fd-3 reader here because
/// nothing is actually run yet.
pub struct ForeignExecutor {
    script: Mutex<Vec<String>>,
}

impl ForeignExecutor {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Vec::new()),
        }
    }

    /// Appends a raw line to the script verbatim (used by the Finalizer
    /// for the `echo ... > /etc/...` lines it emits directly).
    pub fn append_line(&self, line: impl Into<String>) {
        self.script.lock().expect("script mutex poisoned").push(line.into());
    }

    /// Consumes the executor and returns the assembled script body.
    pub fn into_script(self) -> String {
        self.script
            .into_inner()
            .expect("script mutex poisoned")
            .join("\n")
    }
}

impl Default for ForeignExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor for ForeignExecutor {
    fn execute(&self, spec: &CommandSpec) -> Result<ExecutionResult, RdebootstrapError> {
        let mut argv = Vec::with_capacity(spec.args.len() + 1);
        argv.push(spec.command.clone());
        argv.extend(spec.args.iter().cloned());

        self.append_line(format!("run {}", format_command_args(&argv)));

        Ok(ExecutionResult {
            status: None,
            status_updates: Vec::new(),
        })
    }
}
