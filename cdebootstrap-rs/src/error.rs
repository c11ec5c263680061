//! Domain-specific error types for cdebootstrap-rs.
//!
//! This module defines `RdebootstrapError`, a `thiserror`-based enum that
//! provides typed error variants for common failure modes. Public API
//! functions return `Result<T, RdebootstrapError>` for programmatic error
//! handling, while trait boundaries continue to use `anyhow::Result`.
//!
//! `RdebootstrapError` implements `Into<anyhow::Error>`, so the `?` operator
//! converts it automatically at trait boundaries that return `anyhow::Result`.

use std::io;

/// Formats an IO error kind into a human-readable message.
///
/// Provides consistent, user-friendly messages for common IO error kinds
/// (e.g., "I/O error: not found") instead of the OS-level messages
/// (e.g., "No such file or directory (os error 2)"). For unrecognized
/// error kinds, falls back to including the OS-level error message
/// directly (e.g., "I/O error: connection refused").
pub(crate) fn io_error_kind_message(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "I/O error: not found".to_string(),
        io::ErrorKind::PermissionDenied => "I/O error: permission denied".to_string(),
        io::ErrorKind::IsADirectory => "I/O error: is a directory".to_string(),
        _ => format!("I/O error: {}", err),
    }
}

/// Domain-specific error type for cdebootstrap-rs.
///
/// Variants follow the error taxonomy laid out for this bootstrap
/// pipeline: transport, parse, and validation failures are distinguished
/// so callers (and `authentication=false` downgrade logic) can match on
/// error kind rather than parsing message strings.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RdebootstrapError {
    /// A validation constraint was violated (mirror grammar, suite config
    /// shape, CLI argument combination).
    #[error("validation error: {0}")]
    Validation(String),

    /// A command execution failed (non-zero exit, spawn failure, wait failure, thread panic, etc.).
    #[error("command execution failed: {command}: {status}")]
    Execution {
        /// The command that was executed.
        command: String,
        /// Human-readable reason for the failure: exit code, signal information,
        /// or a description of the internal error (e.g., thread spawn failure).
        status: String,
    },

    /// A mount-namespace or chroot setup operation failed.
    #[error("isolation error: {0}")]
    Isolation(String),

    /// A suite configuration file could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// An index (`Release`/`Packages`) or `.deb` download failed.
    #[error("download failed: {what}: {reason}")]
    DownloadRetrieve { what: String, reason: String },

    /// An index file could not be parsed once downloaded.
    #[error("failed to parse {what}: {reason}")]
    DownloadParse { what: String, reason: String },

    /// A checksum or signature check failed.
    #[error("validation failed for {what}: {reason}")]
    DownloadValidate { what: String, reason: String },

    /// A decompressor reported an error before reaching EOF.
    #[error("failed to decompress {what}: {reason}")]
    Decompress { what: String, reason: String },

    /// A precondition that should be impossible to violate from outside
    /// was violated anyway — a bug in the driver's own wiring.
    #[error("internal error: {0}")]
    Internal(String),

    /// An I/O operation failed with contextual information.
    #[error("{context}: {message}")]
    Io {
        /// What was being done when the error occurred (a path, or an
        /// operation description including a path).
        context: String,
        /// Human-readable description of the I/O failure, derived from
        /// [`io_error_kind_message`] for consistent formatting across the codebase.
        message: String,
        /// The underlying I/O error, preserved for programmatic inspection
        /// (e.g., `source.kind() == ErrorKind::NotFound`).
        #[source]
        source: std::io::Error,
    },
}

impl RdebootstrapError {
    /// Creates an `Io` variant with the `message` field automatically derived
    /// from the `source` via [`io_error_kind_message`].
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            message: io_error_kind_message(&source),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = RdebootstrapError::Validation("mirror path must start with '/'".to_string());
        assert_eq!(
            err.to_string(),
            "validation error: mirror path must start with '/'"
        );
    }

    #[test]
    fn test_execution_display() {
        let err = RdebootstrapError::Execution {
            command: "dpkg".to_string(),
            status: "exit status: 1".to_string(),
        };
        assert_eq!(err.to_string(), "command execution failed: dpkg: exit status: 1");
    }

    #[test]
    fn test_isolation_display() {
        let err = RdebootstrapError::Isolation("unshare(CLONE_NEWNS) failed: EPERM".to_string());
        assert_eq!(
            err.to_string(),
            "isolation error: unshare(CLONE_NEWNS) failed: EPERM"
        );
    }

    #[test]
    fn test_config_display() {
        let err = RdebootstrapError::Config("unknown suite bookworm-backports".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: unknown suite bookworm-backports"
        );
    }

    #[test]
    fn test_download_retrieve_display() {
        let err = RdebootstrapError::DownloadRetrieve {
            what: "Release".to_string(),
            reason: "wget exited with status 4".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "download failed: Release: wget exited with status 4"
        );
    }

    #[test]
    fn test_download_validate_display() {
        let err = RdebootstrapError::DownloadValidate {
            what: "Packages.gz".to_string(),
            reason: "sha256 mismatch".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "validation failed for Packages.gz: sha256 mismatch"
        );
    }

    #[test]
    fn test_decompress_display() {
        let err = RdebootstrapError::Decompress {
            what: "Packages.gz".to_string(),
            reason: "unexpected EOF".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to decompress Packages.gz: unexpected EOF"
        );
    }

    #[test]
    fn test_io_display() {
        let source = io::Error::new(io::ErrorKind::NotFound, "entity not found");
        let err = RdebootstrapError::Io {
            context: "/var/cache/bootstrap/libc6.deb".to_string(),
            message: "I/O error: not found".to_string(),
            source,
        };
        assert_eq!(
            err.to_string(),
            "/var/cache/bootstrap/libc6.deb: I/O error: not found"
        );
    }

    #[test]
    fn test_io_source_preserved() {
        let source = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err = RdebootstrapError::Io {
            context: "/etc/shadow".to_string(),
            message: "I/O error: permission denied".to_string(),
            source,
        };
        match &err {
            RdebootstrapError::Io { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_io_error_kind_message_other() {
        let err = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        let msg = io_error_kind_message(&err);
        assert!(msg.starts_with("I/O error: "));
    }

    #[test]
    fn test_into_anyhow_error() {
        let err = RdebootstrapError::Validation("test".to_string());
        let anyhow_err: anyhow::Error = err.into();
        let downcast = anyhow_err.downcast_ref::<RdebootstrapError>();
        assert!(downcast.is_some());
        assert!(matches!(downcast.unwrap(), RdebootstrapError::Validation(_)));
    }
}
