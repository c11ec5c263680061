//! Errors produced while parsing package indices.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("malformed {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("{file} stanza missing required field {field:?}")]
    MissingField { file: String, field: &'static str },
}
