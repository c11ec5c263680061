//! Signature verification, injectable so the Index Fetcher can be tested
//! without shelling out to a real keyring.

use camino::Utf8Path;

use crate::error::RdebootstrapError;
use crate::executor::{CommandExecutor, CommandSpec};

/// Verifies a detached or inline OpenPGP signature against a keyring.
pub trait SignatureVerifier: Send + Sync {
    /// Verifies `data` against `signature` (the same file for an inline
    /// `InRelease`-style signature, a separate `.gpg` file otherwise).
    fn verify(&self, data: &Utf8Path, signature: &Utf8Path) -> Result<(), RdebootstrapError>;
}

/// Shells out to `gpgv` against a configured keyring.
pub struct GpgvVerifier {
    keyring: Option<camino::Utf8PathBuf>,
    executor: std::sync::Arc<dyn CommandExecutor>,
}

impl GpgvVerifier {
    pub fn new(keyring: Option<camino::Utf8PathBuf>, executor: std::sync::Arc<dyn CommandExecutor>) -> Self {
        Self { keyring, executor }
    }
}

impl SignatureVerifier for GpgvVerifier {
    fn verify(&self, data: &Utf8Path, signature: &Utf8Path) -> Result<(), RdebootstrapError> {
        let mut args = Vec::new();
        if let Some(keyring) = &self.keyring {
            args.push("--keyring".to_string());
            args.push(keyring.to_string());
        }
        args.push(signature.to_string());
        args.push(data.to_string());

        let spec = CommandSpec::new("gpgv", args);
        let result = self
            .executor
            .execute(&spec)
            .map_err(|e| RdebootstrapError::DownloadValidate {
                what: data.to_string(),
                reason: e.to_string(),
            })?;

        if !result.success() {
            return Err(RdebootstrapError::DownloadValidate {
                what: data.to_string(),
                reason: format!("gpgv rejected signature (exit {:?})", result.code()),
            });
        }
        Ok(())
    }
}

/// Test double that accepts every signature.
pub struct AlwaysValidVerifier;

impl SignatureVerifier for AlwaysValidVerifier {
    fn verify(&self, _data: &Utf8Path, _signature: &Utf8Path) -> Result<(), RdebootstrapError> {
        Ok(())
    }
}

/// Test double that rejects every signature.
pub struct AlwaysInvalidVerifier;

impl SignatureVerifier for AlwaysInvalidVerifier {
    fn verify(&self, data: &Utf8Path, _signature: &Utf8Path) -> Result<(), RdebootstrapError> {
        Err(RdebootstrapError::DownloadValidate {
            what: data.to_string(),
            reason: "always-invalid test verifier".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_valid_accepts() {
        let verifier = AlwaysValidVerifier;
        assert!(verifier
            .verify(Utf8Path::new("Release"), Utf8Path::new("Release.gpg"))
            .is_ok());
    }

    #[test]
    fn always_invalid_rejects() {
        let verifier = AlwaysInvalidVerifier;
        assert!(verifier
            .verify(Utf8Path::new("Release"), Utf8Path::new("Release.gpg"))
            .is_err());
    }
}
