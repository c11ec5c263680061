//! Index Fetcher: downloads and validates `Release`/`InRelease` and the
//! suite's `Packages` index, then hands the parsed universe back to the
//! driver.

use std::io::Read;

use camino::Utf8PathBuf;
use debuniverse::{parse_packages, parse_release, Package, Release};
use flate2::read::GzDecoder;
use sha2::Digest;

use crate::context::Context;
use crate::error::RdebootstrapError;
use crate::executor::{CommandExecutor, CommandSpec};
use crate::gpg::SignatureVerifier;

/// Result of fetching and parsing the suite's indices.
pub struct FetchedIndices {
    pub release: Release,
    pub packages: Vec<Package>,
}

/// Downloads and verifies the release metadata and package index for the
/// suite named by `ctx.suite_name`.
///
/// Tries `InRelease` (an inline-signed combined file) first; on download
/// failure or signature rejection it falls back to the classic
/// `Release` + detached `Release.gpg` pair. When `ctx.authentication` is
/// false, a failed signature check downgrades to a warning instead of
/// aborting the fetch.
pub fn download_indices(
    ctx: &Context,
    executor: &dyn CommandExecutor,
    verifier: &dyn SignatureVerifier,
) -> Result<FetchedIndices, RdebootstrapError> {
    std::fs::create_dir_all(ctx.cache_dir())
        .map_err(|e| RdebootstrapError::io(ctx.cache_dir().to_string(), e))?;

    let release_text = fetch_release(ctx, executor, verifier)?;
    let release = parse_release(&release_text).map_err(|e| RdebootstrapError::DownloadParse {
        what: "Release".to_string(),
        reason: e.to_string(),
    })?;

    let packages_text = fetch_packages(ctx, executor, &release)?;
    let packages = parse_packages(&packages_text).map_err(|e| RdebootstrapError::DownloadParse {
        what: "Packages".to_string(),
        reason: e.to_string(),
    })?;

    Ok(FetchedIndices { release, packages })
}

fn fetch_release(
    ctx: &Context,
    executor: &dyn CommandExecutor,
    verifier: &dyn SignatureVerifier,
) -> Result<String, RdebootstrapError> {
    let dists_path = format!("dists/{}", ctx.suite_name);

    let in_release_path = ctx.cache_dir().join("InRelease");
    if download_file(ctx, executor, &format!("{dists_path}/InRelease"), &in_release_path).is_ok() {
        match verifier.verify(&in_release_path, &in_release_path) {
            Ok(()) => return read_to_string(&in_release_path, "InRelease"),
            Err(e) if ctx.authentication => {
                tracing::warn!(error = %e, "InRelease signature check failed, falling back to Release");
            }
            Err(e) => {
                tracing::warn!(error = %e, "InRelease signature check failed (authentication disabled, continuing)");
                return read_to_string(&in_release_path, "InRelease");
            }
        }
    }

    let release_path = ctx.cache_dir().join("Release");
    let sig_path = ctx.cache_dir().join("Release.gpg");
    download_file(ctx, executor, &format!("{dists_path}/Release"), &release_path)?;
    download_file(ctx, executor, &format!("{dists_path}/Release.gpg"), &sig_path)?;

    match verifier.verify(&release_path, &sig_path) {
        Ok(()) => {}
        Err(e) if ctx.authentication => return Err(e),
        Err(e) => tracing::warn!(error = %e, "Release signature check failed (authentication disabled, continuing)"),
    }

    read_to_string(&release_path, "Release")
}

fn fetch_packages(
    ctx: &Context,
    executor: &dyn CommandExecutor,
    release: &Release,
) -> Result<String, RdebootstrapError> {
    let component_path = format!("main/binary-{}/Packages.gz", ctx.arch);
    let dists_path = format!("dists/{}", ctx.suite_name);

    let dest = ctx.cache_dir().join("Packages.gz");

    let cached_is_valid = ctx.authentication
        && dest.exists()
        && release
            .files
            .get(&component_path)
            .is_some_and(|entry| verify_checksum(&dest, &entry.sha256).is_ok());

    if cached_is_valid {
        tracing::info!(path = %dest, "reusing cached Packages.gz, checksum matches Release");
    } else {
        download_file(ctx, executor, &format!("{dists_path}/{component_path}"), &dest)?;

        if ctx.authentication {
            if let Some(entry) = release.files.get(&component_path) {
                verify_checksum(&dest, &entry.sha256)?;
            } else {
                tracing::warn!(path = %component_path, "Packages.gz not listed in Release, skipping checksum check");
            }
        }
    }

    decompress_gzip(&dest)
}

fn verify_checksum(path: &Utf8PathBuf, expected_sha256: &str) -> Result<(), RdebootstrapError> {
    let bytes = std::fs::read(path).map_err(|e| RdebootstrapError::io(path.to_string(), e))?;
    let digest = sha2::Sha256::digest(&bytes);
    let actual = hex::encode(digest);
    if !actual.eq_ignore_ascii_case(expected_sha256) {
        return Err(RdebootstrapError::DownloadValidate {
            what: path.to_string(),
            reason: format!("sha256 mismatch: expected {expected_sha256}, got {actual}"),
        });
    }
    Ok(())
}

fn decompress_gzip(path: &Utf8PathBuf) -> Result<String, RdebootstrapError> {
    let file = std::fs::File::open(path).map_err(|e| RdebootstrapError::io(path.to_string(), e))?;
    let mut decoder = GzDecoder::new(file);
    let mut out = String::new();
    decoder
        .read_to_string(&mut out)
        .map_err(|e| RdebootstrapError::Decompress {
            what: path.to_string(),
            reason: e.to_string(),
        })?;
    Ok(out)
}

fn download_file(
    ctx: &Context,
    executor: &dyn CommandExecutor,
    source_rel: &str,
    dest: &Utf8PathBuf,
) -> Result<(), RdebootstrapError> {
    let spec = ctx.mirror.fetch_command(source_rel, dest);
    let result = executor
        .execute(&spec)
        .map_err(|e| RdebootstrapError::DownloadRetrieve {
            what: source_rel.to_string(),
            reason: e.to_string(),
        })?;
    if !result.success() {
        return Err(RdebootstrapError::DownloadRetrieve {
            what: source_rel.to_string(),
            reason: format!("{} exited with {:?}", spec.command, result.code()),
        });
    }
    Ok(())
}

fn read_to_string(path: &Utf8PathBuf, what: &str) -> Result<String, RdebootstrapError> {
    std::fs::read_to_string(path).map_err(|e| RdebootstrapError::DownloadRetrieve {
        what: what.to_string(),
        reason: e.to_string(),
    })
}
