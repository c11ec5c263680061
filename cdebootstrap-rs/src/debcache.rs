//! Deb Cache: ensures a verified `.deb` exists in the target's bootstrap
//! cache for every package in the InstallList before the Action Engine
//! runs dpkg against it.

use camino::Utf8PathBuf;
use debuniverse::Package;
use sha2::{Digest, Sha256};

use crate::context::Context;
use crate::error::RdebootstrapError;
use crate::executor::CommandExecutor;

/// Computes the cache path for a package's `.deb`, relative to
/// `target_root/var/cache/bootstrap/`.
pub fn cache_path(ctx: &Context, pkg: &Package) -> Utf8PathBuf {
    let basename = pkg
        .filename
        .file_name()
        .unwrap_or(pkg.filename.as_str());
    ctx.cache_dir().join(basename)
}

/// Verifies a cached `.deb` against the universe's recorded size and
/// sha256. A missing sha256 record skips the hash check (size alone).
pub fn check_deb(path: &Utf8PathBuf, pkg: &Package) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if pkg.size != 0 && metadata.len() != pkg.size {
        return false;
    }

    let Some(expected) = &pkg.sha256 else {
        return true;
    };

    let Ok(bytes) = std::fs::read(path) else {
        return false;
    };
    let digest = Sha256::digest(&bytes);
    hex::encode(digest).eq_ignore_ascii_case(expected)
}

/// Ensures every package in `install_list` has a verified `.deb` in the
/// cache, downloading (via `wget`, through the executor) whatever is
/// missing or fails verification. Reports progress on the 0-400 sub-scale
/// described for this stage (outer frame reserves 50-400 for downloads).
pub fn ensure_cached<'a>(
    ctx: &Context,
    executor: &dyn CommandExecutor,
    install_list: &[&'a Package],
) -> Result<(), RdebootstrapError> {
    std::fs::create_dir_all(ctx.cache_dir())
        .map_err(|e| RdebootstrapError::io(ctx.cache_dir().to_string(), e))?;

    let bytes_total: u64 = install_list.iter().map(|p| p.size).sum();
    let mut bytes_done: u64 = 0;

    for pkg in install_list {
        let path = cache_path(ctx, pkg);

        if !check_deb(&path, pkg) {
            download_deb(ctx, executor, pkg, &path)?;
            if !check_deb(&path, pkg) {
                return Err(RdebootstrapError::DownloadValidate {
                    what: pkg.filename.to_string(),
                    reason: "size/sha256 mismatch after download".to_string(),
                });
            }
        }

        bytes_done += pkg.size;
        let progress = if bytes_total == 0 {
            400
        } else {
            50 + (350 * bytes_done / bytes_total)
        };
        tracing::info!(package = %pkg.name, progress, "package cached");
    }

    Ok(())
}

fn download_deb(
    ctx: &Context,
    executor: &dyn CommandExecutor,
    pkg: &Package,
    dest: &Utf8PathBuf,
) -> Result<(), RdebootstrapError> {
    let spec = ctx.mirror.fetch_command(pkg.filename.as_str(), dest);

    let result = executor
        .execute(&spec)
        .map_err(|e| RdebootstrapError::DownloadRetrieve {
            what: pkg.filename.to_string(),
            reason: e.to_string(),
        })?;

    if !result.success() {
        return Err(RdebootstrapError::DownloadRetrieve {
            what: pkg.filename.to_string(),
            reason: format!("{} exited with {:?} fetching {}", spec.command, result.code(), pkg.filename),
        });
    }

    Ok(())
}
