//! Mount-namespace isolation: unshares `CLONE_NEWNS` and remounts `/` as
//! private-recursive so mounts performed inside the target do not leak
//! back to the host.
//!
//! Run once in install-init, skipped entirely in foreign mode (nothing
//! is mounted there — every action is just a recorded script line).

use rustix::fs::{mount_change, MountPropagationFlags};
use rustix::thread::{unshare, UnshareFlags};

/// Attempts to isolate the process's mount namespace. Failure (commonly
/// `EPERM` when not running as root, or an unsupported kernel) is logged
/// as a warning and treated as non-fatal: the caller continues in native
/// mode rather than aborting the whole run.
pub fn prepare_mount_namespace() {
    if let Err(e) = unshare(UnshareFlags::NEWNS) {
        tracing::warn!(error = %e, "unshare(CLONE_NEWNS) failed, continuing without mount isolation");
        return;
    }

    if let Err(e) = mount_change(
        "/",
        MountPropagationFlags::PRIVATE | MountPropagationFlags::REC,
    ) {
        tracing::warn!(error = %e, "failed to remount / as private-recursive after unshare");
    }
}
