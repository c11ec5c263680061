//! Finalizer: writes `/etc/apt/sources.list`, `/etc/hosts`, and
//! `/etc/resolv.conf` inside the target once every action has run, and
//! performs the two-stage foreign-mode init handoff.

use crate::context::Context;
use crate::error::RdebootstrapError;
use crate::executor::ForeignExecutor;
use crate::mirror::Scheme;
use crate::target::TargetTree;

/// Writes `/etc/apt/sources.list`, `/etc/hosts`, and `/etc/resolv.conf`
/// natively (directly onto the target filesystem).
pub fn finalize_native(ctx: &Context, target: &TargetTree) -> Result<(), RdebootstrapError> {
    if let Some(line) = sources_list_line(ctx) {
        write_file(target, "etc/apt/sources.list", &line)?;
    }
    write_hosts_and_resolv_conf(target)
}

/// Writes `/etc/hosts` and copies `/etc/resolv.conf`, unconditionally
/// against the target filesystem. Unlike `/etc/apt/sources.list`, these
/// two have no foreign-mode deferral: the original always writes them
/// straight to the target, foreign or not.
pub fn write_hosts_and_resolv_conf(target: &TargetTree) -> Result<(), RdebootstrapError> {
    write_file(target, "etc/hosts", "127.0.0.1 localhost\n")?;

    match std::fs::read("/etc/resolv.conf") {
        Ok(contents) => {
            let dest = target.resolve("etc/resolv.conf");
            std::fs::write(&dest, contents).map_err(|e| RdebootstrapError::io(dest.to_string(), e))?;
        }
        Err(_) => tracing::info!("host /etc/resolv.conf not present, skipping copy into target"),
    }

    Ok(())
}

/// Emits the `/etc/apt/sources.list` line into the foreign script instead
/// of writing the target filesystem directly. `/etc/hosts` and
/// `/etc/resolv.conf` are not deferred here — the caller writes those via
/// [`write_hosts_and_resolv_conf`] regardless of foreign mode.
pub fn finalize_foreign(ctx: &Context, foreign: &ForeignExecutor) {
    if let Some(line) = sources_list_line(ctx) {
        foreign.append_line(format!("echo {line:?} > /etc/apt/sources.list"));
    }
}

/// Performs the foreign-mode finish sequence: move the real init aside,
/// symlink the stub in its place, and append the cleanup lines.
pub fn finish_foreign(target: &TargetTree, foreign: &ForeignExecutor) -> Result<(), RdebootstrapError> {
    let init = target.resolve("sbin/init");
    let init_foreign = target.resolve("sbin/init.foreign");

    if init.exists() {
        std::fs::rename(&init, &init_foreign)
            .map_err(|e| RdebootstrapError::io(init.to_string(), e))?;
        #[cfg(unix)]
        std::os::unix::fs::symlink("/sbin/cdebootstrap-foreign", &init)
            .map_err(|e| RdebootstrapError::io(init.to_string(), e))?;
    }

    foreign.append_line("rm -f /sbin/cdebootstrap-foreign");
    foreign.append_line("rm -f /second-stage-script");

    Ok(())
}

fn sources_list_line(ctx: &Context) -> Option<String> {
    match ctx.mirror.scheme {
        Scheme::File => None,
        Scheme::Http | Scheme::Ftp | Scheme::Ssh => Some(format!(
            "deb {}://{}{} {} main\n",
            ctx.mirror.scheme, ctx.mirror.host, ctx.mirror.path, ctx.suite_name
        )),
    }
}

fn write_file(target: &TargetTree, rel: &str, contents: &str) -> Result<(), RdebootstrapError> {
    let path = target.resolve(rel);
    std::fs::write(&path, contents).map_err(|e| RdebootstrapError::io(path.to_string(), e))
}
