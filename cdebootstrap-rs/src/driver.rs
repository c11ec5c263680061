//! Driver: wires the Target Tree, Suite Config, Index Fetcher, Install
//! List Builder, Deb Cache, Executor, Action Engine and Finalizer
//! together into one end-to-end bootstrap run.

use std::sync::Arc;

use debuniverse::{Package, PackageTable};

use crate::action_engine::ActionEngine;
use crate::context::Context;
use crate::error::RdebootstrapError;
use crate::executor::{prepare_mount_namespace, ChrootExecutor, CommandExecutor, ForeignExecutor, NativeExecutor};
use crate::gpg::{GpgvVerifier, SignatureVerifier};
use crate::suiteconfig::{self, LoadOutcome, SuiteConfig};
use crate::target::TargetTree;
use crate::{debcache, finalizer, indexfetcher, installlist};

/// Prepares the directories and empty files every bootstrap run needs to
/// exist under the target root before anything else runs, mirroring the
/// original's `/var/cache/bootstrap` and `/var/lib/dpkg` skeleton.
fn prepare_target_tree(target: &TargetTree) -> Result<(), RdebootstrapError> {
    for dir in [
        "var",
        "var/cache",
        "var/cache/bootstrap",
        "var/lib",
        "var/lib/dpkg",
        "etc",
        "etc/apt",
        "sbin",
    ] {
        target.create_dir(dir)?;
    }
    for file in ["var/lib/dpkg/status", "var/lib/dpkg/available", "var/lib/dpkg/diversions"] {
        target.create_empty_file(file)?;
    }
    Ok(())
}

/// Resolves the suite configuration to use, handling the deferred case
/// where the catalogue names a suite with no `Config` subdirectory: the
/// real codename only becomes known once the `Release` file is
/// downloaded, so a first pass with `ctx.suite_name` is attempted before
/// indices are fetched and a second pass (keyed by `release.codename`)
/// runs if the first deferred.
fn resolve_suite_config(
    ctx: &Context,
    codename: Option<&str>,
) -> Result<Option<SuiteConfig>, RdebootstrapError> {
    let config_name = ctx.suite_config.as_deref().unwrap_or(&ctx.suite_name);
    match codename {
        None => match suiteconfig::init_primary(&ctx.configdir, config_name)? {
            LoadOutcome::Loaded(cfg) => Ok(Some(cfg)),
            LoadOutcome::Deferred => Ok(None),
        },
        Some(codename) => suiteconfig::init_secondary(&ctx.configdir, codename),
    }
}

/// Runs the complete bootstrap pipeline for `ctx`.
pub fn run(ctx: &Context) -> Result<(), RdebootstrapError> {
    let target = TargetTree::new(&ctx.target_root)?;
    prepare_target_tree(&target)?;

    let mut suite = resolve_suite_config(ctx, None)?;

    let native: Arc<dyn CommandExecutor> = Arc::new(NativeExecutor::new());
    let verifier: Box<dyn SignatureVerifier> = if ctx.authentication {
        Box::new(GpgvVerifier::new(ctx.keyring.clone(), native.clone()))
    } else {
        Box::new(crate::gpg::AlwaysValidVerifier)
    };

    let indices = indexfetcher::download_indices(ctx, native.as_ref(), verifier.as_ref())?;

    if suite.is_none() {
        suite = resolve_suite_config(ctx, Some(&indices.release.codename))?;
    }
    let mut suite = suite.ok_or_else(|| {
        RdebootstrapError::Config(format!(
            "no suite configuration resolved for {:?} (codename {:?})",
            ctx.suite_name, indices.release.codename
        ))
    })?;

    suite.filter(&ctx.arch, &ctx.flavour)?;

    let mut table = PackageTable::new(indices.packages);
    let install_list: Vec<&Package> = installlist::build_install_list(&suite, &table, ctx);
    let install_names: Vec<String> = install_list.iter().map(|p| p.name.clone()).collect();

    debcache::ensure_cached(ctx, native.as_ref(), &install_list)?;

    if ctx.download_only {
        tracing::info!("download-only requested, stopping before action execution");
        return Ok(());
    }

    if ctx.foreign {
        let foreign = ForeignExecutor::new();
        run_actions(ctx, &target, &foreign, &suite, &mut table, &install_names)?;
        finalizer::finalize_foreign(ctx, &foreign);
        finalizer::write_hosts_and_resolv_conf(&target)?;
        finalizer::finish_foreign(&target, &foreign)?;
        let script = foreign.into_script();
        let script_path = target.resolve("sbin/cdebootstrap-foreign");
        std::fs::write(&script_path, format!("#!/bin/sh\nset -e\n{script}\n"))
            .map_err(|e| RdebootstrapError::io(script_path.to_string(), e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o755);
            std::fs::set_permissions(&script_path, perms)
                .map_err(|e| RdebootstrapError::io(script_path.to_string(), e))?;
        }
    } else {
        prepare_mount_namespace();
        let chroot = ChrootExecutor::new(ctx.target_root.clone());
        run_actions(ctx, &target, &chroot, &suite, &mut table, &install_names)?;
        finalizer::finalize_native(ctx, &target)?;
    }

    Ok(())
}

fn run_actions(
    ctx: &Context,
    target: &TargetTree,
    executor: &dyn CommandExecutor,
    suite: &SuiteConfig,
    table: &mut PackageTable,
    install_names: &[String],
) -> Result<(), RdebootstrapError> {
    let mut engine = ActionEngine::new(ctx, target, executor);
    engine.run(&suite.actions, table, install_names)
}
