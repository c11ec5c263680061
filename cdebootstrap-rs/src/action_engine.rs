//! Action Engine: walks the suite's ordered `actions` list, dispatches
//! each active action against a fixed set of kinds, and maintains the
//! "current priority list" memo shared across consecutive install-family
//! actions.

use debuniverse::{Package, PackageTable, Priority, Status};

use crate::context::Context;
use crate::debcache;
use crate::debextract;
use crate::error::RdebootstrapError;
use crate::executor::{CommandExecutor, CommandSpec};
use crate::installlist;
use crate::suiteconfig::{Action, ActionKind};
use crate::target::TargetTree;

/// The maximum status an install-family action should seed from — a
/// package already at or past this status doesn't need to be acted on
/// again by the same action kind.
const UNBOUNDED_STATUS: Status = Status::Installed;

/// Encapsulates the "current priority list" memo: the list recomputed
/// only when the requested priority differs from the last one used.
///
/// Holds package *names*, not borrowed [`Package`]s: the engine mutates
/// package statuses in the same table this memo was computed from, so a
/// held `&Package` would alias that mutation.
///
/// `None` means no memo is held yet — distinct from every real
/// `Priority` discriminant, so a package-scoped action (which always
/// invalidates the memo) can be represented without a fake enum member.
#[derive(Default)]
struct PriorityMemo {
    priority: Option<Priority>,
    list: Vec<String>,
}

impl PriorityMemo {
    fn get_or_compute(&mut self, table: &PackageTable, install: &[String], priority: Priority) -> &[String] {
        if self.priority != Some(priority) {
            self.list = installlist::install_list(table, install, priority, UNBOUNDED_STATUS);
            self.priority = Some(priority);
        }
        &self.list
    }

    fn invalidate(&mut self) {
        self.priority = None;
        self.list.clear();
    }
}

/// Selected priority (or package-scoped target) for one install-family
/// action, computed per the dispatch rule in the Action Engine's design.
enum Selection {
    /// Use the priority memo.
    Priority(Priority),
    /// Configure with no explicit target: every unpacked package.
    AllUnpacked,
    /// A single named package, verified present in its dependency closure.
    Package(String),
    /// A single named package, no closure.
    PackageOnly(String),
    /// Nothing to do; the action is skipped.
    Skip,
}

fn select(action: &Action, table: &PackageTable) -> Selection {
    if let Some(what) = &action.what {
        if let Some(priority) = Priority::parse_name(what) {
            return Selection::Priority(priority);
        }
    }

    match action.kind {
        ActionKind::Extract => Selection::Priority(Priority::Required),
        ActionKind::DpkgConfigure if action.what.is_none() => Selection::AllUnpacked,
        _ => match &action.what {
            Some(name) => {
                if action.flags.only {
                    match installlist::install_list_package_only(table, name, UNBOUNDED_STATUS) {
                        Some(found) => Selection::PackageOnly(found),
                        None => Selection::Skip,
                    }
                } else {
                    let closure = installlist::install_list_package(table, name, UNBOUNDED_STATUS);
                    if closure.iter().any(|n| n == name) {
                        Selection::Package(name.clone())
                    } else {
                        Selection::Skip
                    }
                }
            }
            None => Selection::Skip,
        },
    }
}

/// Walks `suite.actions` in order, dispatching each active one.
pub struct ActionEngine<'a> {
    ctx: &'a Context,
    target: &'a TargetTree,
    executor: &'a dyn CommandExecutor,
    helperdir: Option<&'a camino::Utf8Path>,
    memo: PriorityMemo,
}

impl<'a> ActionEngine<'a> {
    pub fn new(ctx: &'a Context, target: &'a TargetTree, executor: &'a dyn CommandExecutor) -> Self {
        Self {
            ctx,
            target,
            executor,
            helperdir: ctx.helperdir.as_deref(),
            memo: PriorityMemo::default(),
        }
    }

    /// Runs every active action against `table`/`install` in order.
    /// Aborts on the first failing action; no rollback is attempted.
    pub fn run(
        &mut self,
        actions: &[Action],
        table: &mut PackageTable,
        install: &[String],
    ) -> Result<(), RdebootstrapError> {
        for action in actions {
            if !action.activate {
                continue;
            }
            self.dispatch(action, table, install)?;
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        action: &Action,
        table: &mut PackageTable,
        install: &[String],
    ) -> Result<(), RdebootstrapError> {
        match action.kind {
            ActionKind::Extract => self.run_extract(action, table, install),
            ActionKind::AptInstall => self.run_apt_install(action, table, install),
            ActionKind::DpkgUnpack => self.run_dpkg(action, table, install, DpkgMode::Unpack),
            ActionKind::DpkgInstall => self.run_dpkg(action, table, install, DpkgMode::Install),
            ActionKind::DpkgConfigure => self.run_dpkg(action, table, install, DpkgMode::Configure),
            ActionKind::HelperInstall => self.run_helper_install(action, table),
            ActionKind::HelperRemove => self.run_helper_remove(action),
            ActionKind::Mount => self.run_mount(action),
        }
    }

    fn selected_packages(
        &mut self,
        action: &Action,
        table: &PackageTable,
        install: &[String],
    ) -> Option<Vec<String>> {
        match select(action, table) {
            Selection::Priority(p) => Some(self.memo.get_or_compute(table, install, p).to_vec()),
            Selection::AllUnpacked => {
                self.memo.invalidate();
                Some(
                    table
                        .iter()
                        .filter(|p| p.status >= Status::Unpacked && p.status < Status::Installed)
                        .map(|p| p.name.clone())
                        .collect(),
                )
            }
            Selection::Package(name) => {
                self.memo.invalidate();
                Some(vec![name])
            }
            Selection::PackageOnly(name) => {
                self.memo.invalidate();
                Some(vec![name])
            }
            Selection::Skip => {
                tracing::warn!(action = %action.kind, what = ?action.what, "no target resolved for action, skipping");
                None
            }
        }
    }

    fn run_extract(
        &mut self,
        action: &Action,
        table: &mut PackageTable,
        install: &[String],
    ) -> Result<(), RdebootstrapError> {
        let Some(names) = self.selected_packages(action, table, install) else {
            return Ok(());
        };

        for name in &names {
            let Some(pkg) = table.get(name) else { continue };
            let deb_path = debcache::cache_path(self.ctx, pkg);
            debextract::extract_data_tar(&deb_path, self.target.root())?;
            tracing::info!(package = %pkg.name, "extracted");
        }

        advance_status(table, &names, Status::Unpacked);
        Ok(())
    }

    fn run_apt_install(
        &mut self,
        action: &Action,
        table: &mut PackageTable,
        install: &[String],
    ) -> Result<(), RdebootstrapError> {
        let Some(names) = self.selected_packages(action, table, install) else {
            return Ok(());
        };
        let mut args = vec!["install".to_string(), "-y".to_string()];
        args.extend(names.iter().cloned());

        let spec = CommandSpec::new("apt-get", args).with_envs(self.ctx.child_environment());
        let result = self.executor.execute(&spec)?;
        if !result.success() {
            return Err(RdebootstrapError::Execution {
                command: "apt-get".to_string(),
                status: format!("exit {:?}", result.code()),
            });
        }
        apply_status_updates(table, &result.status_updates);
        Ok(())
    }

    fn run_dpkg(
        &mut self,
        action: &Action,
        table: &mut PackageTable,
        install: &[String],
        mode: DpkgMode,
    ) -> Result<(), RdebootstrapError> {
        let Some(names) = self.selected_packages(action, table, install) else {
            return Ok(());
        };

        let mut args = vec![mode.flag().to_string()];
        if matches!(mode, DpkgMode::Configure) {
            args.push("-a".to_string());
        }
        args.push("--status-fd".to_string());
        args.push("3".to_string());
        if action.flags.force && mode.supports_force_all() {
            args.push("--force-all".to_string());
        }

        if matches!(mode, DpkgMode::Install | DpkgMode::Unpack) {
            for name in &names {
                if let Some(p) = table.get(name) {
                    args.push(format!("/var/cache/bootstrap/{}", deb_basename(p)));
                }
            }
        }

        let spec = CommandSpec::new("dpkg", args).with_status_fd(true).with_envs(self.ctx.child_environment());
        let result = self.executor.execute(&spec)?;
        if !result.success() {
            return Err(RdebootstrapError::Execution {
                command: "dpkg".to_string(),
                status: format!("exit {:?}", result.code()),
            });
        }
        apply_status_updates(table, &result.status_updates);
        Ok(())
    }

    fn run_helper_install(&mut self, action: &Action, table: &mut PackageTable) -> Result<(), RdebootstrapError> {
        let Some(what) = &action.what else {
            tracing::warn!("helper-install action with no What field, skipping");
            return Ok(());
        };
        let Some(helperdir) = self.helperdir else {
            tracing::warn!(helper = %what, "no --helperdir configured, skipping helper-install");
            return Ok(());
        };

        let src = helperdir.join(format!("{what}.deb"));
        let dest = self.ctx.cache_dir().join(format!("{what}.deb"));
        std::fs::create_dir_all(self.ctx.cache_dir()).map_err(|e| RdebootstrapError::io(self.ctx.cache_dir().to_string(), e))?;
        std::fs::copy(&src, &dest).map_err(|e| RdebootstrapError::io(src.to_string(), e))?;

        let spec = CommandSpec::new(
            "dpkg",
            vec![
                "--install".to_string(),
                "--status-fd".to_string(),
                "3".to_string(),
                format!("/var/cache/bootstrap/{what}.deb"),
            ],
        )
        .with_status_fd(true)
        .with_envs(self.ctx.child_environment());
        let result = self.executor.execute(&spec)?;
        if !result.success() {
            return Err(RdebootstrapError::Execution {
                command: "dpkg".to_string(),
                status: format!("exit {:?}", result.code()),
            });
        }
        apply_status_updates(table, &result.status_updates);
        Ok(())
    }

    fn run_helper_remove(&mut self, action: &Action) -> Result<(), RdebootstrapError> {
        let Some(what) = &action.what else {
            tracing::warn!("helper-remove action with no What field, skipping");
            return Ok(());
        };
        let spec = CommandSpec::new("dpkg", vec!["--purge".to_string(), what.clone()]).with_envs(self.ctx.child_environment());
        let result = self.executor.execute(&spec)?;
        if !result.success() {
            return Err(RdebootstrapError::Execution {
                command: "dpkg".to_string(),
                status: format!("exit {:?}", result.code()),
            });
        }
        Ok(())
    }

    fn run_mount(&mut self, action: &Action) -> Result<(), RdebootstrapError> {
        match action.what.as_deref() {
            Some("proc") => {
                let spec = CommandSpec::new(
                    "mount",
                    vec!["-t".to_string(), "proc".to_string(), "proc".to_string(), "/proc".to_string()],
                );
                let result = self.executor.execute(&spec)?;
                if !result.success() {
                    return Err(RdebootstrapError::Isolation(format!(
                        "mount proc failed: exit {:?}",
                        result.code()
                    )));
                }
                Ok(())
            }
            other => {
                tracing::warn!(target = ?other, "unknown mount target, skipping");
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DpkgMode {
    Unpack,
    Install,
    Configure,
}

impl DpkgMode {
    fn flag(self) -> &'static str {
        match self {
            Self::Unpack => "--unpack",
            Self::Install => "--install",
            Self::Configure => "--configure",
        }
    }

    fn supports_force_all(self) -> bool {
        matches!(self, Self::Unpack | Self::Configure)
    }
}

fn deb_basename(pkg: &Package) -> String {
    pkg.filename
        .file_name()
        .unwrap_or(pkg.filename.as_str())
        .to_string()
}

/// Advances named packages' status, never regressing it (status
/// monotonicity).
fn advance_status(table: &mut PackageTable, names: &[String], status: Status) {
    for name in names {
        if let Some(pkg) = table.get_mut(name) {
            if status > pkg.status {
                pkg.status = status;
            }
        }
    }
}

fn apply_status_updates(table: &mut PackageTable, updates: &[(String, Status)]) {
    for (name, status) in updates {
        if let Some(pkg) = table.get_mut(name) {
            if *status > pkg.status {
                pkg.status = *status;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ForeignExecutor;
    use crate::mirror::Mirror;
    use crate::suiteconfig::ActionFlags as Flags;
    use camino::Utf8PathBuf;
    use debuniverse::{Dependency, DependencyGroup};

    fn sample_ctx(target_root: Utf8PathBuf) -> Context {
        Context {
            target_root,
            mirror: Mirror::parse("http://ftp.debian.org/debian").unwrap(),
            suite_name: "bookworm".to_string(),
            arch: "amd64".to_string(),
            flavour: "standard".to_string(),
            configdir: Utf8PathBuf::from("/etc/cdebootstrap-rs"),
            helperdir: None,
            keyring: None,
            authentication: true,
            download_only: false,
            foreign: true,
            include: Vec::new(),
            exclude: Vec::new(),
            suite_config: None,
            variant: None,
        }
    }

    fn pkg(name: &str, priority: Priority) -> Package {
        Package {
            name: name.to_string(),
            version: "1".to_string(),
            priority,
            essential: false,
            filename: Utf8PathBuf::from(format!("pool/{name}.deb")),
            size: 10,
            sha256: None,
            status: Status::NotInstalled,
            depends: Vec::<DependencyGroup>::new(),
            pre_depends: Vec::new(),
        }
    }

    #[test]
    fn dpkg_configure_with_no_what_selects_all_unpacked() {
        let action = Action {
            kind: ActionKind::DpkgConfigure,
            what: None,
            comment: None,
            flags: Flags::default(),
            flavour: Vec::new(),
            activate: true,
        };
        let mut unpacked = pkg("bash", Priority::Important);
        unpacked.status = Status::Unpacked;
        let table = PackageTable::new(vec![unpacked, pkg("libc6", Priority::Required)]);

        let selection_is_all_unpacked = matches!(select(&action, &table), Selection::AllUnpacked);
        assert!(selection_is_all_unpacked);
    }

    #[test]
    fn priority_memo_reuses_list_for_same_priority() {
        let table = PackageTable::new(vec![pkg("bash", Priority::Important)]);
        let install: Vec<String> = table.iter().map(|p| p.name.clone()).collect();
        let mut memo = PriorityMemo::default();

        memo.get_or_compute(&table, &install, Priority::Important);
        assert_eq!(memo.priority, Some(Priority::Important));
        let first_len = memo.list.len();
        memo.get_or_compute(&table, &install, Priority::Important);
        assert_eq!(memo.list.len(), first_len);
    }

    #[test]
    fn priority_change_invalidates_memo() {
        let table = PackageTable::new(vec![pkg("bash", Priority::Important), pkg("libc6", Priority::Required)]);
        let install: Vec<String> = table.iter().map(|p| p.name.clone()).collect();
        let mut memo = PriorityMemo::default();

        memo.get_or_compute(&table, &install, Priority::Important);
        memo.get_or_compute(&table, &install, Priority::Required);
        assert_eq!(memo.priority, Some(Priority::Required));
    }

    fn build_test_deb(contents: &[u8]) -> Vec<u8> {
        let mut tar_bytes = Vec::new();
        {
            let mut builder = tar::Builder::new(&mut tar_bytes);
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, "./usr/bin/extracted", contents)
                .unwrap();
            builder.finish().unwrap();
        }

        let mut deb_bytes = Vec::new();
        {
            let mut builder = ar::Builder::new(&mut deb_bytes);
            let header = ar::Header::new(b"debian-binary".to_vec(), 4);
            builder.append(&header, &b"2.0\n"[..]).unwrap();
            let header = ar::Header::new(b"data.tar".to_vec(), tar_bytes.len() as u64);
            builder.append(&header, &tar_bytes[..]).unwrap();
        }
        deb_bytes
    }

    /// Extract is still performed unconditionally against the target
    /// root in foreign mode: only the recorded-command actions (dpkg,
    /// apt-get, mount, ...) are deferred into the foreign script, never
    /// the direct data.tar unpack.
    #[test]
    fn extract_runs_in_foreign_mode_too_instead_of_emitting_a_script_line() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let ctx = sample_ctx(root.clone());
        let target = TargetTree::new(&root).unwrap();
        let foreign = ForeignExecutor::new();

        let mut pkg = pkg("libc6", Priority::Required);
        let deb_bytes = build_test_deb(b"fake binary");
        pkg.size = deb_bytes.len() as u64;
        let mut table = PackageTable::new(vec![pkg]);
        let cache_pkg = table.get("libc6").unwrap().clone();
        let deb_path = debcache::cache_path(&ctx, &cache_pkg);
        std::fs::create_dir_all(deb_path.parent().unwrap()).unwrap();
        std::fs::write(&deb_path, &deb_bytes).unwrap();

        let install: Vec<String> = Vec::new();
        let action = Action {
            kind: ActionKind::Extract,
            what: Some("required".to_string()),
            comment: None,
            flags: Flags::default(),
            flavour: Vec::new(),
            activate: true,
        };

        {
            let mut engine = ActionEngine::new(&ctx, &target, &foreign);
            engine.run(std::slice::from_ref(&action), &mut table, &install).unwrap();
        }

        let script = foreign.into_script();
        assert!(!script.contains("dpkg"));
        assert_eq!(
            std::fs::read(target.resolve("usr/bin/extracted")).unwrap(),
            b"fake binary"
        );
        assert_eq!(table.get("libc6").unwrap().status, Status::Unpacked);
    }

    #[test]
    fn status_never_regresses() {
        let mut table = PackageTable::new(vec![pkg("libc6", Priority::Required)]);
        table.get_mut("libc6").unwrap().status = Status::Installed;
        advance_status(&mut table, &["libc6".to_string()], Status::Unpacked);
        assert_eq!(table.get("libc6").unwrap().status, Status::Installed);
    }
}
