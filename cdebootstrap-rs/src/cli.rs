//! Command-line surface: argument parsing and the `--debug`/`-q`/`-v`
//! verbosity-to-[`LogLevel`] mapping consumed by `init_logging`.

use camino::Utf8PathBuf;
use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Top-level arguments. `suite`/`target` are the positional archive suite
/// and target directory; when `command` selects `completions` they are
/// left unset and the bootstrap run never starts.
#[derive(Parser, Debug)]
#[command(name = "cdebootstrap-rs", version, about, long_about = None)]
pub struct Cli {
    /// Archive suite to bootstrap, e.g. `bookworm`.
    pub suite: Option<String>,

    /// Directory to install the new system into.
    pub target: Option<Utf8PathBuf>,

    /// Mirror base URL.
    #[arg(default_value = "http://ftp.debian.org/debian")]
    pub mirror: String,

    /// Target architecture, e.g. `amd64`.
    #[arg(short = 'a', long, default_value_t = default_arch())]
    pub arch: String,

    /// Directory holding suite configuration subdirectories.
    #[arg(short = 'c', long, default_value = "/usr/share/cdebootstrap-rs")]
    pub configdir: Utf8PathBuf,

    /// Stop after caching every required `.deb`, before running any action.
    #[arg(short = 'd', long)]
    pub download_only: bool,

    /// Flavour of the suite's default package set.
    #[arg(short = 'f', long, default_value = "standard")]
    pub flavour: String,

    /// Directory of install/remove helper scripts run around dpkg unpack.
    #[arg(short = 'H', long)]
    pub helperdir: Option<Utf8PathBuf>,

    /// Keyring used to verify Release/InRelease signatures.
    #[arg(short = 'k', long)]
    pub keyring: Option<Utf8PathBuf>,

    /// Skip Release/InRelease signature verification entirely.
    #[arg(long)]
    pub allow_unauthenticated: bool,

    /// Force debug-level logging, equivalent to several `-v`.
    #[arg(long)]
    pub debug: bool,

    /// Lower verbosity; repeatable.
    #[arg(short = 'q', long, action = ArgAction::Count)]
    pub quiet: u8,

    /// Raise verbosity; repeatable.
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Packages to force into the install list, regardless of suite config.
    #[arg(long, value_delimiter = ',')]
    pub include: Vec<String>,

    /// Packages to drop from the install list, regardless of suite config.
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Record actions as a foreign-mode script instead of running them now.
    #[arg(long)]
    pub foreign: bool,

    /// Overrides which `configdir` subdirectory is used for suite config,
    /// independent of the archive suite name.
    #[arg(long)]
    pub suite_config: Option<String>,

    /// Legacy variant selector; `buildd`/`fakechroot` are historical aliases.
    #[arg(long, value_enum)]
    pub variant: Option<VariantArg>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a shell completion script to stdout.
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Raw `--variant` spelling. Legacy-alias resolution happens in
/// [`VariantArg::as_raw`] plus `context::Variant::resolve`, not here, so
/// the mapping stays unit-testable on its own.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    Buildd,
    Fakechroot,
}

impl VariantArg {
    pub fn as_raw(self) -> &'static str {
        match self {
            VariantArg::Buildd => "buildd",
            VariantArg::Fakechroot => "fakechroot",
        }
    }
}

/// Verbosity levels driving `init_logging`'s `tracing-subscriber` filter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Folds `--debug`/`-q`/`-v` into a single [`LogLevel`]. `--debug` sets the
/// floor at `Debug`; `-q` lowers toward `Error`, `-v` raises toward
/// `Trace`, both clamped to the enum's range.
pub fn resolve_log_level(debug: bool, quiet: u8, verbose: u8) -> LogLevel {
    const LEVELS: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];
    let base: i32 = if debug { 1 } else { 2 };
    let index = (base - verbose as i32 + quiet as i32).clamp(0, LEVELS.len() as i32 - 1);
    LEVELS[index as usize]
}

/// Parses `std::env::args_os()` into a [`Cli`].
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

fn default_arch() -> String {
    match std::env::consts::ARCH {
        "x86_64" => "amd64".to_string(),
        "aarch64" => "arm64".to_string(),
        "x86" => "i386".to_string(),
        "arm" => "armhf".to_string(),
        other => other.to_string(),
    }
}
