use std::process::ExitCode;

use cdebootstrap_rs::cli::{self, Commands};
use cdebootstrap_rs::context::{Context, Variant};
use cdebootstrap_rs::mirror::Mirror;
use cdebootstrap_rs::{driver, init_logging};

fn main() -> ExitCode {
    let args = cli::parse_args();

    // Handle completions before logging is set up, so the generated
    // script is the only thing written to stdout.
    if let Some(Commands::Completions(opts)) = &args.command {
        cli::print_completions(opts.shell);
        return ExitCode::SUCCESS;
    }

    let log_level = cli::resolve_log_level(args.debug, args.quiet, args.verbose);
    if let Err(e) = init_logging(log_level) {
        eprintln!("cdebootstrap-rs: {e:#}");
        return ExitCode::FAILURE;
    }

    let ctx = match build_context(args) {
        Ok(ctx) => ctx,
        Err(message) => {
            tracing::error!("{message}");
            return ExitCode::FAILURE;
        }
    };

    match driver::run(&ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "bootstrap failed");
            ExitCode::FAILURE
        }
    }
}

fn build_context(args: cli::Cli) -> Result<Context, String> {
    let suite_name = args.suite.ok_or_else(|| "missing required argument: SUITE".to_string())?;
    let target_root = args.target.ok_or_else(|| "missing required argument: TARGET".to_string())?;

    let mirror = Mirror::parse(&args.mirror).map_err(|e| format!("invalid mirror: {e}"))?;

    let variant = match args.variant {
        Some(v) => Some(
            Variant::resolve(v.as_raw())
                .ok_or_else(|| format!("unrecognised --variant value: {}", v.as_raw()))?,
        ),
        None => None,
    };

    Ok(Context {
        target_root,
        mirror,
        suite_name,
        arch: args.arch,
        flavour: args.flavour,
        configdir: args.configdir,
        helperdir: args.helperdir,
        keyring: args.keyring,
        authentication: !args.allow_unauthenticated,
        download_only: args.download_only,
        foreign: args.foreign,
        include: args.include,
        exclude: args.exclude,
        suite_config: args.suite_config,
        variant,
    })
}
