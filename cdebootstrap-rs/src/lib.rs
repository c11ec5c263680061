pub mod action_engine;
pub mod cli;
pub mod context;
pub mod debcache;
pub mod debextract;
pub mod driver;
pub mod error;
pub mod executor;
pub mod finalizer;
pub mod gpg;
pub mod indexfetcher;
pub mod installlist;
pub mod mirror;
pub mod suiteconfig;
pub mod target;

pub use error::RdebootstrapError;

use anyhow::{Context as _, Result};
use tracing_subscriber::{filter::LevelFilter, FmtSubscriber};

pub fn init_logging(log_level: cli::LogLevel) -> Result<()> {
    let filter = match log_level {
        cli::LogLevel::Trace => LevelFilter::TRACE,
        cli::LogLevel::Debug => LevelFilter::DEBUG,
        cli::LogLevel::Info => LevelFilter::INFO,
        cli::LogLevel::Warn => LevelFilter::WARN,
        cli::LogLevel::Error => LevelFilter::ERROR,
    };

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder().with_max_level(filter).finish(),
    )
    .context("failed to set global default tracing subscriber")
}
