//! cli
//!
//! Command-line interface layer for countmap.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the tracing subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, loads configuration,
//! and hands off to the [`crate::pipeline`] and [`crate::render`] modules.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::ui::output::Verbosity;

/// Execution context shared by all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit configuration file from `--config`
    pub config_path: Option<PathBuf>,
    pub debug: bool,
    pub quiet: bool,
}

impl Context {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }

    /// Load configuration from `--config` or the default search path.
    pub fn load_config(&self) -> Result<Config> {
        Config::load(self.config_path.as_deref()).context("Failed to load configuration")
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the level implied by the flags.
fn init_tracing(verbosity: Verbosity) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(verbosity.log_level())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = Context {
        config_path: cli.config.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };
    init_tracing(ctx.verbosity());

    commands::dispatch(cli.command, &ctx)
}
