//! # sprout-cli
//!
//! Command-line interface for the sprout package engine. Handles command
//! parsing, sets up logging and error handling, and dispatches to the
//! command handlers.

use clap::{Parser, Subcommand};
use tracing::error;

use sprout_core::error::SproutResult;

mod commands;
mod output;

use commands::CommandContext;

/// Package manager for sprout registries
#[derive(Parser)]
#[command(name = "sprout", version, about = "Package manager for sprout registries")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a package and its dependencies
    Install {
        /// Package to install, optionally pinned as name@version
        package: String,
        /// Proceed through conflicts without prompting
        #[arg(short, long)]
        yes: bool,
    },
    /// Remove an installed package
    Uninstall {
        package: String,
        /// Skip the removal confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// List catalog packages
    List {
        /// Only show installed packages
        #[arg(long)]
        installed: bool,
    },
    /// Show detailed package information
    Info { package: String },
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    if let Err(e) = run_cli(cli) {
        let output = output::OutputHandler::new();
        output.error(&e.to_string());
        if let Some(suggestion) = e.suggestion() {
            output.info(suggestion);
        }
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> SproutResult<()> {
    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        sprout_core::error::SproutError::Io {
            message: "Failed to create async runtime".to_string(),
            source: e,
        }
    })?;

    rt.block_on(async {
        let ctx = CommandContext::new().await?;
        commands::dispatch_command(cli.command, &ctx).await
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "sprout={},sprout_core={},sprout_registry={},sprout_resolver={},sprout_engine={}",
            level, level, level, level, level
        ))
        .with_target(false)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("sprout encountered an unexpected error: {}", panic_info);
        eprintln!("sprout crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/sprout-pm/sprout/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
