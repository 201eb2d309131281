//! Command implementations and dispatch logic.
//!
//! Each command is an async function taking a [`CommandContext`]. Conflict
//! and confirmation handling goes through the engine's policy interface:
//! `--yes` selects auto-approval, otherwise conflicts are printed and the
//! operation aborts, and removals prompt on stdin.

use std::io::Write;
use std::sync::Arc;

use tracing::info;

use sprout_core::error::{SproutError, SproutResult};
use sprout_core::types::Version;
use sprout_engine::{ConflictDecision, ConflictPolicy, EngineConfig, NoopHooks, OperationManager};
use sprout_resolver::DependencyConflict;

pub mod info;
pub mod install;
pub mod list;
pub mod uninstall;

use crate::output::OutputHandler;
use crate::Commands;

/// Shared context for all commands
pub struct CommandContext {
    pub config: EngineConfig,
    pub output: OutputHandler,
}

impl CommandContext {
    /// Load configuration and build the command context
    pub async fn new() -> SproutResult<Self> {
        let config = EngineConfig::load_or_default().await?;
        Ok(Self {
            config,
            output: OutputHandler::new(),
        })
    }

    /// Build an operation manager with the given policy
    pub fn manager(&self, policy: Arc<dyn ConflictPolicy>) -> SproutResult<OperationManager> {
        OperationManager::new(&self.config, policy, Arc::new(NoopHooks))
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> SproutResult<()> {
    match command {
        Commands::Install { package, yes } => {
            info!("Installing package: {}", package);
            install::execute(package, yes, ctx).await
        },
        Commands::Uninstall { package, yes } => {
            info!("Uninstalling package: {}", package);
            uninstall::execute(package, yes, ctx).await
        },
        Commands::List { installed } => list::execute(installed, ctx).await,
        Commands::Info { package } => info::execute(package, ctx).await,
    }
}

/// Interactive policy: prints conflicts and aborts, prompts for removals
pub struct PromptPolicy {
    output: OutputHandler,
}

impl PromptPolicy {
    pub fn new(output: OutputHandler) -> Self {
        Self { output }
    }
}

impl ConflictPolicy for PromptPolicy {
    fn resolve_conflicts(&self, conflicts: &[DependencyConflict]) -> ConflictDecision {
        self.output.warn("Dependency conflicts detected:");
        for conflict in conflicts {
            self.output.line(&format!("  {}", conflict));
        }
        self.output.info("Re-run with --yes to install anyway.");
        ConflictDecision::Abort
    }

    fn confirm_uninstall(&self, package: &str) -> bool {
        print!("Remove '{}'? [y/N] ", package);
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// Split a `name@version` argument into its parts
pub fn parse_package_spec(spec: &str) -> SproutResult<(String, Option<Version>)> {
    match spec.rsplit_once('@') {
        // A leading '@' is a scope marker, not a version separator.
        Some((name, version)) if !name.is_empty() => {
            let version = version.parse().map_err(|_| SproutError::VersionParse {
                input: version.to_string(),
            })?;
            Ok((name.to_string(), Some(version)))
        },
        _ => Ok((spec.to_string(), None)),
    }
}
