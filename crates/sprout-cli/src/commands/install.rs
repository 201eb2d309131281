//! Install command implementation

use std::sync::Arc;

use sprout_core::error::SproutResult;
use sprout_engine::AutoApprove;

use super::{parse_package_spec, CommandContext, PromptPolicy};

pub async fn execute(package: String, yes: bool, ctx: &CommandContext) -> SproutResult<()> {
    let (name, version) = parse_package_spec(&package)?;

    let manager = if yes {
        ctx.manager(Arc::new(AutoApprove))?
    } else {
        ctx.manager(Arc::new(PromptPolicy::new(ctx.output.clone())))?
    };

    ctx.output.info("Refreshing catalog...");
    manager.refresh_catalog().await?;

    let report = manager.install_package(&name, version).await?;

    for (installed, installed_version) in &report.installed {
        ctx.output
            .success(&format!("{}@{}", installed, installed_version));
    }
    for skipped in &report.skipped {
        ctx.output.info(&format!("{} already satisfied", skipped));
    }
    for failed in &report.failed_dependencies {
        ctx.output
            .warn(&format!("dependency '{}' failed and was skipped", failed));
    }

    if report.is_noop() {
        ctx.output.info("Nothing to do.");
    }
    Ok(())
}
