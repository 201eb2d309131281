//! Uninstall command implementation

use std::sync::Arc;

use sprout_core::error::SproutResult;
use sprout_engine::AutoApprove;

use super::{CommandContext, PromptPolicy};

pub async fn execute(package: String, yes: bool, ctx: &CommandContext) -> SproutResult<()> {
    let manager = if yes {
        ctx.manager(Arc::new(AutoApprove))?
    } else {
        ctx.manager(Arc::new(PromptPolicy::new(ctx.output.clone())))?
    };

    manager.refresh_catalog().await?;
    manager.uninstall_package(&package).await?;

    ctx.output.success(&format!("removed {}", package));
    Ok(())
}
