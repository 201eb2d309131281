//! List command implementation

use std::sync::Arc;

use sprout_core::error::SproutResult;
use sprout_engine::AutoApprove;

use super::CommandContext;

pub async fn execute(installed_only: bool, ctx: &CommandContext) -> SproutResult<()> {
    let manager = ctx.manager(Arc::new(AutoApprove))?;
    manager.refresh_catalog().await?;

    let mut packages = if installed_only {
        manager.catalog().installed()
    } else {
        manager.catalog().all()
    };
    packages.sort_by(|a, b| a.name.cmp(&b.name));

    if packages.is_empty() {
        ctx.output.info("No packages found.");
        return Ok(());
    }

    for package in packages {
        let mut line = format!("{} {}", package.name, package.newest_version);
        if let Some(local) = &package.local_version {
            if package.has_update() {
                line.push_str(&format!(" (installed {}, update available)", local));
            } else {
                line.push_str(" (installed)");
            }
        }
        ctx.output.line(&line);
    }
    Ok(())
}
