//! Info command implementation

use std::sync::Arc;

use sprout_core::error::SproutResult;
use sprout_engine::AutoApprove;

use super::CommandContext;

pub async fn execute(package: String, ctx: &CommandContext) -> SproutResult<()> {
    let manager = ctx.manager(Arc::new(AutoApprove))?;
    let info = manager.package_detail(&package).await?;

    ctx.output.line(&format!("{} ({})", info.display_name, info.name));
    if !info.description.is_empty() {
        ctx.output.line(&info.description);
    }
    if let Some(author) = &info.author {
        match &info.author_url {
            Some(url) => ctx.output.line(&format!("author: {} <{}>", author, url)),
            None => ctx.output.line(&format!("author: {}", author)),
        }
    }
    ctx.output.line(&format!("latest: {}", info.newest_version));
    match &info.local_version {
        Some(local) => ctx.output.line(&format!("installed: {}", local)),
        None => ctx.output.info("not installed"),
    }

    if !info.dependencies.is_empty() {
        ctx.output.line("dependencies:");
        for (dep, range) in &info.dependencies {
            ctx.output.line(&format!("  {} {}", dep, range));
        }
    }

    ctx.output.line("versions:");
    for version in info.versions.iter().rev() {
        let mut line = format!("  {}", version.version);
        if let Some(date) = &version.publish_date {
            line.push_str(&format!("  {}", date));
        }
        if version.is_installed {
            line.push_str("  (installed)");
        }
        ctx.output.line(&line);
    }
    Ok(())
}
