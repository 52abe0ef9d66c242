use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

pub async fn approve(
    id: &str,
    note: Option<&str>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let response = ctx.service.approve_submission(id, note).await?;
    output(&response, flags.format)
}

pub async fn reject(
    id: &str,
    reason: Option<&str>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let submission = ctx.service.reject_submission(id, reason).await?;
    output(&submission, flags.format)
}
