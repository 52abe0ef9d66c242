use gloss_core::entities::Submission;
use gloss_core::enums::SubmissionStatus;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct SubmissionListResponse {
    submissions: Vec<Submission>,
}

pub async fn run(status: Option<&str>, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let status = status
        .map(|value| parse_enum::<SubmissionStatus>(value, "status"))
        .transpose()?;
    let submissions = ctx.service.list_submissions(status, flags.limit).await?;
    output(&SubmissionListResponse { submissions }, flags.format)
}
