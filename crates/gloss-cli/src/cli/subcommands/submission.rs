use clap::{Args, Subcommand};

use super::entry::{EntryChangeArgs, EntryCreateArgs};

/// Who is submitting.
#[derive(Clone, Debug, Args)]
pub struct SubmitterArgs {
    #[arg(long)]
    pub submitter: String,
    #[arg(long)]
    pub email: Option<String>,
}

/// Submission intake and moderation commands.
#[derive(Clone, Debug, Subcommand)]
pub enum SubmissionCommands {
    /// Propose a new entry.
    New {
        #[command(flatten)]
        entry: EntryCreateArgs,
        #[command(flatten)]
        submitter: SubmitterArgs,
    },
    /// Propose changes to an existing entry.
    Edit {
        entry_id: String,
        #[command(flatten)]
        changes: EntryChangeArgs,
        #[command(flatten)]
        submitter: SubmitterArgs,
    },
    /// List submissions, oldest first.
    List {
        /// pending, approved or rejected
        #[arg(long)]
        status: Option<String>,
    },
    /// Get a submission by ID.
    Get { id: String },
    /// Approve a pending submission and apply it.
    Approve {
        id: String,
        #[arg(long)]
        note: Option<String>,
    },
    /// Reject a pending submission.
    Reject {
        id: String,
        #[arg(long)]
        reason: Option<String>,
    },
}
