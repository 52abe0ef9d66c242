use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::subcommands::{EntryCommands, RefsCommands, SubmissionCommands, TagCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Glossary entries.
    Entry {
        #[command(subcommand)]
        action: EntryCommands,
    },
    /// Tags.
    Tag {
        #[command(subcommand)]
        action: TagCommands,
    },
    /// User submissions and moderation.
    Submission {
        #[command(subcommand)]
        action: SubmissionCommands,
    },
    /// Bulk-import new-entry drafts from a JSONL file.
    Import(ImportArgs),
    /// Reference graph maintenance.
    Refs {
        #[command(subcommand)]
        action: RefsCommands,
    },
    /// Query the audit trail.
    Audit(AuditArgs),
}

#[derive(Clone, Debug, Args)]
pub struct ImportArgs {
    /// One entry draft per line.
    pub file: PathBuf,
    /// Approve each row after submitting it.
    #[arg(long)]
    pub approve: bool,
    /// Submitter name (defaults to `general.importer_name`).
    #[arg(long)]
    pub submitter: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    #[arg(long)]
    pub entity_type: Option<String>,
    #[arg(long)]
    pub entity_id: Option<String>,
    #[arg(long)]
    pub action: Option<String>,
}
