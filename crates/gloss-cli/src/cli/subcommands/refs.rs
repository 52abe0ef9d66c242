use clap::Subcommand;

/// Reference graph commands.
#[derive(Clone, Debug, Subcommand)]
pub enum RefsCommands {
    /// Compare mention caches with the edge table.
    Check {
        /// Check one entry instead of all.
        #[arg(long)]
        entry: Option<String>,
        /// Rewrite drifting caches from the edges.
        #[arg(long)]
        repair: bool,
    },
    /// Show outgoing and incoming edges of an entry.
    Show { id: String },
    /// Rescan an entry's description and rewrite its references.
    Resync { id: String },
}
