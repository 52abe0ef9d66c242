mod entry;
mod refs;
mod submission;
mod tag;

pub use entry::{EntryChangeArgs, EntryCommands, EntryCreateArgs, EntryFieldArgs};
pub use refs::RefsCommands;
pub use submission::{SubmissionCommands, SubmitterArgs};
pub use tag::TagCommands;
