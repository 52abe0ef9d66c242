//! Entity structs for all glossary domain objects.
//!
//! Each entity maps to a table in the libSQL database (see
//! `gloss-db/migrations/001_initial.sql`). All structs derive `Serialize`,
//! `Deserialize`, and `JsonSchema` for JSON roundtrip and schema validation.

mod audit;
mod entry;
mod submission;
mod tag;

pub use audit::AuditEntry;
pub use entry::{Entry, EntryDetail, EntryReference, ReferenceDrift, ReferenceProjection};
pub use submission::{Submission, Submitter};
pub use tag::{Tag, TagUsage};
