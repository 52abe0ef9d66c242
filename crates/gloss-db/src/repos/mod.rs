//! Repository modules implementing the glossary operations.
//!
//! Each module adds methods to `GlossService` via `impl GlossService` blocks.
//! Operations that must compose inside a larger transaction are exposed as
//! free functions over `&libsql::Connection`.

pub mod audit;
pub mod entry;
pub mod moderation;
pub mod reference;
pub mod submission;
pub mod tag;
