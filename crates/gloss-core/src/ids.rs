//! ID prefixes and deterministic entry IDs.
//!
//! Submission and audit IDs are `{prefix}-{8 hex chars}`, minted by the
//! database (`randomblob`). Entry IDs are deterministic:
//! `{type}-{unix millis}-{slugified name}`.

use crate::enums::EntryType;

pub const PREFIX_SUBMISSION: &str = "sub";
pub const PREFIX_AUDIT: &str = "aud";

/// Every prefix handed to `GlossDb::generate_id`.
pub const ALL_PREFIXES: &[&str] = &[PREFIX_SUBMISSION, PREFIX_AUDIT];

/// Slug used when a name has no ASCII alphanumerics at all.
const EMPTY_SLUG: &str = "untitled";

/// Lowercase ASCII slug: alphanumerics kept, every other run collapsed to `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug
    }
}

/// Build the deterministic ID for a new entry.
#[must_use]
pub fn entry_id(entry_type: EntryType, timestamp_millis: i64, name: &str) -> String {
    format!("{}-{timestamp_millis}-{}", entry_type.as_str(), slugify(name))
}
