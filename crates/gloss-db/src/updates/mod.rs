//! Update builder types for entry mutations.
//!
//! Builders produce the partial change-sets carried by edit submissions. Only
//! `Some` fields are applied when the submission is approved.

pub mod entry;
