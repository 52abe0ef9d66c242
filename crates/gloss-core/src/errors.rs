//! Cross-cutting error types for the glossary.
//!
//! This module defines errors that can originate from the pure layer (payload
//! decoding and serialization). Storage errors (`DatabaseError`) are defined in
//! `gloss-db`, which converts from `CoreError`. The CLI folds everything into
//! `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any glossary crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Data failed validation (payload shape, unknown kind, bad JSON).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
