//! # gloss-core
//!
//! Core types, ID generation, and error types for the glossary service.
//!
//! This crate provides the foundational types shared across all glossary crates:
//! - Entity structs for entries, tags, references, submissions, and audit entries
//! - Status enums with state machine transitions
//! - ID prefix constants, slugs, and deterministic entry IDs
//! - The `@mention` tokenizer (pure, no I/O)
//! - Submission payloads decoded into a tagged union at the intake boundary
//! - Cross-cutting error types
//! - CLI response types
//! - Audit detail sub-types

pub mod audit_detail;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod mentions;
pub mod payload;
pub mod responses;
