//! Pure domain logic for the Mascotly character-generation pipeline.
//!
//! This crate has no I/O: database access lives in `mascotly-db`,
//! provider calls in `mascotly-providers`, and orchestration in
//! `mascotly-pipeline`. Everything here is deterministic and unit-testable.

pub mod anatomy;
pub mod error;
pub mod failure;
pub mod generation;
pub mod limits;
pub mod prompt;
pub mod retry;
pub mod tier;
pub mod types;
