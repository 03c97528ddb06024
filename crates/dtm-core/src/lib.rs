//! Core types, token naming, and errors for the design-token variable bridge.
//!
//! This crate provides the foundational types used across all other dtm crates:
//! - Value types (colors, token and variable types, variable values, ids)
//! - Token naming and reference helpers, the per-import working set
//! - Error types

pub mod errors;
pub mod tokens;
pub mod types;

pub use errors::*;
pub use tokens::*;
pub use types::*;
