//! Import pipeline for design-token documents.
//!
//! This crate turns a token document into variables of one collection mode:
//! - Traversal of the nested document into `/`-joined token names
//! - Deferred references (aliases) resolved in bounded generations
//! - A per-import variable cache so re-imports update instead of duplicating

mod aliases;
mod context;
mod import;
mod traverse;

pub use aliases::resolve_aliases;
pub use context::{ImportContext, VariableCache};
pub use import::{
    collection_name, import_document, mode_name, ImportBody, ImportOptions, ImportReport,
    ImportRequest, SkippedToken,
};
pub use traverse::traverse;
