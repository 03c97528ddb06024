//! Parsing for design-token documents.
//!
//! This crate turns near-JSON token files into strict JSON and decodes the
//! leaf values the traversal materializes:
//! - [`sanitize`]: comment/trailing-comma removal, base64 envelopes, diagnostics
//! - [`color`]: six color notations to normalized RGBA, and the canonical export form
//! - [`dimension`]: numbers and unit-suffixed dimensions, and their export form
//!
//! Built on `nom` for the value notations.

mod lexer;
pub mod color;
pub mod dimension;
pub mod sanitize;

pub use color::{export_color, parse_color, parse_color_str, ColorExport};
pub use dimension::{
    export_numeric, is_dimension_path, json_number, numeric_export_type, parse_dimension,
    parse_number,
};
pub use sanitize::{content_hash, decode_base64, parse_document, sanitize};
