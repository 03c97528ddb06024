//! Design-token documents to host variables and back.
//!
//! This crate ties the pipeline together for callers:
//! - [`messages`]: the JSON message protocol spoken with a user interface
//! - [`handler`]: dispatch of those messages against a [`VariableStore`]
//! - [`config`]: TOML configuration
//! - [`persist`]: JSON snapshots of the in-memory store used by the CLI

pub mod config;
pub mod handler;
pub mod messages;
pub mod persist;

pub use config::Config;
pub use handler::{Handled, Handler};
pub use messages::{FailureReason, ImportFailure, PluginMessage, UiMessage};

pub use dtm_core::{Color, DtmError, ImportError, TokenType, VariableType, VariableValue};
pub use dtm_export::{export_collections, ExportFile, ExportSelection};
pub use dtm_parser::{parse_color, parse_document, sanitize};
pub use dtm_resolver::{import_document, ImportBody, ImportOptions, ImportReport, ImportRequest};
pub use dtm_store::{MemoryStore, ThrottleConfig, VariableStore};
