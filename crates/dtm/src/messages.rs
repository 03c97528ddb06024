//! Messages exchanged with the user interface.
//!
//! Both directions are JSON objects tagged by `type`.

use dtm_core::{ControlChar, ImportError, SanitizeError};
use dtm_export::{ExportFile, ExportSelection};
use dtm_resolver::{ImportReport, ImportRequest};
use dtm_store::{Collection, Mode};
use serde::{Deserialize, Serialize};

/// A request from the user interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiMessage {
    Import(ImportRequest),
    GetCollections,
    Export {
        /// Absent or empty exports everything.
        #[serde(default)]
        selections: Option<Vec<ExportSelection>>,
    },
}

/// A reply to the user interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PluginMessage {
    #[serde(rename_all = "camelCase")]
    ImportDone {
        /// Name of the collection written.
        file_name: String,
        operation_count: usize,
        #[serde(rename = "parsedInUI")]
        parsed_in_ui: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        unresolved_aliases: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        skipped_tokens: Vec<String>,
    },
    ImportFailed(ImportFailure),
    CollectionsList {
        collections: Vec<CollectionSummary>,
    },
    ExportResult {
        files: Vec<ExportFile>,
    },
}

impl PluginMessage {
    pub fn import_done(request: &ImportRequest, report: &ImportReport) -> Self {
        PluginMessage::ImportDone {
            file_name: report.collection_name.clone(),
            operation_count: report.operation_count,
            parsed_in_ui: request.parsed_in_ui,
            unresolved_aliases: report.unresolved.iter().map(|a| a.name.clone()).collect(),
            skipped_tokens: report.skipped.iter().map(|s| s.name.clone()).collect(),
        }
    }
}

/// Machine-readable cause of a failed import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    MalformedInput,
    ReadOnlyStore,
    StoreOperationFailed,
    NoModes,
}

/// Payload of `IMPORT_FAILED`.
///
/// Parse failures carry the diagnostic fields; other failures only the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFailure {
    pub file_name: String,
    pub reason: FailureReason,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sanitized_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_lines: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_column: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_line_codes: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_chars: Option<Vec<ControlChar>>,
    #[serde(rename = "parsedInUI")]
    pub parsed_in_ui: bool,
    pub base64_encoded: bool,
}

impl ImportFailure {
    pub fn new(request: &ImportRequest, error: &ImportError) -> Self {
        let reason = match error {
            ImportError::MalformedInput(_) => FailureReason::MalformedInput,
            ImportError::ReadOnlyStore { .. } => FailureReason::ReadOnlyStore,
            ImportError::StoreOperationFailed { .. } => FailureReason::StoreOperationFailed,
            ImportError::NoModes { .. } => FailureReason::NoModes,
        };
        let mut failure = Self {
            file_name: request.file_name.clone(),
            reason,
            message: error.to_string(),
            sanitized_preview: None,
            preview_lines: None,
            error_line: None,
            error_column: None,
            error_context: None,
            error_line_codes: None,
            control_chars: None,
            parsed_in_ui: request.parsed_in_ui,
            base64_encoded: request.base64_encoded,
        };

        if let ImportError::MalformedInput(SanitizeError::Malformed(diagnostics)) = error {
            failure.sanitized_preview = Some(diagnostics.sanitized_preview.clone());
            failure.preview_lines = Some(diagnostics.preview_lines.clone());
            failure.error_line = diagnostics.error_line;
            failure.error_column = diagnostics.error_column;
            failure.error_context = Some(diagnostics.error_context.clone());
            failure.error_line_codes = diagnostics.error_line_codes.clone();
            failure.control_chars = Some(diagnostics.control_chars.clone());
        }
        failure
    }
}

/// A collection as listed for export selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub id: String,
    pub name: String,
    pub modes: Vec<Mode>,
}

impl From<&Collection> for CollectionSummary {
    fn from(collection: &Collection) -> Self {
        Self {
            id: collection.id.to_string(),
            name: collection.name.clone(),
            modes: collection.modes.clone(),
        }
    }
}
