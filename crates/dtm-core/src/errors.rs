//! Error types for the design-token bridge.

use thiserror::Error;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum DtmError {
    #[error(transparent)]
    Sanitize(#[from] SanitizeError),

    #[error(transparent)]
    Color(#[from] ColorError),

    #[error(transparent)]
    Dimension(#[from] DimensionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// A disallowed control character found in sanitized text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlChar {
    /// 1-based character position.
    pub pos: usize,
    pub code: u32,
}

/// Operator-facing context for a document that could not be parsed.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ParseDiagnostics {
    pub message: String,
    /// 1-based line of the error in the sanitized text.
    pub error_line: Option<usize>,
    pub error_column: Option<usize>,
    /// Numbered lines around the error (or the head of the text when the line is unknown).
    pub error_context: String,
    /// Character codes of the offending line.
    pub error_line_codes: Option<Vec<u32>>,
    /// At most 20 entries.
    pub control_chars: Vec<ControlChar>,
    pub sanitized_preview: String,
    /// First 50 sanitized lines, numbered.
    pub preview_lines: String,
}

/// Errors while recovering strict JSON from source text.
#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("base64 envelope could not be decoded: {reason}")]
    Base64 { reason: String },

    #[error("{}", .0.message)]
    Malformed(Box<ParseDiagnostics>),
}

impl SanitizeError {
    pub fn diagnostics(&self) -> Option<&ParseDiagnostics> {
        match self {
            SanitizeError::Malformed(diagnostics) => Some(diagnostics),
            SanitizeError::Base64 { .. } => None,
        }
    }
}

/// A color value that matches none of the accepted notations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColorError {
    #[error("Invalid color format: {value}")]
    InvalidColorFormat { value: String },
}

/// A dimension or number value that carries no usable number.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DimensionError {
    #[error("Invalid dimension format: {value}")]
    InvalidDimensionFormat { value: String },
}

/// Failure category reported by a variable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The session lacks write permission.
    ReadOnly,
    NotFound,
    Other,
}

/// An error reported by a variable store.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn read_only(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::ReadOnly,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::NotFound,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Other,
            message: message.into(),
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.kind == StoreErrorKind::ReadOnly
    }
}

/// Structural failures that abort an import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    MalformedInput(#[from] SanitizeError),

    #[error("Store is read-only; cannot {operation} variable {name}")]
    ReadOnlyStore { operation: String, name: String },

    #[error("Store operation '{operation}' failed for {name}: {source}")]
    StoreOperationFailed {
        operation: String,
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("Collection {name} has no modes")]
    NoModes { name: String },
}

impl ImportError {
    /// Classify a store failure by its kind.
    pub fn from_store(operation: &str, name: &str, source: StoreError) -> Self {
        if source.is_read_only() {
            ImportError::ReadOnlyStore {
                operation: operation.to_string(),
                name: name.to_string(),
            }
        } else {
            ImportError::StoreOperationFailed {
                operation: operation.to_string(),
                name: name.to_string(),
                source,
            }
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, ImportError::ReadOnlyStore { .. })
    }
}

/// Why a single token was skipped during traversal. The import continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("Unsupported token type: {0}")]
    UnsupportedTokenType(String),

    #[error(transparent)]
    Color(#[from] ColorError),

    #[error(transparent)]
    Dimension(#[from] DimensionError),
}

/// Errors during export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Collection not found: {id}")]
    CollectionNotFound { id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
