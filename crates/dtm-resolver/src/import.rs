//! The import pipeline: request to report.

use crate::aliases::resolve_aliases;
use crate::context::{ImportContext, VariableCache};
use crate::traverse::traverse;
use dtm_core::{
    Alias, CollectionId, ImportError, ModeId, SkipReason, EXTENSIONS_KEY, EXTENSION_NAMESPACE,
};
use dtm_parser::parse_document;
use dtm_store::{Throttle, ThrottleConfig, VariableStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use tracing::{info, warn};

/// The body of an import: raw text, or a document already parsed by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImportBody {
    Text(String),
    Document(Value),
}

/// A request to import one token document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub file_name: String,
    pub body: ImportBody,
    #[serde(rename = "parsedInUI", default)]
    pub parsed_in_ui: bool,
    #[serde(default)]
    pub base64_encoded: bool,
}

impl ImportRequest {
    /// Request for raw document text.
    pub fn text(file_name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            body: ImportBody::Text(body.into()),
            parsed_in_ui: false,
            base64_encoded: false,
        }
    }

    /// Request for an already parsed document.
    pub fn document(file_name: impl Into<String>, document: Value) -> Self {
        Self {
            file_name: file_name.into(),
            body: ImportBody::Document(document),
            parsed_in_ui: true,
            base64_encoded: false,
        }
    }

    pub fn base64(mut self, encoded: bool) -> Self {
        self.base64_encoded = encoded;
        self
    }
}

/// Knobs for an import call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub throttle: ThrottleConfig,
}

/// A token that was logged and skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedToken {
    pub name: String,
    /// The raw `$value`, as JSON.
    pub value: String,
    pub reason: SkipReason,
}

/// Outcome of a completed import.
///
/// Unresolved aliases and skipped tokens do not fail an import; they are
/// reported here for the caller to surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub collection_name: String,
    pub collection_id: CollectionId,
    pub mode_id: ModeId,
    /// Whether the collection existed before this import.
    pub existing: bool,
    pub operation_count: usize,
    pub created: usize,
    pub updated: usize,
    pub unresolved: Vec<Alias>,
    pub skipped: Vec<SkippedToken>,
}

impl ImportReport {
    /// `Created` or `Updated`, for notifications.
    pub fn action(&self) -> &'static str {
        if self.existing {
            "Updated"
        } else {
            "Created"
        }
    }
}

/// Naming hint from `$extensions["com.designtokensmanager"]`.
fn extension_hint<'a>(document: &'a Value, key: &str) -> Option<&'a str> {
    document
        .get(EXTENSIONS_KEY)?
        .get(EXTENSION_NAMESPACE)?
        .get(key)?
        .as_str()
        .filter(|s| !s.is_empty())
}

/// Collection targeted by a document: its `collection` hint, or the file name
/// without a trailing `.json`.
pub fn collection_name(file_name: &str, document: &Value) -> String {
    extension_hint(document, "collection")
        .map(str::to_string)
        .unwrap_or_else(|| {
            file_name
                .strip_suffix(".json")
                .unwrap_or(file_name)
                .to_string()
        })
}

/// Mode name hint of a document, if any.
pub fn mode_name(document: &Value) -> Option<&str> {
    extension_hint(document, "mode")
}

/// Import one document into the store.
///
/// The document is parsed (unless already parsed), the target collection is
/// found by name or created, and every token is written into one mode of it.
/// Parse failures abort before any write. Store failures abort the remaining
/// writes; writes already acknowledged stay in place.
pub async fn import_document(
    store: &dyn VariableStore,
    request: &ImportRequest,
    options: &ImportOptions,
) -> Result<ImportReport, ImportError> {
    let document: Cow<'_, Value> = match &request.body {
        ImportBody::Document(document) => Cow::Borrowed(document),
        ImportBody::Text(text) => Cow::Owned(parse_document(text, request.base64_encoded)?),
    };

    let name = collection_name(&request.file_name, &document);
    let mut throttle = Throttle::new(options.throttle);

    let collections = store
        .list_collections()
        .await
        .map_err(|e| ImportError::from_store("list collections for", &name, e))?;

    let (collection, cache, existing) = match collections.into_iter().find(|c| c.name == name) {
        Some(collection) => {
            info!(collection = %name, "Found existing collection");
            let cache = VariableCache::build(store, &collection, &mut throttle).await?;
            (collection, cache, true)
        }
        None => {
            info!(collection = %name, "Creating new collection");
            let collection = store
                .create_collection(&name)
                .await
                .map_err(|e| ImportError::from_store("create collection", &name, e))?;
            (collection, VariableCache::default(), false)
        }
    };

    let mode = mode_name(&document)
        .and_then(|m| collection.mode_named(m))
        .or_else(|| collection.default_mode())
        .ok_or_else(|| ImportError::NoModes { name: name.clone() })?;
    let mode_id = mode.mode_id.clone();

    let mut ctx = ImportContext::new(store, collection.id.clone(), mode_id.clone(), cache, throttle);
    let pending = traverse(&mut ctx, &document).await?;
    let unresolved = resolve_aliases(&mut ctx, pending).await?;

    if !unresolved.is_empty() {
        warn!(
            collection = %name,
            count = unresolved.len(),
            "Unresolved aliases remain after import"
        );
    }
    info!(
        collection = %name,
        operations = ctx.operation_count(),
        created = ctx.created,
        updated = ctx.updated,
        "Import complete"
    );

    Ok(ImportReport {
        collection_name: name,
        collection_id: collection.id,
        mode_id,
        existing,
        operation_count: ctx.operation_count(),
        created: ctx.created,
        updated: ctx.updated,
        unresolved,
        skipped: ctx.skipped,
    })
}
