//! Export of store variables to design-token documents.
//!
//! Each selected collection mode becomes one file named
//! `<collection>.<mode>.tokens.json`:
//! - Variable names are split on `/` into nested groups
//! - Colors, numbers and dimensions are written in their canonical form
//! - Aliases become `{dotted.name}` references

mod document;
mod slug;

pub use document::{export_mode, EXPORT_KEY};
pub use slug::{export_file_name, slug};

use chrono::{DateTime, Utc};
use dtm_core::{CollectionId, ExportError, ModeId};
use dtm_store::{Collection, VariableStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// One collection to export, optionally limited to some of its modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSelection {
    #[serde(alias = "id")]
    pub collection_id: CollectionId,
    /// Empty means every mode.
    #[serde(default)]
    pub mode_ids: Vec<ModeId>,
}

/// An exported document and the file name it should be written under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub file_name: String,
    pub body: Value,
}

/// Export the selected collection modes. No selections exports every mode of
/// every collection.
pub async fn export_collections(
    store: &dyn VariableStore,
    selections: &[ExportSelection],
) -> Result<Vec<ExportFile>, ExportError> {
    export_collections_at(store, selections, Utc::now()).await
}

/// [`export_collections`] with an explicit export timestamp.
pub async fn export_collections_at(
    store: &dyn VariableStore,
    selections: &[ExportSelection],
    now: DateTime<Utc>,
) -> Result<Vec<ExportFile>, ExportError> {
    let collections = store.list_collections().await?;
    let mut files = Vec::new();

    if selections.is_empty() {
        for collection in &collections {
            files.extend(export_collection(store, collection, &[], now).await?);
        }
    } else {
        for selection in selections {
            let collection = collections
                .iter()
                .find(|c| c.id == selection.collection_id)
                .ok_or_else(|| ExportError::CollectionNotFound {
                    id: selection.collection_id.to_string(),
                })?;
            files.extend(export_collection(store, collection, &selection.mode_ids, now).await?);
        }
    }

    info!(files = files.len(), "Export complete");
    Ok(files)
}

async fn export_collection(
    store: &dyn VariableStore,
    collection: &Collection,
    mode_ids: &[ModeId],
    now: DateTime<Utc>,
) -> Result<Vec<ExportFile>, ExportError> {
    let mut files = Vec::new();
    for mode in &collection.modes {
        if !mode_ids.is_empty() && !mode_ids.contains(&mode.mode_id) {
            continue;
        }
        files.push(ExportFile {
            file_name: export_file_name(&collection.name, &mode.name),
            body: export_mode(store, collection, mode, now).await?,
        });
    }
    Ok(files)
}
