//! Dispatch of user-interface messages.

use crate::messages::{CollectionSummary, ImportFailure, PluginMessage, UiMessage};
use dtm_core::DtmError;
use dtm_export::export_collections;
use dtm_resolver::{import_document, ImportOptions, ImportRequest};
use dtm_store::VariableStore;
use tracing::{error, info};

/// A reply plus the short notification to show the user, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Handled {
    pub reply: PluginMessage,
    pub notification: Option<String>,
}

/// Answers [`UiMessage`]s against one store.
pub struct Handler<'a> {
    store: &'a dyn VariableStore,
    options: ImportOptions,
}

impl<'a> Handler<'a> {
    pub fn new(store: &'a dyn VariableStore, options: ImportOptions) -> Self {
        Self { store, options }
    }

    /// Handle one message.
    ///
    /// Import failures are replies (`IMPORT_FAILED`), not errors. Errors are
    /// store failures while listing or exporting.
    pub async fn handle(&self, message: UiMessage) -> Result<Handled, DtmError> {
        match message {
            UiMessage::Import(request) => Ok(self.import(&request).await),
            UiMessage::GetCollections => {
                let collections = self.store.list_collections().await?;
                Ok(Handled {
                    reply: PluginMessage::CollectionsList {
                        collections: collections.iter().map(CollectionSummary::from).collect(),
                    },
                    notification: None,
                })
            }
            UiMessage::Export { selections } => {
                let files =
                    export_collections(self.store, selections.as_deref().unwrap_or_default())
                        .await?;
                Ok(Handled {
                    reply: PluginMessage::ExportResult { files },
                    notification: None,
                })
            }
        }
    }

    async fn import(&self, request: &ImportRequest) -> Handled {
        match import_document(self.store, request, &self.options).await {
            Ok(report) => {
                info!(
                    collection = %report.collection_name,
                    operations = report.operation_count,
                    "Import done"
                );
                Handled {
                    notification: Some(format!(
                        "{} collection: {}",
                        report.action(),
                        report.collection_name
                    )),
                    reply: PluginMessage::import_done(request, &report),
                }
            }
            Err(err) => {
                error!(file = %request.file_name, error = %err, "Import failed");
                let notification = if err.is_read_only() {
                    "Import failed: the store is read-only; cannot create or update variables."
                        .to_string()
                } else {
                    format!("Import failed for {}: {}", request.file_name, err)
                };
                Handled {
                    reply: PluginMessage::ImportFailed(ImportFailure::new(request, &err)),
                    notification: Some(notification),
                }
            }
        }
    }
}
