//! The variable store adapter contract.

use crate::records::{Collection, Variable};
use async_trait::async_trait;
use dtm_core::{CollectionId, ModeId, StoreError, VariableId, VariableType, VariableValue};

/// Host-side storage of collections and variables.
///
/// Every call is a suspension point. Callers issue calls for one import
/// strictly in sequence and never concurrently. Implementations report
/// failures with a [`StoreErrorKind`](dtm_core::StoreErrorKind) so that a
/// read-only session can be told apart from other failures.
#[async_trait]
pub trait VariableStore: Send + Sync {
    async fn list_collections(&self) -> Result<Vec<Collection>, StoreError>;

    async fn get_variable(&self, id: &VariableId) -> Result<Option<Variable>, StoreError>;

    /// Create a collection with a single default mode.
    async fn create_collection(&self, name: &str) -> Result<Collection, StoreError>;

    async fn create_variable(
        &self,
        name: &str,
        collection: &CollectionId,
        variable_type: VariableType,
    ) -> Result<Variable, StoreError>;

    /// Set the value of one mode. Other modes are untouched.
    async fn set_value_for_mode(
        &self,
        id: &VariableId,
        mode: &ModeId,
        value: VariableValue,
    ) -> Result<(), StoreError>;

    /// Attach a description. Stores without descriptions keep this no-op.
    async fn set_description(&self, _id: &VariableId, _description: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get_collection(&self, id: &CollectionId) -> Result<Option<Collection>, StoreError> {
        Ok(self
            .list_collections()
            .await?
            .into_iter()
            .find(|c| &c.id == id))
    }
}
