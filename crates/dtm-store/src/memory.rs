//! In-memory variable store.

use crate::records::{Collection, Mode, Variable};
use crate::traits::VariableStore;
use async_trait::async_trait;
use dtm_core::{CollectionId, ModeId, StoreError, VariableId, VariableType, VariableValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Name given to the single mode of a new collection.
const DEFAULT_MODE_NAME: &str = "Mode 1";

/// Serializable contents of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    #[serde(default)]
    pub collections: Vec<Collection>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub next_id: u64,
}

/// Mutation counters, for inspecting what an operation did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub collections_created: usize,
    pub variables_created: usize,
    pub values_set: usize,
    pub descriptions_set: usize,
}

#[derive(Debug, Default)]
struct State {
    collections: IndexMap<CollectionId, Collection>,
    variables: IndexMap<VariableId, Variable>,
    next_id: u64,
    stats: StoreStats,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn collection_mut(&mut self, id: &CollectionId) -> Result<&mut Collection, StoreError> {
        self.collections
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(format!("collection {id} not found")))
    }
}

/// A [`VariableStore`] held in process memory.
///
/// Enforces the host's rules:
/// - variable names are unique within a collection
/// - a value must match the variable's resolved type, or be an alias to an existing variable
/// - every mutation fails with a read-only error while read-only mode is on
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    read_only: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from a snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let state = State {
            collections: snapshot
                .collections
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect(),
            variables: snapshot
                .variables
                .into_iter()
                .map(|v| (v.id.clone(), v))
                .collect(),
            next_id: snapshot.next_id,
            stats: StoreStats::default(),
        };
        Self {
            state: RwLock::new(state),
            read_only: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let state = self.read()?;
        Ok(StoreSnapshot {
            collections: state.collections.values().cloned().collect(),
            variables: state.variables.values().cloned().collect(),
            next_id: state.next_id,
        })
    }

    /// Reject every mutation, as a session without edit rights would.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        Ok(self.read()?.stats)
    }

    pub fn reset_stats(&self) -> Result<(), StoreError> {
        self.write()?.stats = StoreStats::default();
        Ok(())
    }

    /// Add a mode to an existing collection.
    pub fn add_mode(&self, collection: &CollectionId, name: &str) -> Result<ModeId, StoreError> {
        self.check_writable("add mode")?;
        let mut state = self.write()?;
        let mode_id = ModeId::from(format!("1:{}", state.next_id()));
        state.collection_mut(collection)?.modes.push(Mode {
            mode_id: mode_id.clone(),
            name: name.to_string(),
        });
        Ok(mode_id)
    }

    /// Look up a variable of a collection by name.
    pub fn find_variable(
        &self,
        collection: &CollectionId,
        name: &str,
    ) -> Result<Option<Variable>, StoreError> {
        let state = self.read()?;
        Ok(state
            .variables
            .values()
            .find(|v| &v.collection_id == collection && v.name == name)
            .cloned())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|e| StoreError::other(format!("Lock: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|e| StoreError::other(format!("Lock: {e}")))
    }

    fn check_writable(&self, operation: &str) -> Result<(), StoreError> {
        if self.read_only.load(Ordering::SeqCst) {
            Err(StoreError::read_only(format!(
                "cannot {operation} in read-only mode"
            )))
        } else {
            Ok(())
        }
    }
}

fn value_matches(value: &VariableValue, variable_type: VariableType) -> bool {
    matches!(
        (value, variable_type),
        (VariableValue::Color(_), VariableType::Color)
            | (VariableValue::Float(_), VariableType::Float)
            | (VariableValue::String(_), VariableType::String)
            | (VariableValue::Boolean(_), VariableType::Boolean)
    )
}

#[async_trait]
impl VariableStore for MemoryStore {
    async fn list_collections(&self) -> Result<Vec<Collection>, StoreError> {
        Ok(self.read()?.collections.values().cloned().collect())
    }

    async fn get_variable(&self, id: &VariableId) -> Result<Option<Variable>, StoreError> {
        Ok(self.read()?.variables.get(id).cloned())
    }

    async fn create_collection(&self, name: &str) -> Result<Collection, StoreError> {
        self.check_writable("create collection")?;
        let mut state = self.write()?;
        let id = CollectionId::from(format!("VariableCollectionId:1:{}", state.next_id()));
        let mode_id = ModeId::from(format!("1:{}", state.next_id()));
        let collection = Collection {
            id: id.clone(),
            name: name.to_string(),
            modes: vec![Mode {
                mode_id,
                name: DEFAULT_MODE_NAME.to_string(),
            }],
            variable_ids: Vec::new(),
        };
        state.collections.insert(id, collection.clone());
        state.stats.collections_created += 1;
        debug!(collection = name, id = %collection.id, "Created collection");
        Ok(collection)
    }

    async fn create_variable(
        &self,
        name: &str,
        collection: &CollectionId,
        variable_type: VariableType,
    ) -> Result<Variable, StoreError> {
        self.check_writable("create variable")?;
        let mut state = self.write()?;
        let duplicate = state
            .variables
            .values()
            .any(|v| &v.collection_id == collection && v.name == name);
        if duplicate {
            return Err(StoreError::other(format!(
                "variable {name} already exists in collection {collection}"
            )));
        }

        let id = VariableId::from(format!("VariableID:1:{}", state.next_id()));
        state.collection_mut(collection)?.variable_ids.push(id.clone());
        let variable = Variable {
            id: id.clone(),
            name: name.to_string(),
            collection_id: collection.clone(),
            resolved_type: variable_type,
            description: String::new(),
            values_by_mode: IndexMap::new(),
        };
        state.variables.insert(id, variable.clone());
        state.stats.variables_created += 1;
        Ok(variable)
    }

    async fn set_value_for_mode(
        &self,
        id: &VariableId,
        mode: &ModeId,
        value: VariableValue,
    ) -> Result<(), StoreError> {
        self.check_writable("set value")?;
        let mut state = self.write()?;

        let (collection_id, resolved_type) = match state.variables.get(id) {
            Some(v) => (v.collection_id.clone(), v.resolved_type),
            None => return Err(StoreError::not_found(format!("variable {id} not found"))),
        };
        if state.collection_mut(&collection_id)?.mode(mode).is_none() {
            return Err(StoreError::not_found(format!(
                "mode {mode} not found in collection {collection_id}"
            )));
        }
        match &value {
            VariableValue::Alias(target) if !state.variables.contains_key(target) => {
                return Err(StoreError::not_found(format!(
                    "alias target {target} not found"
                )));
            }
            VariableValue::Alias(_) => {}
            other if !value_matches(other, resolved_type) => {
                return Err(StoreError::other(format!(
                    "value does not match variable type {resolved_type}"
                )));
            }
            _ => {}
        }

        if let Some(variable) = state.variables.get_mut(id) {
            variable.values_by_mode.insert(mode.clone(), value);
        }
        state.stats.values_set += 1;
        Ok(())
    }

    async fn set_description(&self, id: &VariableId, description: &str) -> Result<(), StoreError> {
        self.check_writable("set description")?;
        let mut state = self.write()?;
        let variable = state
            .variables
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(format!("variable {id} not found")))?;
        variable.description = description.to_string();
        state.stats.descriptions_set += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtm_core::{Color, StoreErrorKind};

    #[tokio::test]
    async fn test_new_collection_has_one_mode() {
        let store = MemoryStore::new();
        let collection = store.create_collection("Brand").await.unwrap();
        assert_eq!(collection.modes.len(), 1);
        assert_eq!(collection.modes[0].name, DEFAULT_MODE_NAME);
        assert_eq!(store.list_collections().await.unwrap(), vec![collection]);
    }

    #[tokio::test]
    async fn test_create_and_set_value() {
        let store = MemoryStore::new();
        let collection = store.create_collection("Brand").await.unwrap();
        let mode = collection.modes[0].mode_id.clone();

        let var = store
            .create_variable("color/brand", &collection.id, VariableType::Color)
            .await
            .unwrap();
        store
            .set_value_for_mode(&var.id, &mode, VariableValue::Color(Color::WHITE))
            .await
            .unwrap();
        store.set_description(&var.id, "Brand").await.unwrap();

        let stored = store.get_variable(&var.id).await.unwrap().unwrap();
        assert_eq!(stored.value_for_mode(&mode), Some(&VariableValue::Color(Color::WHITE)));
        assert_eq!(stored.description, "Brand");

        let collection = store.get_collection(&collection.id).await.unwrap().unwrap();
        assert_eq!(collection.variable_ids, vec![var.id]);
    }

    #[tokio::test]
    async fn test_duplicate_names_are_rejected() {
        let store = MemoryStore::new();
        let collection = store.create_collection("Brand").await.unwrap();
        store
            .create_variable("size", &collection.id, VariableType::Float)
            .await
            .unwrap();
        let err = store
            .create_variable("size", &collection.id, VariableType::Float)
            .await
            .unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::Other);
    }

    #[tokio::test]
    async fn test_value_type_is_checked() {
        let store = MemoryStore::new();
        let collection = store.create_collection("Brand").await.unwrap();
        let mode = collection.modes[0].mode_id.clone();
        let var = store
            .create_variable("size", &collection.id, VariableType::Float)
            .await
            .unwrap();

        let err = store
            .set_value_for_mode(&var.id, &mode, VariableValue::Color(Color::BLACK))
            .await
            .unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::Other);

        let err = store
            .set_value_for_mode(&var.id, &mode, VariableValue::Alias(VariableId::from("nope")))
            .await
            .unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_other_modes_are_untouched() {
        let store = MemoryStore::new();
        let collection = store.create_collection("Theme").await.unwrap();
        let light = collection.modes[0].mode_id.clone();
        let dark = store.add_mode(&collection.id, "Dark").unwrap();
        let var = store
            .create_variable("size", &collection.id, VariableType::Float)
            .await
            .unwrap();

        store
            .set_value_for_mode(&var.id, &light, VariableValue::Float(1.0))
            .await
            .unwrap();
        store
            .set_value_for_mode(&var.id, &dark, VariableValue::Float(2.0))
            .await
            .unwrap();
        store
            .set_value_for_mode(&var.id, &light, VariableValue::Float(3.0))
            .await
            .unwrap();

        let stored = store.get_variable(&var.id).await.unwrap().unwrap();
        assert_eq!(stored.value_for_mode(&dark), Some(&VariableValue::Float(2.0)));
        assert_eq!(stored.value_for_mode(&light), Some(&VariableValue::Float(3.0)));
    }

    #[tokio::test]
    async fn test_read_only_rejects_mutations() {
        let store = MemoryStore::new();
        let collection = store.create_collection("Brand").await.unwrap();
        store.set_read_only(true);

        let err = store
            .create_variable("size", &collection.id, VariableType::Float)
            .await
            .unwrap_err();
        assert!(err.is_read_only());
        assert!(store.create_collection("Other").await.unwrap_err().is_read_only());

        // Reads still work.
        assert_eq!(store.list_collections().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_restores_contents_and_ids() {
        let store = MemoryStore::new();
        let collection = store.create_collection("Brand").await.unwrap();
        let var = store
            .create_variable("size", &collection.id, VariableType::Float)
            .await
            .unwrap();
        store
            .set_value_for_mode(&var.id, &collection.modes[0].mode_id, VariableValue::Float(4.0))
            .await
            .unwrap();

        let json = serde_json::to_string(&store.snapshot().unwrap()).unwrap();
        let restored = MemoryStore::from_snapshot(serde_json::from_str(&json).unwrap());

        assert_eq!(restored.snapshot().unwrap(), store.snapshot().unwrap());
        let next = restored
            .create_variable("other", &collection.id, VariableType::Float)
            .await
            .unwrap();
        assert_ne!(next.id, var.id);
    }

    #[tokio::test]
    async fn test_stats_count_mutations() {
        let store = MemoryStore::new();
        let collection = store.create_collection("Brand").await.unwrap();
        let var = store
            .create_variable("size", &collection.id, VariableType::Float)
            .await
            .unwrap();
        store
            .set_value_for_mode(&var.id, &collection.modes[0].mode_id, VariableValue::Float(4.0))
            .await
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.collections_created, 1);
        assert_eq!(stats.variables_created, 1);
        assert_eq!(stats.values_set, 1);

        store.reset_stats().unwrap();
        assert_eq!(store.stats().unwrap(), StoreStats::default());
    }
}
