//! Records exchanged with a variable store.

use dtm_core::{CollectionId, ModeId, VariableId, VariableType, VariableValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A value-variant axis of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mode {
    pub mode_id: ModeId,
    pub name: String,
}

/// A named namespace of variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    /// Never empty for collections created by a store.
    pub modes: Vec<Mode>,
    pub variable_ids: Vec<VariableId>,
}

impl Collection {
    pub fn default_mode(&self) -> Option<&Mode> {
        self.modes.first()
    }

    pub fn mode(&self, id: &ModeId) -> Option<&Mode> {
        self.modes.iter().find(|m| &m.mode_id == id)
    }

    pub fn mode_named(&self, name: &str) -> Option<&Mode> {
        self.modes.iter().find(|m| m.name == name)
    }
}

/// A variable with one value slot per mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub id: VariableId,
    /// `/`-joined token path.
    pub name: String,
    pub collection_id: CollectionId,
    pub resolved_type: VariableType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub values_by_mode: IndexMap<ModeId, VariableValue>,
}

impl Variable {
    pub fn value_for_mode(&self, mode: &ModeId) -> Option<&VariableValue> {
        self.values_by_mode.get(mode)
    }
}
