//! Per-import state: the variable cache and the materialization path.

use crate::import::SkippedToken;
use dtm_core::{
    Alias, CollectionId, ImportError, MaterializedToken, ModeId, SkipReason, TokenSet,
    VariableId, VariableType, VariableValue,
};
use dtm_store::{Collection, Throttle, VariableStore};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Name to variable lookup for one collection.
///
/// Built once at the start of an import from the collection's existing
/// variables and dropped when the import returns.
#[derive(Debug, Default)]
pub struct VariableCache {
    entries: IndexMap<String, VariableId>,
}

impl VariableCache {
    /// Read every variable of `collection` through the store.
    pub async fn build(
        store: &dyn VariableStore,
        collection: &Collection,
        throttle: &mut Throttle,
    ) -> Result<Self, ImportError> {
        let mut cache = Self::default();
        for id in &collection.variable_ids {
            let variable = store
                .get_variable(id)
                .await
                .map_err(|e| ImportError::from_store("read", id.as_str(), e))?;
            if let Some(variable) = variable {
                cache.entries.insert(variable.name, variable.id);
            }
            throttle.tick().await;
        }
        info!(collection = %collection.name, size = cache.len(), "Cache built");
        Ok(cache)
    }

    pub fn get(&self, name: &str) -> Option<&VariableId> {
        self.entries.get(name)
    }

    pub fn insert(&mut self, name: &str, id: VariableId) {
        self.entries.insert(name.to_string(), id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything one import call threads through traversal and alias resolution.
pub struct ImportContext<'a> {
    store: &'a dyn VariableStore,
    collection_id: CollectionId,
    mode_id: ModeId,
    cache: VariableCache,
    throttle: Throttle,
    /// Tokens materialized by this import, by name.
    pub tokens: TokenSet,
    pub created: usize,
    pub updated: usize,
    pub skipped: Vec<SkippedToken>,
}

impl<'a> ImportContext<'a> {
    pub fn new(
        store: &'a dyn VariableStore,
        collection_id: CollectionId,
        mode_id: ModeId,
        cache: VariableCache,
        throttle: Throttle,
    ) -> Self {
        Self {
            store,
            collection_id,
            mode_id,
            cache,
            throttle,
            tokens: TokenSet::new(),
            created: 0,
            updated: 0,
            skipped: Vec::new(),
        }
    }

    /// Store operations performed so far, cache reads included.
    pub fn operation_count(&self) -> usize {
        self.throttle.count()
    }

    /// Write a token's value into the target mode, reusing the cached variable
    /// of the same name or creating one.
    pub async fn materialize(
        &mut self,
        name: &str,
        variable_type: VariableType,
        value: VariableValue,
        description: &str,
    ) -> Result<VariableId, ImportError> {
        let (id, existing) = match self.cache.get(name).cloned() {
            Some(id) => (id, true),
            None => {
                let variable = self
                    .store
                    .create_variable(name, &self.collection_id, variable_type)
                    .await
                    .map_err(|e| ImportError::from_store("create", name, e))?;
                self.cache.insert(name, variable.id.clone());
                (variable.id, false)
            }
        };

        self.store
            .set_value_for_mode(&id, &self.mode_id, value)
            .await
            .map_err(|e| ImportError::from_store("set value of", name, e))?;

        if !description.is_empty() {
            self.store
                .set_description(&id, description)
                .await
                .map_err(|e| ImportError::from_store("set description of", name, e))?;
        }

        if existing {
            debug!(name, "Updated variable");
            self.updated += 1;
        } else {
            debug!(name, %variable_type, "Created variable");
            self.created += 1;
        }

        self.throttle.tick().await;
        self.tokens.insert(
            name,
            MaterializedToken {
                id: id.clone(),
                variable_type,
                description: description.to_string(),
            },
        );
        Ok(id)
    }

    /// Materialize an alias if its target is in the working set.
    ///
    /// The alias takes its target's type. Without a description of its own it
    /// takes the target's description. Returns `false` when the target is absent.
    pub async fn materialize_alias(&mut self, alias: &Alias) -> Result<bool, ImportError> {
        let Some(target) = self.tokens.get(&alias.target).cloned() else {
            return Ok(false);
        };
        if let Some(declared) = alias.type_conflict(target.variable_type) {
            warn!(
                name = %alias.name,
                %declared,
                target = %alias.target,
                resolved = %target.variable_type,
                "Alias declares a type other than its target's; using the target's"
            );
        }
        let description = if alias.description.is_empty() {
            target.description.as_str()
        } else {
            alias.description.as_str()
        };

        self.materialize(
            &alias.name,
            target.variable_type,
            VariableValue::Alias(target.id.clone()),
            description,
        )
        .await?;
        Ok(true)
    }

    /// Record a token that could not be classified. The import continues.
    pub fn skip(&mut self, name: &str, raw: &Value, reason: SkipReason) {
        warn!(name, value = %raw, %reason, "Skipping token");
        self.skipped.push(SkippedToken {
            name: name.to_string(),
            value: raw.to_string(),
            reason,
        });
    }
}
