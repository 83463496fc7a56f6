//! Persisted action configuration.
//!
//! Every action round-trips through an [`ActionConfig`]: a JSON object of
//! primitive or nested values. Cross-entity references are stored as ids
//! and re-resolved at load time so renamed entities keep working.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::action::ActionId;

/// An entity that actions may reference by id.
pub trait Identified {
    fn id(&self) -> u32;
    fn name(&self) -> &str;
}

/// Finds the entity with the given id.
pub fn resolve_id<T: Identified>(entities: &[T], id: u32) -> Option<&T> {
    entities.iter().find(|e| e.id() == id)
}

/// One action in a persisted pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedAction {
    pub kind: String,
    pub id: ActionId,
    #[serde(default)]
    pub config: ActionConfig,
}

/// Key-value configuration of a single action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionConfig(Map<String, Value>);

impl ActionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a key, returning `self` for chaining.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Sets a key only when `value` is present.
    pub fn insert_opt<V: Into<Value>>(&mut self, key: &str, value: Option<V>) {
        if let Some(v) = value {
            self.insert(key, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
    }

    /// Reads a sequence of strings; non-string items are dropped.
    pub fn get_strings(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
    }

    /// Reads a structured value; malformed values read as absent.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, error = %e, "ignoring malformed action setting");
                None
            }
        }
    }

    /// Returns the first key present, probing in order.
    ///
    /// Used for renamed settings: the current key first, then older ones.
    pub fn probe(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|k| self.get(k))
    }

    /// Re-resolves an entity reference against the current entity set.
    ///
    /// Probes `id_key` first and then `legacy_name_key`, which older
    /// files used to store the entity by name. Anything that no longer
    /// resolves reads as unset.
    pub fn entity_ref<T: Identified>(
        &self,
        id_key: &str,
        legacy_name_key: &str,
        entities: &[T],
    ) -> Option<u32> {
        if let Some(id) = self.get_u32(id_key)
            && resolve_id(entities, id).is_some()
        {
            return Some(id);
        }

        if let Some(name) = self.get_str(legacy_name_key)
            && let Some(entity) = entities.iter().find(|e| e.name() == name)
        {
            return Some(entity.id());
        }

        if self.contains_key(id_key) || self.contains_key(legacy_name_key) {
            warn!(key = id_key, "stale entity reference, leaving unset");
        }
        None
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ActionConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
