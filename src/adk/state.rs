// SPDX-License-Identifier: MIT

//! Shared state store threaded through every stage of a run

use serde_json::{Map, Value};
use std::collections::HashMap;

/// Key-value state shared by the stages of one invocation
///
/// Besides the values themselves the store remembers which keys were
/// written since it was created or forked (its delta). A forked copy can
/// be handed to a concurrently running stage and its delta merged back
/// once that stage completes.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    fields: HashMap<String, Value>,
    delta: Map<String, Value>,
}

impl SessionState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state from initial values. The initial values are not
    /// part of the delta.
    pub fn from_map(values: HashMap<String, Value>) -> Self {
        Self {
            fields: values,
            delta: Map::new(),
        }
    }

    /// Get a field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a field value as a string slice, if it is a JSON string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Overwrite a field and record it in the delta
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        self.delta.insert(key.clone(), value.clone());
        self.fields.insert(key, value);
    }

    /// Apply a batch of writes, e.g. an event's state delta
    pub fn apply(&mut self, delta: &Map<String, Value>) {
        for (k, v) in delta {
            self.set(k.clone(), v.clone());
        }
    }

    /// Keys written since creation or the last fork
    pub fn delta(&self) -> &Map<String, Value> {
        &self.delta
    }

    /// Copy of this state with an empty delta
    pub fn fork(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            delta: Map::new(),
        }
    }

    /// Merge the writes a fork performed back into this state
    pub fn merge(&mut self, fork: &SessionState) {
        self.apply(&fork.delta);
    }

    /// Convert state to JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Get all field names
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn into_map(self) -> HashMap<String, Value> {
        self.fields
    }
}
