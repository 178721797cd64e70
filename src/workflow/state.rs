// SPDX-License-Identifier: MIT

//! Shared workflow state
//!
//! A `WorkflowState` is the string-keyed JSON mapping threaded through a run.
//! Each node receives a snapshot by value and returns the authoritative next
//! state; the engine never merges old and new state itself.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Mutable key/value state for one workflow run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowState {
    fields: Map<String, Value>,
}

impl WorkflowState {
    /// Create an empty state
    pub fn empty() -> Self {
        Self { fields: Map::new() }
    }

    /// Build a state from a JSON object map
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Set a field, overwriting any previous value
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Remove a field, returning its previous value if any
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Get a field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a nested value using dot notation (e.g. `"result.intent"`)
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Convenience accessor for string fields
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Convenience accessor for unsigned integer fields
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    /// Snapshot the state as a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Number of top-level fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the state holds no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
