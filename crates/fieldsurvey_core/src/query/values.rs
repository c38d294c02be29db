//! Column/value payload for insert and update calls.

use rusqlite::types::Value;
use std::collections::BTreeMap;

/// Ordered column-name to value map used as mutation payload.
///
/// Keys are unqualified column names of the target table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentValues {
    entries: BTreeMap<String, Value>,
}

impl ContentValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one value, replacing any previous value for `key`.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Sets one text value.
    pub fn put_text(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.put(key, Value::Text(value.into()))
    }

    /// Sets an explicit SQL `NULL`.
    pub fn put_null(&mut self, key: impl Into<String>) -> &mut Self {
        self.put(key, Value::Null)
    }

    /// Builder-style variant of [`ContentValues::put`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.put(key, value);
        self
    }

    /// Builder-style variant of [`ContentValues::put_text`].
    pub fn with_text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.put_text(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns the value for `key` when it is stored as text.
    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(Value::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ContentValues {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        }
    }
}
