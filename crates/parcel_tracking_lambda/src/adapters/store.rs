use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::DependencyError;

/// A stored record as a JSON object. Numbers arrive already bridged to plain
/// JSON numbers by the store implementation.
pub type Item = Map<String, Value>;

/// Partition-key equality query against a table or one of its indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyQuery {
    pub index: Option<String>,
    pub key_name: String,
    pub key_value: String,
    pub limit: Option<i32>,
    pub newest_first: bool,
}

impl KeyQuery {
    pub fn partition(key_name: impl Into<String>, key_value: impl Into<String>) -> Self {
        Self {
            index: None,
            key_name: key_name.into(),
            key_value: key_value.into(),
            limit: None,
            newest_first: false,
        }
    }

    pub fn on_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }
}

pub trait KeyValueStore {
    fn put_item(&self, table: &str, item: Item) -> Result<(), DependencyError>;

    fn query(&self, table: &str, query: &KeyQuery) -> Result<Vec<Item>, DependencyError>;

    fn scan(&self, table: &str, limit: i32) -> Result<Vec<Item>, DependencyError>;

    /// Sets one attribute on the existing item identified by `key`.
    /// Returns `false` without writing when no such item exists.
    fn update_attribute(
        &self,
        table: &str,
        key: Item,
        attribute: &str,
        value: Value,
    ) -> Result<bool, DependencyError>;

    fn table_status(&self, table: &str) -> Result<String, DependencyError>;
}

/// Serializes a record into a store item.
pub fn to_item(record: &impl serde::Serialize) -> Result<Item, DependencyError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DependencyError::new(
            "serde",
            "to_item",
            "record did not serialize to an object",
        )),
        Err(error) => Err(DependencyError::new("serde", "to_item", error.to_string())),
    }
}

/// Decodes stored items into records, skipping items that do not fit `T`.
pub fn decode_items<T: DeserializeOwned>(table: &str, items: Vec<Item>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(Value::Object(item)) {
            Ok(record) => Some(record),
            Err(error) => {
                tracing::warn!(table, error = %error, "skipping malformed item");
                None
            }
        })
        .collect()
}
