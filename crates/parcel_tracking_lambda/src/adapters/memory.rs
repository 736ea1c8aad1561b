//! In-memory [`KeyValueStore`] for tests and local runs.
//!
//! Items are kept in insertion order per table. Queries match on the partition
//! attribute only (the index name is ignored) and `newest_first` reverses
//! insertion order, which matches the store's sort-key ordering as long as
//! records are written chronologically.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use serde_json::Value;

use crate::adapters::store::{Item, KeyQuery, KeyValueStore};
use crate::error::DependencyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StoreOperation {
    Put,
    Query,
    Scan,
    Update,
    Describe,
}

impl StoreOperation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Put => "put_item",
            Self::Query => "query",
            Self::Scan => "scan",
            Self::Update => "update_item",
            Self::Describe => "describe_table",
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<BTreeMap<String, Vec<Item>>>,
    failures: Mutex<BTreeSet<(String, StoreOperation)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `operation` on `table` return a [`DependencyError`].
    pub fn fail_on(&self, table: &str, operation: StoreOperation) {
        self.failures
            .lock()
            .expect("poisoned mutex")
            .insert((table.to_string(), operation));
    }

    pub fn items(&self, table: &str) -> Vec<Item> {
        self.tables
            .lock()
            .expect("poisoned mutex")
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn insert(&self, table: &str, item: Value) {
        if let Value::Object(map) = item {
            self.tables
                .lock()
                .expect("poisoned mutex")
                .entry(table.to_string())
                .or_default()
                .push(map);
        }
    }

    fn check(&self, table: &str, operation: StoreOperation) -> Result<(), DependencyError> {
        let failing = self
            .failures
            .lock()
            .expect("poisoned mutex")
            .contains(&(table.to_string(), operation));
        if failing {
            return Err(DependencyError::new(
                "memory",
                operation.as_str(),
                format!("injected failure on table {table}"),
            ));
        }
        Ok(())
    }
}

impl KeyValueStore for InMemoryStore {
    fn put_item(&self, table: &str, item: Item) -> Result<(), DependencyError> {
        self.check(table, StoreOperation::Put)?;
        self.insert(table, Value::Object(item));
        Ok(())
    }

    fn query(&self, table: &str, query: &KeyQuery) -> Result<Vec<Item>, DependencyError> {
        self.check(table, StoreOperation::Query)?;
        let mut matches: Vec<Item> = self
            .items(table)
            .into_iter()
            .filter(|item| {
                item.get(&query.key_name).and_then(Value::as_str) == Some(query.key_value.as_str())
            })
            .collect();
        if query.newest_first {
            matches.reverse();
        }
        if let Some(limit) = query.limit {
            matches.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(matches)
    }

    fn scan(&self, table: &str, limit: i32) -> Result<Vec<Item>, DependencyError> {
        self.check(table, StoreOperation::Scan)?;
        let mut items = self.items(table);
        items.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(items)
    }

    fn update_attribute(
        &self,
        table: &str,
        key: Item,
        attribute: &str,
        value: Value,
    ) -> Result<bool, DependencyError> {
        self.check(table, StoreOperation::Update)?;
        let mut tables = self.tables.lock().expect("poisoned mutex");
        let existing = tables.get_mut(table).and_then(|items| {
            items
                .iter_mut()
                .find(|item| key.iter().all(|(name, expected)| item.get(name) == Some(expected)))
        });
        match existing {
            Some(item) => {
                item.insert(attribute.to_string(), value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn table_status(&self, table: &str) -> Result<String, DependencyError> {
        self.check(table, StoreOperation::Describe)?;
        Ok("ACTIVE".to_string())
    }
}
