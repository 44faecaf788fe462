//! In-memory document store for tests and local tooling. Keeps insertion
//! order, which is the "store order" returned by unsorted finds.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::{Collection, DocumentStore, FindOptions, SortDirection, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Value>>>,
    indexes: RwLock<BTreeSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the indexes created so far.
    pub async fn index_names(&self) -> Vec<String> {
        self.indexes.read().await.iter().cloned().collect()
    }
}

fn doc_id(collection: Collection, doc: &Value) -> Result<String, StoreError> {
    doc.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(StoreError::MissingId(collection))
}

/// Comparable form of a field; missing and null sort first.
fn sort_key(doc: &Value, field: &str) -> Option<String> {
    match doc.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, collection: Collection, doc: Value) -> Result<(), StoreError> {
        self.insert_many(collection, vec![doc]).await.and_then(|written| {
            if written == 1 {
                Ok(())
            } else {
                Err(StoreError::NotAcknowledged(collection))
            }
        })
    }

    async fn insert_many(&self, collection: Collection, docs: Vec<Value>) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let existing = collections.entry(collection).or_default();

        let mut seen: HashSet<String> = existing
            .iter()
            .filter_map(|doc| doc.get("id").and_then(Value::as_str).map(str::to_string))
            .collect();
        for doc in &docs {
            let id = doc_id(collection, doc)?;
            if !seen.insert(id.clone()) {
                return Err(StoreError::DuplicateId { collection, id });
            }
        }

        let written = docs.len() as u64;
        existing.extend(docs);
        Ok(written)
    }

    async fn find(&self, collection: Collection, options: FindOptions) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Value> = collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| match &options.filter {
                        Some(filter) => {
                            doc.get(filter.field).and_then(Value::as_str) == Some(filter.value.as_str())
                        }
                        None => true,
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some((field, direction)) = options.sort {
            docs.sort_by(|a, b| {
                let ordering = sort_key(a, field).cmp(&sort_key(b, field));
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);
        Ok(docs.into_iter().skip(skip).take(limit).collect())
    }

    async fn find_by_id(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).and_then(|docs| {
            docs.iter()
                .find(|doc| doc.get("id").and_then(Value::as_str) == Some(id))
                .cloned()
        }))
    }

    async fn set_field(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let target = collections.get_mut(&collection).and_then(|docs| {
            docs.iter_mut()
                .find(|doc| doc.get("id").and_then(Value::as_str) == Some(id))
        });

        match target.and_then(Value::as_object_mut) {
            Some(doc) => {
                doc.insert(field.to_string(), value);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_all(&self, collection: Collection) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .remove(&collection)
            .map(|docs| docs.len() as u64)
            .unwrap_or(0))
    }

    async fn count(&self, collection: Collection) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|docs| docs.len() as u64)
            .unwrap_or(0))
    }

    async fn distinct(&self, collection: Collection, field: &str) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        let mut values: BTreeMap<String, Value> = BTreeMap::new();
        for doc in collections.get(&collection).into_iter().flatten() {
            if let Some(key) = sort_key(doc, field) {
                if let Some(value) = doc.get(field) {
                    values.entry(key).or_insert_with(|| value.clone());
                }
            }
        }
        Ok(values.into_values().collect())
    }

    async fn create_index(&self, collection: Collection, field: &'static str) -> Result<String, StoreError> {
        let name = collection.index_name(field);
        self.collections.write().await.entry(collection).or_default();
        self.indexes.write().await.insert(name.clone());
        Ok(name)
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        let _ = self.collections.read().await;
        Ok(start.elapsed())
    }

    async fn close(&self) {
        tracing::debug!("In-memory store closed");
    }
}
