use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{lookup, set_path, Document, DocumentStore, Filter, FindOptions, IndexSpec, StoreError, StoreResult};
use crate::domain::value_objects::RecordId;

/// In-memory document store for tests/dev.
///
/// Each write runs under a single lock, so unique-index checks and the write
/// they guard are atomic.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    inner: RwLock<HashMap<String, Collection>>,
}

#[derive(Debug, Default)]
struct Collection {
    docs: Vec<Document>,
    indexes: Vec<IndexSpec>,
}

impl Collection {
    /// First unique index `doc` would violate, ignoring the document at `skip`.
    fn violation(&self, doc: &Document, skip: Option<usize>) -> Option<StoreError> {
        let id = doc.get("_id");
        let id_taken = self
            .docs
            .iter()
            .enumerate()
            .any(|(i, other)| Some(i) != skip && id.is_some() && other.get("_id") == id);
        if id_taken {
            return Some(StoreError::DuplicateKey {
                index: "_id_".into(),
                field: "_id".into(),
                value: id.cloned().unwrap_or(Value::Null),
            });
        }

        for index in self.indexes.iter().filter(|ix| ix.unique) {
            let key: Vec<Option<&Value>> = index.fields().map(|f| lookup(doc, f)).collect();
            if key.iter().all(|v| v.map_or(true, Value::is_null)) {
                continue;
            }
            let clash = self.docs.iter().enumerate().any(|(i, other)| {
                Some(i) != skip && index.fields().zip(&key).all(|(f, v)| lookup(other, f) == *v)
            });
            if clash {
                let value = match key.as_slice() {
                    [single] => single.cloned().unwrap_or(Value::Null),
                    many => Value::Array(many.iter().map(|v| v.cloned().unwrap_or(Value::Null)).collect()),
                };
                return Some(StoreError::DuplicateKey {
                    index: index.name(),
                    field: index.fields().collect::<Vec<_>>().join(", "),
                    value,
                });
            }
        }
        None
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self { inner: RwLock::new(HashMap::new()) }
    }

    /// Indexes declared on `collection`, in declaration order.
    pub fn indexes(&self, collection: &str) -> Vec<IndexSpec> {
        self.inner
            .read()
            .ok()
            .and_then(|map| map.get(collection).map(|c| c.indexes.clone()))
            .unwrap_or_default()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.inner
            .read()
            .ok()
            .and_then(|map| map.get(collection).map(|c| c.docs.len()))
            .unwrap_or(0)
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("lock poisoned".into())
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create_index(&self, collection: &str, index: &IndexSpec) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(poisoned)?;
        let coll = map.entry(collection.to_string()).or_default();
        if !coll.indexes.contains(index) {
            coll.indexes.push(index.clone());
        }
        Ok(())
    }

    async fn insert_one(&self, collection: &str, mut doc: Document) -> StoreResult<Document> {
        if !doc.contains_key("_id") {
            doc.insert("_id".into(), Value::String(RecordId::new().to_string()));
        }
        let mut map = self.inner.write().map_err(poisoned)?;
        let coll = map.entry(collection.to_string()).or_default();
        if let Some(err) = coll.violation(&doc, None) {
            return Err(err);
        }
        coll.docs.push(doc.clone());
        Ok(doc)
    }

    async fn find(&self, collection: &str, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>> {
        let map = self.inner.read().map_err(poisoned)?;
        let Some(coll) = map.get(collection) else {
            return Ok(vec![]);
        };
        let mut found: Vec<Document> = coll.docs.iter().filter(|d| filter.matches(d)).cloned().collect();
        if !options.sort.is_empty() {
            found.sort_by(|a, b| options.compare(a, b));
        }
        let mut page: Vec<Document> = found
            .into_iter()
            .skip(options.skip)
            .take(options.limit.unwrap_or(usize::MAX))
            .collect();
        for doc in &mut page {
            options.apply_projection(doc);
        }
        Ok(page)
    }

    async fn find_one_and_update(&self, collection: &str, filter: &Filter, set: Document) -> StoreResult<Option<Document>> {
        let mut map = self.inner.write().map_err(poisoned)?;
        let Some(coll) = map.get_mut(collection) else {
            return Ok(None);
        };
        let Some(pos) = coll.docs.iter().position(|d| filter.matches(d)) else {
            return Ok(None);
        };
        let mut updated = coll.docs[pos].clone();
        for (path, value) in set {
            set_path(&mut updated, &path, value);
        }
        if let Some(err) = coll.violation(&updated, Some(pos)) {
            return Err(err);
        }
        coll.docs[pos] = updated.clone();
        Ok(Some(updated))
    }
}
