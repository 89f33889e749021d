//! Relations between products and records owned by other collections.

use serde_json::Value;
use std::collections::HashMap;

use crate::store::{Document, DocumentStore, Filter, FindOptions, StoreResult};

/// One-to-many relation resolved at read time, never stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VirtualRelation {
    pub name: &'static str,
    pub target: &'static str,
    pub foreign_field: &'static str,
    pub local_field: &'static str,
}

impl VirtualRelation {
    /// Records in `target` whose `foreign_field` equals `local_key`.
    pub async fn resolve<S>(&self, store: &S, local_key: &Value) -> StoreResult<Vec<Document>>
    where
        S: DocumentStore + ?Sized,
    {
        if local_key.is_null() {
            return Ok(vec![]);
        }
        store
            .find(self.target, &Filter::eq(self.foreign_field, local_key.clone()), &FindOptions::default())
            .await
    }
}

/// Replaces identifier references at `path` with the referenced documents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Populate {
    pub path: &'static str,
    pub from: &'static str,
    pub exclude: &'static [&'static str],
}

impl Populate {
    pub async fn apply<S>(&self, store: &S, docs: &mut [Document]) -> StoreResult<()>
    where
        S: DocumentStore + ?Sized,
    {
        let mut ids: Vec<Value> = vec![];
        for doc in docs.iter() {
            match doc.get(self.path) {
                Some(Value::Array(refs)) => ids.extend(refs.iter().filter(|r| r.is_string()).cloned()),
                Some(id @ Value::String(_)) => ids.push(id.clone()),
                _ => {}
            }
        }
        if ids.is_empty() {
            return Ok(());
        }
        ids.dedup();

        let options = FindOptions::default().exclude(self.exclude.iter().copied());
        let found = store.find(self.from, &Filter::any_of("_id", ids), &options).await?;
        let by_id: HashMap<String, Document> = found
            .into_iter()
            .filter_map(|d| Some((d.get("_id")?.as_str()?.to_string(), d)))
            .collect();
        let resolve = |r: &Value| r.as_str().and_then(|id| by_id.get(id)).cloned().map(Value::Object);

        for doc in docs.iter_mut() {
            match doc.get_mut(self.path) {
                Some(Value::Array(refs)) => {
                    *refs = refs.iter().filter_map(|r| resolve(r)).collect();
                }
                Some(slot) if slot.is_string() => {
                    *slot = resolve(&*slot).unwrap_or(Value::Null);
                }
                _ => {}
            }
        }
        Ok(())
    }
}
