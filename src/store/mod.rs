//! Document store contract consumed by the catalog.
//!
//! Records travel as JSON objects. Field paths use dot notation
//! (`generalInformation.orderCode`) everywhere a path is accepted.

mod index;
mod memory;

pub use index::{IndexKey, IndexSpec};
pub use memory::InMemoryDocumentStore;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::Arc;
use thiserror::Error;

pub type Document = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key on index `{index}`: {field} = {value}")]
    DuplicateKey { index: String, field: String, value: Value },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence layer for schema-flexible records.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Declares an index. Unique indexes are enforced on every later write.
    async fn create_index(&self, collection: &str, index: &IndexSpec) -> StoreResult<()>;

    /// Inserts `doc`, assigning `_id` when absent, and returns the stored copy.
    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<Document>;

    async fn find(&self, collection: &str, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>>;

    /// Applies `set` to the first match and returns the updated document.
    async fn find_one_and_update(&self, collection: &str, filter: &Filter, set: Document) -> StoreResult<Option<Document>>;
}

#[async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn create_index(&self, collection: &str, index: &IndexSpec) -> StoreResult<()> {
        (**self).create_index(collection, index).await
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<Document> {
        (**self).insert_one(collection, doc).await
    }

    async fn find(&self, collection: &str, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>> {
        (**self).find(collection, filter, options).await
    }

    async fn find_one_and_update(&self, collection: &str, filter: &Filter, set: Document) -> StoreResult<Option<Document>> {
        (**self).find_one_and_update(collection, filter, set).await
    }
}

/// Query predicate over documents.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    All,
    Eq(String, Value),
    /// Matches when the field differs from the value, including when it is absent.
    Ne(String, Value),
    In(String, Vec<Value>),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self { Self::Eq(path.into(), value.into()) }
    pub fn ne(path: impl Into<String>, value: impl Into<Value>) -> Self { Self::Ne(path.into(), value.into()) }
    pub fn any_of(path: impl Into<String>, values: Vec<Value>) -> Self { Self::In(path.into(), values) }
    pub fn gt(path: impl Into<String>, value: impl Into<Value>) -> Self { Self::Gt(path.into(), value.into()) }
    pub fn gte(path: impl Into<String>, value: impl Into<Value>) -> Self { Self::Gte(path.into(), value.into()) }
    pub fn lt(path: impl Into<String>, value: impl Into<Value>) -> Self { Self::Lt(path.into(), value.into()) }
    pub fn lte(path: impl Into<String>, value: impl Into<Value>) -> Self { Self::Lte(path.into(), value.into()) }

    /// Conjunction. The result only matches what both sides match.
    pub fn and(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut all), f) => {
                all.push(f);
                Filter::And(all)
            }
            (f, Filter::And(mut all)) => {
                all.insert(0, f);
                Filter::And(all)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(path, expected) => field_equals(lookup(doc, path), expected),
            Filter::Ne(path, expected) => !field_equals(lookup(doc, path), expected),
            Filter::In(path, values) => {
                let actual = lookup(doc, path);
                values.iter().any(|v| field_equals(actual, v))
            }
            Filter::Gt(path, v) => compare_field(doc, path, v) == Some(Ordering::Greater),
            Filter::Gte(path, v) => matches!(compare_field(doc, path, v), Some(Ordering::Greater | Ordering::Equal)),
            Filter::Lt(path, v) => compare_field(doc, path, v) == Some(Ordering::Less),
            Filter::Lte(path, v) => matches!(compare_field(doc, path, v), Some(Ordering::Less | Ordering::Equal)),
            Filter::And(all) => all.iter().all(|f| f.matches(doc)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder { Ascending, Descending }

/// Sort, paging and projection for `find`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Vec<(String, SortOrder)>,
    pub skip: usize,
    pub limit: Option<usize>,
    /// Top-level fields removed from results.
    pub exclude: Vec<String>,
    /// Fields kept even when listed in `exclude`.
    pub include: Vec<String>,
}

impl FindOptions {
    pub fn sort_by(mut self, path: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push((path.into(), order));
        self
    }
    pub fn skip(mut self, skip: usize) -> Self { self.skip = skip; self }
    pub fn limit(mut self, limit: usize) -> Self { self.limit = Some(limit); self }
    pub fn exclude<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.exclude.extend(fields.into_iter().map(Into::into));
        self
    }
    /// Opts a deselected field back into the results.
    pub fn select(mut self, field: impl Into<String>) -> Self {
        self.include.push(field.into());
        self
    }

    pub fn apply_projection(&self, doc: &mut Document) {
        for field in &self.exclude {
            if !self.include.contains(field) {
                doc.remove(field);
            }
        }
    }

    pub(crate) fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for (path, order) in &self.sort {
            let ord = sort_order(lookup(a, path), lookup(b, path));
            let ord = match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// Resolves a dotted path inside a document.
pub fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Writes `value` at a dotted path, creating intermediate objects.
pub fn set_path(doc: &mut Document, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            doc.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = doc.entry(head.to_string()).or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(inner) = entry {
                set_path(inner, rest, value);
            }
        }
    }
}

fn field_equals(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None | Some(Value::Null) => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => items.iter().any(|item| values_equal(item, expected)),
        Some(value) => values_equal(value, expected),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare_field(doc: &Document, path: &str, expected: &Value) -> Option<Ordering> {
    compare_values(lookup(doc, path)?, expected)
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order used for sorting: absent and null first, then numbers,
/// strings, objects, arrays, booleans.
fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(Value::Object(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Bool(_)) => 5,
        }
    }
    match (a, b) {
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or_else(|| rank(a).cmp(&rank(b))),
        _ => rank(a).cmp(&rank(b)),
    }
}
