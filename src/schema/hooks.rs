//! Lifecycle interceptors.
//!
//! The repository calls these at three fixed points: `before_create` ahead of
//! every insert, `before_query` ahead of every find-family operation and
//! `after_query` once its results are in hand.

use chrono::Utc;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use validator::Validate;

use super::{Populate, ProductSchema};
use crate::domain::aggregates::{Product, ProductData};
use crate::domain::value_objects::{RecordId, Slug};
use crate::store::Filter;
use crate::{CatalogError, Result};

/// Find-family operations run through the query pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryOp {
    Find,
    FindOne,
    FindById,
    FindBySlug,
    FindByIdAndUpdate,
}

impl QueryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Find => "find",
            Self::FindOne => "findOne",
            Self::FindById => "findById",
            Self::FindBySlug => "findBySlug",
            Self::FindByIdAndUpdate => "findByIdAndUpdate",
        }
    }
}

impl fmt::Display for QueryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Query timing log settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryTiming {
    pub enabled: bool,
    /// Queries at or above this duration log at `warn`.
    pub slow_threshold: Duration,
}

impl Default for QueryTiming {
    fn default() -> Self { Self { enabled: true, slow_threshold: Duration::from_millis(100) } }
}

/// State of one query as it passes through the interceptors.
#[derive(Clone, Debug)]
pub struct QueryContext {
    op: QueryOp,
    filter: Filter,
    populate: Vec<Populate>,
    started: Option<Instant>,
}

impl QueryContext {
    pub fn new(op: QueryOp, filter: Filter) -> Self {
        Self { op, filter, populate: vec![], started: None }
    }

    pub fn op(&self) -> QueryOp { self.op }
    pub fn filter(&self) -> &Filter { &self.filter }
    pub fn populate(&self) -> &[Populate] { &self.populate }

    pub fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }
}

impl ProductSchema {
    /// Turns caller input into the record to insert: applies setters,
    /// validates, checks the discount against the price, derives the slug and
    /// stamps `createdAt` and the identifier.
    pub fn before_create(&self, mut data: ProductData) -> Result<Product> {
        data.normalize();
        data.validate()?;

        if let Some(discount) = data.price_discount {
            let below_price = data.price.as_ref().is_some_and(|price| price.is_above(discount));
            if !below_price {
                return Err(CatalogError::DiscountNotBelowPrice { discount });
            }
        }

        let slug = Slug::from_title(&data.title);
        data.created_at.get_or_insert_with(Utc::now);
        debug!(slug = %slug, "derived product slug");

        Ok(Product { id: RecordId::new(), slug: slug.into_string(), data })
    }

    /// Hides secret products, schedules reference population and starts the
    /// query clock. Caller predicates can only narrow the visible set.
    pub fn before_query(&self, query: &mut QueryContext) {
        let filter = std::mem::replace(&mut query.filter, Filter::All);
        query.filter = filter.and(Self::visibility_filter());
        query.populate.extend(self.populate.iter().cloned());
        query.started = Some(Instant::now());
        debug!(op = %query.op, "product query prepared");
    }

    pub fn after_query(&self, query: &QueryContext, matched: usize) {
        if !self.timing.enabled {
            return;
        }
        let elapsed = query.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;
        if elapsed >= self.timing.slow_threshold {
            warn!(op = %query.op, matched, elapsed_ms, "Product query took {elapsed_ms} milliseconds.");
        } else {
            info!(op = %query.op, matched, elapsed_ms, "Product query took {elapsed_ms} milliseconds.");
        }
    }
}
