//! Product record schema.
//!
//! Owns everything the persistence layer needs to know about products: the
//! collection name, index declarations, the `reviews` virtual, reference
//! population, deselected fields and the lifecycle interceptors in [`hooks`].
//! A schema is a plain value handed to the repository; nothing registers it
//! globally.

mod hooks;
mod relation;

pub use hooks::{QueryContext, QueryOp, QueryTiming};
pub use relation::{Populate, VirtualRelation};

use validator::Validate;

use crate::domain::aggregates::ProductPatch;
use crate::store::{Filter, FindOptions, IndexKey, IndexSpec};
use crate::Result;

pub const PRODUCTS: &str = "products";
pub const USERS: &str = "users";
pub const REVIEWS: &str = "reviews";

#[derive(Clone, Debug)]
pub struct ProductSchema {
    indexes: Vec<IndexSpec>,
    reviews: VirtualRelation,
    populate: Vec<Populate>,
    deselected: Vec<&'static str>,
    timing: QueryTiming,
}

impl ProductSchema {
    pub fn new(timing: QueryTiming) -> Self {
        Self {
            indexes: vec![
                IndexSpec::unique("title"),
                IndexSpec::unique("generalInformation.name"),
                IndexSpec::unique("generalInformation.orderCode"),
                IndexSpec::new([("price", IndexKey::Ascending), ("ratingsAverage", IndexKey::Descending)]),
                IndexSpec::new([("slug", IndexKey::Ascending)]),
                // `startLocation` is not a product field, so this index covers nothing.
                IndexSpec::new([("startLocation", IndexKey::Geo2dSphere)]),
            ],
            reviews: VirtualRelation { name: "reviews", target: REVIEWS, foreign_field: "product", local_field: "_id" },
            // `guides` is not a product field either; population finds no references.
            populate: vec![Populate { path: "guides", from: USERS, exclude: &["__v", "passwordChangedAt"] }],
            deselected: vec!["createdAt"],
            timing,
        }
    }

    pub fn collection(&self) -> &'static str { PRODUCTS }
    pub fn indexes(&self) -> &[IndexSpec] { &self.indexes }
    pub fn reviews(&self) -> &VirtualRelation { &self.reviews }
    pub fn populate(&self) -> &[Populate] { &self.populate }
    pub fn deselected(&self) -> &[&'static str] { &self.deselected }
    pub fn timing(&self) -> QueryTiming { self.timing }

    /// Predicate every product query is narrowed by.
    pub fn visibility_filter() -> Filter { Filter::ne("secretProduct", true) }

    /// Adds the schema's deselected fields to caller options. Fields the
    /// caller selected explicitly stay in the results.
    pub fn read_options(&self, options: FindOptions) -> FindOptions {
        options.exclude(self.deselected.iter().copied())
    }

    /// Casts a partial update: trims, rounds and validates the provided
    /// fields. Cross-field checks that only hold on creation are not run.
    pub fn prepare_update(&self, mut patch: ProductPatch) -> Result<ProductPatch> {
        patch.normalize();
        patch.validate()?;
        Ok(patch)
    }
}

impl Default for ProductSchema {
    fn default() -> Self { Self::new(QueryTiming::default()) }
}
