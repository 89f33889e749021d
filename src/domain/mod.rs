//! Catalog domain: the product record and its value objects.
pub mod aggregates;
pub mod value_objects;
