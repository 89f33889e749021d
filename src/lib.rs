//! Product Catalog
//!
//! Record schema for catalog products kept in a document store.
//!
//! ## Features
//! - Typed product records with field-level validation
//! - Slug derivation and creation-time discount checks
//! - Query pipeline that hides secret products and times every lookup
//! - Virtual `reviews` relation and reference population
//! - In-memory document store enforcing unique indexes

pub mod config;
pub mod domain;
pub mod repository;
pub mod schema;
pub mod store;
pub mod telemetry;

pub use config::CatalogConfig;
pub use domain::aggregates::{Product, ProductData, ProductPatch, ProductView};
pub use repository::ProductRepository;
pub use schema::ProductSchema;
pub use store::{DocumentStore, Filter, FindOptions, InMemoryDocumentStore, SortOrder};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::store::StoreError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Duplicate value for unique field `{field}`: {value}")]
    DuplicateKey { field: String, value: String },

    #[error("Discount price ({discount}) should be below regular price")]
    DiscountNotBelowPrice { discount: Decimal },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    /// Every rejection of the written data itself, as opposed to a failure of
    /// the surrounding machinery.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::InvalidValue(_)
                | Self::DuplicateKey { .. }
                | Self::DiscountNotBelowPrice { .. }
        )
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { field, value, .. } => {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                Self::DuplicateKey { field, value }
            }
            other => Self::Storage(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
