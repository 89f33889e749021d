//! Aggregates module
pub mod product;

pub use product::{
    Dimensions, Environmental, GeneralInformation, Inventory, Product, ProductData, ProductPatch,
    ProductView, Technical,
};
