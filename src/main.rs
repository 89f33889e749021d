//! Product Catalog - loads seed products into an in-memory catalog and prints
//! what readers can see.

use anyhow::{Context, Result};
use product_catalog::{
    telemetry, CatalogConfig, Filter, FindOptions, InMemoryDocumentStore, ProductRepository, ProductSchema, SortOrder,
};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<()> {
    let config = CatalogConfig::from_env()?;
    telemetry::init(&config);

    let repo = ProductRepository::new(InMemoryDocumentStore::new(), ProductSchema::new(config.query_timing()));
    repo.init().await?;

    if let Some(path) = &config.seed_file {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading seed file {}", path.display()))?;
        let seeds: Vec<Value> = serde_json::from_str(&raw).context("seed file must be a JSON array of products")?;
        tracing::info!(count = seeds.len(), path = %path.display(), "seeding products");
        for seed in seeds {
            match repo.create_from_json(seed).await {
                Ok(product) => tracing::info!(id = %product.id, title = product.title(), "seeded product"),
                Err(e) if e.is_validation() => tracing::warn!(error = %e, "seed product rejected"),
                Err(e) => return Err(e.into()),
            }
        }
    }

    let options = FindOptions::default()
        .sort_by("price", SortOrder::Ascending)
        .sort_by("ratingsAverage", SortOrder::Descending);
    let products = repo.find(Filter::All, options).await?;
    println!("{}", serde_json::to_string_pretty(&products)?);
    Ok(())
}
