//! Product repository: runs every write and read through the schema's
//! interceptors before and after touching the store.

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::domain::aggregates::{Product, ProductData, ProductPatch, ProductView};
use crate::domain::value_objects::RecordId;
use crate::schema::{ProductSchema, QueryContext, QueryOp};
use crate::store::{Document, DocumentStore, Filter, FindOptions};
use crate::{CatalogError, Result};

pub struct ProductRepository<S> {
    store: S,
    schema: ProductSchema,
}

impl<S: DocumentStore> ProductRepository<S> {
    pub fn new(store: S, schema: ProductSchema) -> Self {
        Self { store, schema }
    }

    pub fn schema(&self) -> &ProductSchema { &self.schema }
    pub fn store(&self) -> &S { &self.store }

    /// Declares every schema index on the store.
    pub async fn init(&self) -> Result<()> {
        for index in self.schema.indexes() {
            self.store.create_index(self.schema.collection(), index).await?;
        }
        info!(collection = self.schema.collection(), indexes = self.schema.indexes().len(), "product schema registered");
        Ok(())
    }

    pub async fn create(&self, data: ProductData) -> Result<Product> {
        let product = self.schema.before_create(data)?;
        let stored = self.store.insert_one(self.schema.collection(), to_document(&product)?).await?;
        let product = from_document(stored)?;
        info!(id = %product.id, slug = %product.slug, "product created");
        Ok(product)
    }

    /// Decodes untyped input first; ill-typed fields and unknown enum values
    /// are reported as validation failures.
    pub async fn create_from_json(&self, input: Value) -> Result<Product> {
        let data: ProductData =
            serde_json::from_value(input).map_err(|e| CatalogError::InvalidValue(e.to_string()))?;
        self.create(data).await
    }

    pub async fn find(&self, filter: Filter, options: FindOptions) -> Result<Vec<Product>> {
        self.query(QueryOp::Find, filter, options).await
    }

    pub async fn find_one(&self, filter: Filter) -> Result<Option<Product>> {
        self.query_one(QueryOp::FindOne, filter).await
    }

    pub async fn find_by_id(&self, id: RecordId) -> Result<Option<Product>> {
        self.query_one(QueryOp::FindById, id_filter(id)).await
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        self.query_one(QueryOp::FindBySlug, Filter::eq("slug", slug)).await
    }

    /// Partial update through the query pipeline. Hidden products are not
    /// matched; the slug keeps the value derived at creation. An empty patch
    /// reads the product without writing.
    pub async fn find_by_id_and_update(&self, id: RecordId, patch: ProductPatch) -> Result<Option<Product>> {
        let patch = self.schema.prepare_update(patch)?;
        if patch.is_empty() {
            return self.query_one(QueryOp::FindByIdAndUpdate, id_filter(id)).await;
        }
        let set = to_document(&patch)?;

        let mut query = QueryContext::new(QueryOp::FindByIdAndUpdate, id_filter(id));
        self.schema.before_query(&mut query);
        let updated = self
            .store
            .find_one_and_update(self.schema.collection(), query.filter(), set)
            .await?;
        let mut docs: Vec<Document> = updated.into_iter().collect();
        let projection = self.schema.read_options(FindOptions::default());
        for doc in &mut docs {
            projection.apply_projection(doc);
        }
        let products = self.finish(&query, docs).await?;
        Ok(products.into_iter().next())
    }

    /// Reviews pointing at `product` through the `reviews` virtual.
    pub async fn reviews(&self, product: &Product) -> Result<Vec<Document>> {
        let key = Value::String(product.id.to_string());
        Ok(self.schema.reviews().resolve(&self.store, &key).await?)
    }

    pub async fn find_by_id_with_reviews(&self, id: RecordId) -> Result<Option<ProductView>> {
        let Some(product) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let reviews = self.reviews(&product).await?;
        Ok(Some(ProductView::new(product).with_reviews(reviews)))
    }

    async fn query_one(&self, op: QueryOp, filter: Filter) -> Result<Option<Product>> {
        let products = self.query(op, filter, FindOptions::default().limit(1)).await?;
        Ok(products.into_iter().next())
    }

    async fn query(&self, op: QueryOp, filter: Filter, options: FindOptions) -> Result<Vec<Product>> {
        let mut query = QueryContext::new(op, filter);
        self.schema.before_query(&mut query);
        let options = self.schema.read_options(options);
        let docs = self.store.find(self.schema.collection(), query.filter(), &options).await?;
        self.finish(&query, docs).await
    }

    /// Populates references, decodes, and closes the query clock.
    async fn finish(&self, query: &QueryContext, mut docs: Vec<Document>) -> Result<Vec<Product>> {
        for populate in query.populate() {
            populate.apply(&self.store, &mut docs).await?;
        }
        let products = docs.into_iter().map(from_document).collect::<Result<Vec<_>>>()?;
        self.schema.after_query(query, products.len());
        Ok(products)
    }
}

fn id_filter(id: RecordId) -> Filter {
    Filter::eq("_id", id.to_string())
}

fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(doc) => Ok(doc),
        other => Err(CatalogError::InvalidValue(format!("expected an object, got {other}"))),
    }
}

fn from_document(doc: Document) -> Result<Product> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{QueryTiming, PRODUCTS, REVIEWS};
    use crate::store::{InMemoryDocumentStore, SortOrder};
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::sync::Arc;

    type Repo = ProductRepository<Arc<InMemoryDocumentStore>>;

    async fn repo() -> Repo {
        let repo = ProductRepository::new(Arc::new(InMemoryDocumentStore::new()), ProductSchema::new(QueryTiming::default()));
        repo.init().await.unwrap();
        repo
    }

    fn breaker(title: &str, order_code: &str) -> Value {
        json!({
            "title": title,
            "generalInformation": {
                "name": title, "orderCode": order_code, "catalogDescription": "d",
                "longDescription": "d", "productOrigin": "VN", "productBrand": "ACME"
            },
            "imageUrl": ["img.jpg"],
            "originalLink": "http://x",
            "price": 100,
            "priceDiscount": 80
        })
    }

    #[tokio::test]
    async fn test_create_then_duplicate_title() {
        let repo = repo().await;
        let product = repo.create_from_json(breaker("Breaker A", "BRK-001")).await.unwrap();
        assert_eq!(product.slug, "breaker-a");
        assert_eq!(product.data.price_discount, Some(Decimal::new(80, 0)));

        let err = repo.create_from_json(breaker("Breaker A", "BRK-001")).await.unwrap_err();
        match err {
            CatalogError::DuplicateKey { ref field, ref value } => {
                assert_eq!(field, "title");
                assert_eq!(value, "Breaker A");
            }
            ref other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_validation());
        assert_eq!(repo.store().len(PRODUCTS), 1);
    }

    #[tokio::test]
    async fn test_duplicate_order_code_rejected() {
        let repo = repo().await;
        repo.create_from_json(breaker("Breaker A", "BRK-001")).await.unwrap();
        let err = repo.create_from_json(breaker("Breaker B", " BRK-001 ")).await.unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateKey { ref field, .. } if field == "generalInformation.orderCode"));
    }

    #[tokio::test]
    async fn test_concurrent_creates_yield_one_winner() {
        let repo = Arc::new(repo().await);
        let handles: Vec<_> = (0..2)
            .map(|i| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.create_from_json(breaker("Breaker A", &format!("BRK-00{i}"))).await })
            })
            .collect();
        let mut ok = 0;
        let mut duplicate = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(CatalogError::DuplicateKey { .. }) => duplicate += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!((ok, duplicate), (1, 1));
    }

    #[tokio::test]
    async fn test_rating_rounded_on_create() {
        let repo = repo().await;
        let mut input = breaker("Breaker A", "BRK-001");
        input["ratingsAverage"] = json!(4.66);
        let product = repo.create_from_json(input).await.unwrap();
        assert_eq!(product.data.ratings_average, 4.7);

        let mut input = breaker("Breaker B", "BRK-002");
        input["ratingsAverage"] = json!(5.2);
        assert!(matches!(repo.create_from_json(input).await, Err(CatalogError::Validation(_))));
    }

    #[tokio::test]
    async fn test_discount_rules_on_create() {
        let repo = repo().await;
        let mut input = breaker("Breaker A", "BRK-001");
        input["priceDiscount"] = json!(100);
        assert!(matches!(
            repo.create_from_json(input).await,
            Err(CatalogError::DiscountNotBelowPrice { .. })
        ));
        assert_eq!(repo.store().len(PRODUCTS), 0);
    }

    #[tokio::test]
    async fn test_price_of_any_shape_accepted_without_discount() {
        let repo = repo().await;
        for (i, price) in [json!("on request"), json!([100, 90]), json!(true)].into_iter().enumerate() {
            let mut input = breaker(&format!("Breaker {i}"), &format!("BRK-{i}"));
            input["price"] = price.clone();
            input.as_object_mut().unwrap().remove("priceDiscount");
            let product = repo.create_from_json(input).await.unwrap();
            assert_eq!(serde_json::to_value(&product.data.price).unwrap(), price);
        }

        let mut input = breaker("Breaker D", "BRK-D");
        input["price"] = json!("on request");
        assert!(matches!(
            repo.create_from_json(input).await,
            Err(CatalogError::DiscountNotBelowPrice { .. })
        ));
    }

    #[tokio::test]
    async fn test_diacritic_title_gets_ascii_slug() {
        let repo = repo().await;
        let product = repo.create_from_json(breaker("Áptômát Đôi 3P", "APT-3P")).await.unwrap();
        assert_eq!(product.slug, "aptomat-doi-3p");
        assert_eq!(product.data.title, "Áptômát Đôi 3P");
        assert_eq!(repo.find_by_slug("aptomat-doi-3p").await.unwrap().unwrap().id, product.id);
    }

    #[tokio::test]
    async fn test_invalid_enum_is_validation_error() {
        let repo = repo().await;
        let mut input = breaker("Breaker A", "BRK-001");
        input["technical"] = json!({ "overvoltageCategory": "VI" });
        let err = repo.create_from_json(input).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidValue(_)));
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_secret_products_never_returned() {
        let repo = repo().await;
        let visible = repo.create_from_json(breaker("Breaker A", "BRK-001")).await.unwrap();
        let mut hidden = breaker("Breaker B", "BRK-002");
        hidden["secretProduct"] = json!(true);
        let hidden = repo.create_from_json(hidden).await.unwrap();

        let all = repo.find(Filter::All, FindOptions::default()).await.unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![visible.id]);

        let asked_for_secret = repo.find(Filter::eq("secretProduct", true), FindOptions::default()).await.unwrap();
        assert!(asked_for_secret.is_empty());

        assert!(repo.find_by_id(hidden.id).await.unwrap().is_none());
        assert!(repo.find_by_slug("breaker-b").await.unwrap().is_none());
        assert!(repo.find_one(Filter::eq("title", "Breaker B")).await.unwrap().is_none());

        let patch = ProductPatch { ratings_quantity: Some(3.0), ..Default::default() };
        assert!(repo.find_by_id_and_update(hidden.id, patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_created_at_deselected_unless_requested() {
        let repo = repo().await;
        let created = repo.create_from_json(breaker("Breaker A", "BRK-001")).await.unwrap();
        assert!(created.data.created_at.is_some());

        let found = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert!(found.data.created_at.is_none());

        let selected = repo.find(Filter::All, FindOptions::default().select("createdAt")).await.unwrap();
        assert_eq!(selected[0].data.created_at, created.data.created_at);
    }

    #[tokio::test]
    async fn test_find_sorted_by_price_then_rating() {
        let repo = repo().await;
        for (i, (price, rating)) in [(300, 4.0), (100, 3.0), (100, 5.0)].into_iter().enumerate() {
            let mut input = breaker(&format!("Breaker {i}"), &format!("BRK-{i}"));
            input["price"] = json!(price);
            input["priceDiscount"] = json!(1);
            input["ratingsAverage"] = json!(rating);
            repo.create_from_json(input).await.unwrap();
        }
        let options = FindOptions::default()
            .sort_by("price", SortOrder::Ascending)
            .sort_by("ratingsAverage", SortOrder::Descending);
        let titles: Vec<String> = repo.find(Filter::All, options).await.unwrap().into_iter().map(|p| p.data.title).collect();
        assert_eq!(titles, vec!["Breaker 2", "Breaker 1", "Breaker 0"]);

        let cheap = repo.find(Filter::lt("price", 200), FindOptions::default()).await.unwrap();
        assert_eq!(cheap.len(), 2);

        let mid_rated = Filter::gte("ratingsAverage", 3.0).and(Filter::lte("ratingsAverage", 4.0));
        assert_eq!(repo.find(mid_rated, FindOptions::default()).await.unwrap().len(), 2);
        assert_eq!(repo.find(Filter::gt("price", 100), FindOptions::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_update_reads_without_writing() {
        let repo = repo().await;
        let created = repo.create_from_json(breaker("Breaker A", "BRK-001")).await.unwrap();
        let unchanged = repo.find_by_id_and_update(created.id, ProductPatch::default()).await.unwrap().unwrap();
        assert_eq!(unchanged.id, created.id);
        assert_eq!(unchanged.data.title, "Breaker A");
        assert!(unchanged.data.created_at.is_none());
        assert!(repo.find_by_id_and_update(RecordId::new(), ProductPatch::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_keeps_slug_and_skips_discount_check() {
        let repo = repo().await;
        let created = repo.create_from_json(breaker("Breaker A", "BRK-001")).await.unwrap();
        let patch = ProductPatch {
            title: Some("  Breaker A Plus ".into()),
            price_discount: Some(Decimal::new(150, 0)),
            ratings_average: Some(3.94),
            ..Default::default()
        };
        let updated = repo.find_by_id_and_update(created.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.data.title, "Breaker A Plus");
        assert_eq!(updated.slug, "breaker-a");
        assert_eq!(updated.data.price_discount, Some(Decimal::new(150, 0)));
        assert_eq!(updated.data.ratings_average, 3.9);
        assert!(updated.data.created_at.is_none());
        assert_eq!(repo.find_by_slug("breaker-a").await.unwrap().unwrap().id, created.id);
    }

    #[tokio::test]
    async fn test_update_validates_and_enforces_uniqueness() {
        let repo = repo().await;
        repo.create_from_json(breaker("Breaker A", "BRK-001")).await.unwrap();
        let second = repo.create_from_json(breaker("Breaker B", "BRK-002")).await.unwrap();

        let rename = ProductPatch { title: Some("Breaker A".into()), ..Default::default() };
        let err = repo.find_by_id_and_update(second.id, rename).await.unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateKey { ref field, .. } if field == "title"));

        let empty_images = ProductPatch { image_url: Some(vec![]), ..Default::default() };
        assert!(matches!(
            repo.find_by_id_and_update(second.id, empty_images).await,
            Err(CatalogError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_reviews_virtual_resolves() {
        let repo = repo().await;
        let product = repo.create_from_json(breaker("Breaker A", "BRK-001")).await.unwrap();
        let other = repo.create_from_json(breaker("Breaker B", "BRK-002")).await.unwrap();
        let review = |id: RecordId, text: &str| {
            json!({ "product": id.to_string(), "review": text }).as_object().cloned().unwrap()
        };
        repo.store().insert_one(REVIEWS, review(product.id, "solid")).await.unwrap();
        repo.store().insert_one(REVIEWS, review(other.id, "meh")).await.unwrap();

        let view = repo.find_by_id_with_reviews(product.id).await.unwrap().unwrap();
        let reviews = view.reviews.as_ref().unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0]["review"], json!("solid"));

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["id"], json!(product.id.to_string()));
        assert_eq!(value["slug"], json!("breaker-a"));
    }

    #[tokio::test]
    async fn test_init_declares_schema_indexes() {
        let repo = repo().await;
        let declared = repo.store().indexes(PRODUCTS);
        assert_eq!(declared, repo.schema().indexes().to_vec());
    }
}
