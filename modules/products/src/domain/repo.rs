use std::collections::HashMap;

use apikit_db::QueryBuildError;
use async_trait::async_trait;
use query_core::{LimitCfg, ListQuery};
use thiserror::Error;
use uuid::Uuid;

use crate::contract::model::{Category, CategoryStats, Product, ProductPage};

/// Raised by repositories when a write hits the unique index on product names.
#[derive(Debug, Error)]
#[error("product name '{0}' is already taken")]
pub struct NameTaken(pub String);

#[derive(Debug, Error)]
pub enum ListError {
    #[error(transparent)]
    Query(#[from] QueryBuildError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Port for the domain layer: product persistence.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait ProductsRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Product>>;
    /// Case-sensitive exact name lookup.
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Product>>;
    /// Every product, oldest first.
    async fn list_all(&self) -> anyhow::Result<Vec<Product>>;
    /// Filtered, sorted and paginated listing driven by a parsed query string.
    async fn list_page(&self, query: &ListQuery, limits: LimitCfg)
        -> Result<ProductPage, ListError>;
    async fn list_by_category(&self, category_id: Uuid) -> anyhow::Result<Vec<Product>>;
    /// Case-insensitive literal substring match on the name.
    async fn search_by_name(&self, needle: &str) -> anyhow::Result<Vec<Product>>;
    /// Per-category price aggregates over products priced at zero or more,
    /// smallest groups first.
    async fn stats(&self) -> anyhow::Result<Vec<CategoryStats>>;
    /// Insert a fully-formed product. Returns true if a row was written.
    ///
    /// Fails with [`NameTaken`] on a duplicate name.
    async fn insert(&self, p: Product) -> anyhow::Result<bool>;
    /// Overwrite name, image, price and `updated_at` of `p.id`.
    /// Returns true if a row was updated.
    async fn update(&self, p: &Product) -> anyhow::Result<bool>;
    /// Delete by id. Returns true if a row was deleted.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Port for category lookups. Categories are read-only apart from seeding.
#[async_trait]
pub trait CategoriesRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Category>>;
    /// Case-insensitive exact name lookup.
    async fn find_by_name_ci(&self, name: &str) -> anyhow::Result<Option<Category>>;
    /// Resolve many ids in one round trip. Unknown ids are absent from the map.
    async fn names_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, String>>;
    async fn insert(&self, c: Category) -> anyhow::Result<()>;
}
