use std::sync::Arc;

use chrono::Utc;
use query_core::{LimitCfg, ListQuery};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::ProductsConfig;
use crate::contract::model::{
    Category, CategoryStats, NewProduct, Product, ProductPage, ProductPatch,
};
use crate::domain::enrich::{with_category_name, with_category_names, WithCategory};
use crate::domain::error::{DomainError, ProductOp};
use crate::domain::repo::{CategoriesRepository, ListError, NameTaken, ProductsRepository};

/// Fields returned by the popular products listing.
const POPULAR_FIELDS: &str = "name,price,description,category";

/// Domain service with the catalog's business rules.
/// Depends only on the repository ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    products: Arc<dyn ProductsRepository>,
    categories: Arc<dyn CategoriesRepository>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub limits: LimitCfg,
    pub popular_limit: u64,
    pub popular_min_price: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from(&ProductsConfig::default())
    }
}

impl From<&ProductsConfig> for ServiceConfig {
    fn from(cfg: &ProductsConfig) -> Self {
        Self {
            limits: LimitCfg {
                default: cfg.default_page_size,
                max: cfg.max_page_size,
            },
            popular_limit: cfg.popular_limit,
            popular_min_price: cfg.popular_min_price,
        }
    }
}

fn db_err(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}

/// Malformed ids can never match a stored product.
fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(
        products: Arc<dyn ProductsRepository>,
        categories: Arc<dyn CategoriesRepository>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            products,
            categories,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Query behind `GET /products/popular`.
    pub fn popular_query(&self) -> Result<ListQuery, query_core::Error> {
        let limit = self.config.popular_limit.to_string();
        let min_price = self.config.popular_min_price.to_string();
        ListQuery::from_pairs([
            ("limit", limit.as_str()),
            ("price[gt]", min_price.as_str()),
            ("fields", POPULAR_FIELDS),
        ])
    }

    /// List products. An empty query returns everything, unpaginated.
    #[instrument(name = "products.service.list_products", skip(self, query))]
    pub async fn list_products(&self, query: &ListQuery) -> Result<ProductPage, DomainError> {
        if query.is_empty() {
            debug!("Listing all products");
            let items = self.products.list_all().await.map_err(db_err)?;
            return Ok(ProductPage {
                items,
                fields: query.fields.clone(),
                page: None,
            });
        }

        debug!(
            filters = query.filters.len(),
            sort = %query.order.to_param(),
            "Listing products with query"
        );
        let page = self
            .products
            .list_page(query, self.config.limits)
            .await
            .map_err(|e| match e {
                ListError::Query(e) => DomainError::Query(e),
                ListError::Store(e) => db_err(e),
            })?;
        debug!("Listed {} products", page.items.len());
        Ok(page)
    }

    #[instrument(name = "products.service.products_of_category", skip(self))]
    pub async fn products_of_category(
        &self,
        category_name: &str,
    ) -> Result<Vec<WithCategory<Product>>, DomainError> {
        let category = self
            .categories
            .find_by_name_ci(category_name)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::category_name_not_found(category_name))?;

        let products = self
            .products
            .list_by_category(category.id)
            .await
            .map_err(db_err)?;
        debug!("Found {} products in category", products.len());

        // The category is already at hand; no second lookup needed.
        Ok(products
            .into_iter()
            .map(|item| WithCategory {
                item,
                category_name: Some(category.name.clone()),
            })
            .collect())
    }

    #[instrument(name = "products.service.search_products", skip(self))]
    pub async fn search_products(
        &self,
        name: &str,
    ) -> Result<Vec<WithCategory<Product>>, DomainError> {
        let products = self.products.search_by_name(name).await.map_err(db_err)?;
        if products.is_empty() {
            return Ok(Vec::new());
        }
        with_category_names(self.categories.as_ref(), products)
            .await
            .map_err(db_err)
    }

    #[instrument(name = "products.service.get_product", skip(self))]
    pub async fn get_product(&self, id: &str) -> Result<WithCategory<Product>, DomainError> {
        let product = self.load(id, ProductOp::Get).await?;
        with_category_name(self.categories.as_ref(), product)
            .await
            .map_err(db_err)
    }

    #[instrument(name = "products.service.stats", skip(self))]
    pub async fn stats(&self) -> Result<Vec<WithCategory<CategoryStats>>, DomainError> {
        let rows = self.products.stats().await.map_err(db_err)?;
        debug!("Computed stats for {} categories", rows.len());
        with_category_names(self.categories.as_ref(), rows)
            .await
            .map_err(db_err)
    }

    #[instrument(
        name = "products.service.create_product",
        skip(self, new_product),
        fields(name = ?new_product.name)
    )]
    pub async fn create_product(&self, new_product: NewProduct) -> Result<Product, DomainError> {
        info!("Creating new product");

        if let Some(ref name) = new_product.name {
            if self
                .products
                .find_by_name(name)
                .await
                .map_err(db_err)?
                .is_some()
            {
                return Err(DomainError::name_conflict(name.clone()));
            }
        }

        let category_id = new_product
            .category_id
            .as_deref()
            .and_then(parse_id)
            .ok_or_else(|| DomainError::invalid_category(new_product.category_id.clone()))?;
        if self
            .categories
            .find_by_id(category_id)
            .await
            .map_err(db_err)?
            .is_none()
        {
            return Err(DomainError::invalid_category(new_product.category_id));
        }

        let name = new_product
            .name
            .ok_or_else(|| DomainError::validation("name", "a product must have a name"))?;
        validate_name(&name)?;
        let price = new_product
            .price
            .ok_or_else(|| DomainError::validation("price", "a product must have a price"))?;
        validate_price(price)?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::now_v7(),
            name,
            price,
            description: new_product.description,
            img_url: new_product.img_url,
            category_id,
            created_at: now,
            updated_at: now,
        };

        let saved = self
            .products
            .insert(product.clone())
            .await
            .map_err(|e| conflict_or_db(e, &product.name))?;
        if !saved {
            return Err(DomainError::NotSaved);
        }

        info!("Successfully created product with id={}", product.id);
        Ok(product)
    }

    #[instrument(name = "products.service.update_product", skip(self, patch))]
    pub async fn update_product(
        &self,
        id: &str,
        patch: ProductPatch,
    ) -> Result<Product, DomainError> {
        info!("Updating product");

        let mut current = self.load(id, ProductOp::Update).await?;

        if let Some(ref new_name) = patch.name {
            if let Some(other) = self
                .products
                .find_by_name(new_name)
                .await
                .map_err(db_err)?
            {
                if other.id != current.id {
                    return Err(DomainError::name_conflict(new_name.clone()));
                }
            }
        }

        if let Some(name) = patch.name {
            validate_name(&name)?;
            current.name = name;
        }
        if let Some(img_url) = patch.img_url {
            current.img_url = Some(img_url);
        }
        if let Some(price) = patch.price {
            validate_price(price)?;
            current.price = price;
        }
        current.updated_at = Utc::now();

        let updated = self
            .products
            .update(&current)
            .await
            .map_err(|e| conflict_or_db(e, &current.name))?;
        if !updated {
            return Err(DomainError::NotUpdated);
        }

        info!("Successfully updated product");
        Ok(current)
    }

    /// Delete a product and return what was deleted.
    #[instrument(name = "products.service.delete_product", skip(self))]
    pub async fn delete_product(&self, id: &str) -> Result<Product, DomainError> {
        info!("Deleting product");

        let product = self.load(id, ProductOp::Delete).await?;
        let deleted = self.products.delete(product.id).await.map_err(db_err)?;
        if !deleted {
            return Err(DomainError::NotDeleted);
        }

        info!("Successfully deleted product");
        Ok(product)
    }

    /// Insert the named categories that do not exist yet (case-insensitive).
    /// Returns how many were inserted.
    #[instrument(name = "products.service.ensure_categories", skip(self, names))]
    pub async fn ensure_categories(&self, names: &[String]) -> Result<usize, DomainError> {
        let mut inserted = 0;
        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            let exists = self
                .categories
                .find_by_name_ci(name)
                .await
                .map_err(db_err)?
                .is_some();
            if exists {
                continue;
            }
            self.categories
                .insert(Category {
                    id: Uuid::now_v7(),
                    name: name.to_string(),
                })
                .await
                .map_err(db_err)?;
            inserted += 1;
        }
        if inserted > 0 {
            info!("Seeded {} categories", inserted);
        }
        Ok(inserted)
    }

    async fn load(&self, id: &str, op: ProductOp) -> Result<Product, DomainError> {
        let Some(uuid) = parse_id(id) else {
            debug!("Malformed product id");
            return Err(DomainError::product_not_found(id, op));
        };
        self.products
            .find_by_id(uuid)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::product_not_found(id, op))
    }
}

fn conflict_or_db(e: anyhow::Error, name: &str) -> DomainError {
    if e.is::<NameTaken>() {
        DomainError::name_conflict(name)
    } else {
        db_err(e)
    }
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name", "a product must have a name"));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<(), DomainError> {
    if !price.is_finite() || price < 0.0 {
        return Err(DomainError::validation(
            "price",
            format!("price must be a non-negative number, got {price}"),
        ));
    }
    Ok(())
}
