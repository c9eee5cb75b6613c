use std::sync::Arc;

use apikit::{ApiResult, Envelope, ListQueryParams};
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::Json,
    Extension,
};
use query_core::ListQuery;
use serde_json::Value;
use tracing::{debug, info};

use crate::api::rest::dto::{
    CategoryStatsDto, CreateProductReq, CreatedDto, ProductDetailDto, ProductDto,
    ProductWithCategoryDto, ProductsData, SearchQuery, StatsData, UpdateProductReq,
};
use crate::domain::error::DomainError;
use crate::domain::service::Service;

type Svc = Extension<Arc<Service>>;

/// Fields every projected record keeps.
const ALWAYS_KEPT: [&str; 1] = ["id"];

async fn list_flow(
    svc: &Service,
    query: &ListQuery,
) -> ApiResult<Json<Envelope<ProductsData<Value>>>, DomainError> {
    let page = svc.list_products(query).await?;
    if let Some(p) = page.page {
        debug!(page = p.page, limit = p.limit, "Paginated listing");
    }

    let products = page
        .items
        .into_iter()
        .map(|p| {
            serde_json::to_value(ProductDto::from(p))
                .map(|v| page.fields.project(v, &ALWAYS_KEPT))
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DomainError::database(format!("serialize product: {e}")))?;

    let count = products.len();
    Ok(Json(Envelope::ok(ProductsData { products }).with_count(count)))
}

/// List products filtered, sorted, projected and paginated by the query string
pub async fn list_products(
    Extension(svc): Svc,
    ListQueryParams(query): ListQueryParams,
) -> ApiResult<Json<Envelope<ProductsData<Value>>>, DomainError> {
    info!("Listing products");
    list_flow(&svc, &query).await
}

/// The few best-priced products, with a reduced field set
pub async fn popular_products(
    Extension(svc): Svc,
) -> ApiResult<Json<Envelope<ProductsData<Value>>>, DomainError> {
    info!("Listing popular products");
    let query = svc.popular_query()?;
    list_flow(&svc, &query).await
}

pub async fn products_of_category(
    Extension(svc): Svc,
    Path(category_name): Path<String>,
) -> ApiResult<Json<Envelope<ProductsData<ProductWithCategoryDto>>>, DomainError> {
    info!("Listing products of category {}", category_name);

    let products: Vec<ProductWithCategoryDto> = svc
        .products_of_category(&category_name)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let length = products.len();
    Ok(Json(Envelope::ok(ProductsData { products }).with_length(length)))
}

pub async fn search_products(
    Extension(svc): Svc,
    Query(q): Query<SearchQuery>,
) -> ApiResult<Json<Envelope<ProductsData<ProductWithCategoryDto>>>, DomainError> {
    info!("Searching products by name: {:?}", q.name);

    let products: Vec<ProductWithCategoryDto> = svc
        .search_products(&q.name)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let length = products.len();
    Ok(Json(Envelope::ok(ProductsData { products }).with_length(length)))
}

/// Get a specific product by ID
pub async fn get_product(
    Extension(svc): Svc,
    Path(product_id): Path<String>,
) -> ApiResult<Json<Envelope<ProductDetailDto>>, DomainError> {
    info!("Getting product with id: {}", product_id);

    let product = svc.get_product(&product_id).await?;
    Ok(Json(Envelope::ok(ProductDetailDto::from(product))))
}

pub async fn product_stats(
    Extension(svc): Svc,
) -> ApiResult<Json<Envelope<StatsData>>, DomainError> {
    info!("Computing product stats");

    let stats: Vec<CategoryStatsDto> = svc.stats().await?.into_iter().map(Into::into).collect();
    let count = stats.len();
    Ok(Json(Envelope::ok(StatsData { stats }).with_count(count)))
}

/// Create a new product
pub async fn create_product(
    Extension(svc): Svc,
    Json(req_body): Json<CreateProductReq>,
) -> ApiResult<(StatusCode, Json<Envelope<CreatedDto>>), DomainError> {
    info!("Creating product: {:?}", req_body.name);

    let product = svc.create_product(req_body.into()).await?;
    let body = Envelope::ok(CreatedDto {
        message: "Product created".to_string(),
        id: product.id,
    });
    Ok((StatusCode::CREATED, Json(body)))
}

/// Update name, image and price of an existing product
pub async fn update_product(
    Extension(svc): Svc,
    Path(product_id): Path<String>,
    Json(req_body): Json<UpdateProductReq>,
) -> ApiResult<Json<Envelope<String>>, DomainError> {
    info!("Updating product {} with: {:?}", product_id, req_body);

    let product = svc.update_product(&product_id, req_body.into()).await?;
    Ok(Json(Envelope::ok(format!(
        "The product {} was updated.",
        product.name
    ))))
}

/// Delete a product by ID
pub async fn delete_product(
    Extension(svc): Svc,
    Path(product_id): Path<String>,
) -> ApiResult<Json<Envelope<String>>, DomainError> {
    info!("Deleting product: {}", product_id);

    let product = svc.delete_product(&product_id).await?;
    Ok(Json(Envelope::ok(format!(
        "The product {} was successfully deleted",
        product.name
    ))))
}
