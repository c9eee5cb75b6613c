use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Mount the `/products` routes onto `router`.
///
/// Literal segments (`popular`, `stats`, `search`, `category`) take precedence
/// over the `{product_id}` capture.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    let products = Router::new()
        .route(
            "/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/products/popular", get(handlers::popular_products))
        .route("/products/stats", get(handlers::product_stats))
        .route("/products/search", get(handlers::search_products))
        .route(
            "/products/category/{category_name}",
            get(handlers::products_of_category),
        )
        .route(
            "/products/{product_id}",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .layer(Extension(service));

    router.merge(products)
}
