#![allow(dead_code)]

use apikit::{with_http_stack, HttpStackConfig};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use products::{
    domain::{repo::CategoriesRepository, service::Service},
    infra::storage::sea_orm_repo::SeaOrmCategoriesRepository,
    ProductsConfig, ProductsModule,
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait, PaginatorTrait};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

/// Fresh in-memory SQLite database. One connection, so every query sees
/// the same memory store.
pub async fn create_test_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    Database::connect(opts)
        .await
        .expect("Failed to connect to test database")
}

pub struct Harness {
    pub db: DatabaseConnection,
    pub module: ProductsModule,
}

impl Harness {
    /// Migrated database with `categories` seeded.
    pub async fn new(categories: &[&str]) -> Self {
        Self::with_config(ProductsConfig {
            seed_categories: categories.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        })
        .await
    }

    pub async fn with_config(config: ProductsConfig) -> Self {
        let db = create_test_db().await;
        let module = ProductsModule::init(db.clone(), config)
            .await
            .expect("Failed to init products module");
        Self { db, module }
    }

    pub fn service(&self) -> Arc<Service> {
        self.module.service()
    }

    /// Products routes behind the full server middleware stack.
    pub fn router(&self) -> Router {
        with_http_stack(
            self.module.register_rest(Router::new()),
            &HttpStackConfig::default(),
        )
    }

    pub async fn category_id(&self, name: &str) -> Uuid {
        SeaOrmCategoriesRepository::new(self.db.clone())
            .find_by_name_ci(name)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("category {name} not seeded"))
            .id
    }

    pub async fn product_count(&self) -> u64 {
        products::infra::storage::entity::product::Entity::find()
            .count(&self.db)
            .await
            .unwrap()
    }
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Method::GET, uri, None).await
}

/// POST a product and return its id.
pub async fn create(router: &Router, name: &str, category: Uuid, price: f64) -> Uuid {
    let (status, body) = send(
        router,
        Method::POST,
        "/products",
        Some(json!({
            "name": name,
            "categoryId": category,
            "description": format!("A fine {name}"),
            "price": price,
            "imgURL": format!("{}.png", name.to_lowercase()),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create {name}: {body}");
    body["data"]["id"].as_str().unwrap().parse().unwrap()
}

pub fn names(body: &Value) -> Vec<String> {
    body["data"]["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect()
}
