use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::ProductsConfig;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::sea_orm_repo::{SeaOrmCategoriesRepository, SeaOrmProductsRepository};

/// The products module: owns its schema, seeds categories and exposes the
/// `/products` REST surface over an injected database connection.
#[derive(Clone)]
pub struct ProductsModule {
    db: DatabaseConnection,
    config: ProductsConfig,
    service: Arc<Service>,
}

impl ProductsModule {
    pub fn new(db: DatabaseConnection, config: ProductsConfig) -> Self {
        debug!(
            "Loaded products config: default_page_size={}, max_page_size={}",
            config.default_page_size, config.max_page_size
        );

        // Wire repositories (infra) to the domain service (ports)
        let products = SeaOrmProductsRepository::new(db.clone());
        let categories = SeaOrmCategoriesRepository::new(db.clone());
        let service = Service::new(
            Arc::new(products),
            Arc::new(categories),
            ServiceConfig::from(&config),
        );

        Self {
            db,
            config,
            service: Arc::new(service),
        }
    }

    /// Build, migrate and seed in one go.
    pub async fn init(db: DatabaseConnection, config: ProductsConfig) -> anyhow::Result<Self> {
        info!("Initializing products module");
        let module = Self::new(db, config);
        module.migrate().await?;
        module.seed().await?;
        Ok(module)
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        info!("Running products database migrations");
        Migrator::up(&self.db, None)
            .await
            .context("products migrations failed")?;
        info!("Products database migrations completed successfully");
        Ok(())
    }

    /// Insert the configured categories that are still missing.
    pub async fn seed(&self) -> anyhow::Result<usize> {
        let inserted = self
            .service
            .ensure_categories(&self.config.seed_categories)
            .await
            .context("seeding categories failed")?;
        Ok(inserted)
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn register_rest(&self, router: Router) -> Router {
        info!("Registering products REST routes");
        routes::register_routes(router, self.service.clone())
    }
}
