//! SeaORM-backed implementations of the domain repository ports.
//!
//! Both structs are generic over `C: ConnectionTrait`, so they can be built
//! with a `DatabaseConnection` or a transactional connection.

use std::collections::HashMap;

use anyhow::Context;
use apikit_db::{contains_folded, fold_case, folded_eq, FieldKind, FieldMap, QueryFeatures};
use query_core::{LimitCfg, ListQuery, OrderBy, OrderKey, SortDir};
use sea_orm::{
    sea_query::{Alias, Expr, Func, SimpleExpr},
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr,
};
use uuid::Uuid;

use crate::contract::model::{Category, CategoryStats, Product, ProductPage};
use crate::domain::repo::{CategoriesRepository, ListError, NameTaken, ProductsRepository};
use crate::infra::storage::entity::category::{
    ActiveModel as CategoryAM, Column as CategoryColumn, Entity as CategoryEntity,
};
use crate::infra::storage::entity::product::{
    ActiveModel as ProductAM, Column, Entity as ProductEntity,
};

/// API field name → column, for filters and sorting.
pub fn product_fields() -> FieldMap<ProductEntity> {
    FieldMap::new()
        .insert("id", Column::Id, FieldKind::Uuid)
        .insert("name", Column::Name, FieldKind::String)
        .insert("price", Column::Price, FieldKind::F64)
        .insert("description", Column::Description, FieldKind::String)
        .insert("imgURL", Column::ImgUrl, FieldKind::String)
        .insert("category", Column::CategoryId, FieldKind::Uuid)
        .insert("createdAt", Column::CreatedAt, FieldKind::DateTimeUtc)
        .insert("updatedAt", Column::UpdatedAt, FieldKind::DateTimeUtc)
}

fn default_order() -> OrderBy {
    OrderBy(vec![OrderKey {
        field: "createdAt".to_string(),
        dir: SortDir::Asc,
    }])
}

/// Unique index hits become [`NameTaken`], everything else keeps its context.
fn write_err(e: DbErr, name: &str, ctx: &'static str) -> anyhow::Error {
    if let Some(SqlErr::UniqueConstraintViolation(_)) = e.sql_err() {
        return anyhow::Error::new(NameTaken(name.to_string()));
    }
    anyhow::Error::new(e).context(ctx)
}

/// SeaORM repository impl for products.
pub struct SeaOrmProductsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
    fields: FieldMap<ProductEntity>,
}

impl<C> SeaOrmProductsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            fields: product_fields(),
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct StatsRow {
    category_id: Uuid,
    avg_price: f64,
    min_price: f64,
    max_price: f64,
    total_price: f64,
    total_products: i64,
}

impl From<StatsRow> for CategoryStats {
    fn from(r: StatsRow) -> Self {
        Self {
            category_id: r.category_id,
            avg_price: r.avg_price,
            min_price: r.min_price,
            max_price: r.max_price,
            total_price: r.total_price,
            total_products: u64::try_from(r.total_products).unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl<C> ProductsRepository for SeaOrmProductsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        let found = ProductEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(Into::into))
    }

    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Product>> {
        let found = ProductEntity::find()
            .filter(Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("find_by_name failed")?;
        Ok(found.map(Into::into))
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Product>> {
        let rows = ProductEntity::find()
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await
            .context("list_all failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_page(
        &self,
        query: &ListQuery,
        limits: LimitCfg,
    ) -> Result<ProductPage, ListError> {
        let features = QueryFeatures::new(ProductEntity::find(), query, &self.fields)
            .filter()?
            .sort(&default_order(), ("id", SortDir::Asc))
            .limit_fields()
            .paginate(limits);
        let page = features.page();
        let (select, fields) = features.into_parts();

        let rows = select
            .all(&self.conn)
            .await
            .context("list_page failed")?;
        Ok(ProductPage {
            items: rows.into_iter().map(Into::into).collect(),
            fields,
            page,
        })
    }

    async fn list_by_category(&self, category_id: Uuid) -> anyhow::Result<Vec<Product>> {
        let rows = ProductEntity::find()
            .filter(Column::CategoryId.eq(category_id))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await
            .context("list_by_category failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn search_by_name(&self, needle: &str) -> anyhow::Result<Vec<Product>> {
        let rows = ProductEntity::find()
            .filter(contains_folded(Column::NameLower, needle))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await
            .context("search_by_name failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn stats(&self) -> anyhow::Result<Vec<CategoryStats>> {
        let price = || Expr::col(Column::Price);
        let rows = ProductEntity::find()
            .select_only()
            .column(Column::CategoryId)
            .column_as(SimpleExpr::from(Func::avg(price())), "avg_price")
            .column_as(SimpleExpr::from(Func::min(price())), "min_price")
            .column_as(SimpleExpr::from(Func::max(price())), "max_price")
            .column_as(SimpleExpr::from(Func::sum(price())), "total_price")
            .column_as(
                SimpleExpr::from(Func::count(Expr::col(Column::Id))),
                "total_products",
            )
            .filter(Column::Price.gte(0.0))
            .group_by(Column::CategoryId)
            .order_by_asc(SimpleExpr::from(Expr::col(Alias::new("total_products"))))
            .order_by_asc(Column::CategoryId)
            .into_model::<StatsRow>()
            .all(&self.conn)
            .await
            .context("stats failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert(&self, p: Product) -> anyhow::Result<bool> {
        let name = p.name.clone();
        let m = ProductAM {
            id: Set(p.id),
            name_lower: Set(fold_case(&p.name)),
            name: Set(p.name),
            price: Set(p.price),
            description: Set(p.description),
            img_url: Set(p.img_url),
            category_id: Set(p.category_id),
            created_at: Set(p.created_at),
            updated_at: Set(p.updated_at),
        };
        let rows = ProductEntity::insert(m)
            .exec_without_returning(&self.conn)
            .await
            .map_err(|e| write_err(e, &name, "insert failed"))?;
        Ok(rows > 0)
    }

    async fn update(&self, p: &Product) -> anyhow::Result<bool> {
        let res = ProductEntity::update_many()
            .col_expr(Column::Name, Expr::value(p.name.clone()))
            .col_expr(Column::NameLower, Expr::value(fold_case(&p.name)))
            .col_expr(Column::ImgUrl, Expr::value(p.img_url.clone()))
            .col_expr(Column::Price, Expr::value(p.price))
            .col_expr(Column::UpdatedAt, Expr::value(p.updated_at))
            .filter(Column::Id.eq(p.id))
            .exec(&self.conn)
            .await
            .map_err(|e| write_err(e, &p.name, "update failed"))?;
        Ok(res.rows_affected > 0)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = ProductEntity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete failed")?;
        Ok(res.rows_affected > 0)
    }
}

/// SeaORM repository impl for categories.
pub struct SeaOrmCategoriesRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmCategoriesRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> CategoriesRepository for SeaOrmCategoriesRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Category>> {
        let found = CategoryEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("category find_by_id failed")?;
        Ok(found.map(Into::into))
    }

    async fn find_by_name_ci(&self, name: &str) -> anyhow::Result<Option<Category>> {
        let found = CategoryEntity::find()
            .filter(folded_eq(CategoryColumn::NameLower, name))
            .one(&self.conn)
            .await
            .context("category find_by_name_ci failed")?;
        Ok(found.map(Into::into))
    }

    async fn names_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = CategoryEntity::find()
            .filter(CategoryColumn::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await
            .context("names_by_ids failed")?;
        Ok(rows.into_iter().map(|c| (c.id, c.name)).collect())
    }

    async fn insert(&self, c: Category) -> anyhow::Result<()> {
        let m = CategoryAM {
            id: Set(c.id),
            name_lower: Set(fold_case(&c.name)),
            name: Set(c.name),
        };
        CategoryEntity::insert(m)
            .exec_without_returning(&self.conn)
            .await
            .context("category insert failed")?;
        Ok(())
    }
}
