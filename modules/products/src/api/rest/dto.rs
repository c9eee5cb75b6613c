use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::model::{CategoryStats, NewProduct, Product, ProductPatch};
use crate::domain::enrich::WithCategory;

/// REST DTO for a stored product; `category` is the category id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "imgURL", skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    pub category: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRefDto {
    pub id: Uuid,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNameDto {
    pub name: Option<String>,
}

/// Product with its category reference resolved to `{id, name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithCategoryDto {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "imgURL", skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    pub category: CategoryRefDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Single product view; the category is reduced to its name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailDto {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "imgURL", skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    pub category: CategoryNameDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatsDto {
    pub category: CategoryRefDto,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub total_price: f64,
    pub total_products: u64,
}

/// REST DTO for creating a product
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductReq {
    pub name: Option<String>,
    pub category_id: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    #[serde(rename = "imgURL")]
    pub img_url: Option<String>,
}

/// REST DTO for updating a product (partial)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateProductReq {
    pub name: Option<String>,
    #[serde(rename = "imgURL")]
    pub img_url: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedDto {
    pub message: String,
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductsData<T> {
    pub products: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsData {
    pub stats: Vec<CategoryStatsDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub name: String,
}

// Conversion implementations between REST DTOs and contract models

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            price: p.price,
            description: p.description,
            img_url: p.img_url,
            category: p.category_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<WithCategory<Product>> for ProductWithCategoryDto {
    fn from(w: WithCategory<Product>) -> Self {
        let p = w.item;
        Self {
            id: p.id,
            name: p.name,
            price: p.price,
            description: p.description,
            img_url: p.img_url,
            category: CategoryRefDto {
                id: p.category_id,
                name: w.category_name,
            },
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<WithCategory<Product>> for ProductDetailDto {
    fn from(w: WithCategory<Product>) -> Self {
        let p = w.item;
        Self {
            id: p.id,
            name: p.name,
            price: p.price,
            description: p.description,
            img_url: p.img_url,
            category: CategoryNameDto {
                name: w.category_name,
            },
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<WithCategory<CategoryStats>> for CategoryStatsDto {
    fn from(w: WithCategory<CategoryStats>) -> Self {
        let s = w.item;
        Self {
            category: CategoryRefDto {
                id: s.category_id,
                name: w.category_name,
            },
            avg_price: s.avg_price,
            min_price: s.min_price,
            max_price: s.max_price,
            total_price: s.total_price,
            total_products: s.total_products,
        }
    }
}

impl From<CreateProductReq> for NewProduct {
    fn from(req: CreateProductReq) -> Self {
        Self {
            name: req.name,
            category_id: req.category_id,
            description: req.description,
            price: req.price,
            img_url: req.img_url,
        }
    }
}

impl From<UpdateProductReq> for ProductPatch {
    fn from(req: UpdateProductReq) -> Self {
        Self {
            name: req.name,
            img_url: req.img_url,
            price: req.price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn hammer() -> Product {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Product {
            id: Uuid::nil(),
            name: "Hammer".into(),
            price: 10.0,
            description: None,
            img_url: Some("hammer.png".into()),
            category_id: Uuid::from_u128(7),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn product_uses_wire_names() {
        let v = serde_json::to_value(ProductDto::from(hammer())).unwrap();
        assert_eq!(v["imgURL"], "hammer.png");
        assert_eq!(v["category"], Uuid::from_u128(7).to_string());
        assert!(v.get("createdAt").is_some());
        assert!(v.get("description").is_none());
    }

    #[test]
    fn detail_drops_the_category_id() {
        let w = WithCategory {
            item: hammer(),
            category_name: Some("Tools".into()),
        };
        let v = serde_json::to_value(ProductDetailDto::from(w)).unwrap();
        assert_eq!(v["category"], json!({"name": "Tools"}));
    }

    #[test]
    fn dangling_category_renders_null_name() {
        let w = WithCategory {
            item: hammer(),
            category_name: None,
        };
        let v = serde_json::to_value(ProductWithCategoryDto::from(w)).unwrap();
        assert_eq!(v["category"]["id"], Uuid::from_u128(7).to_string());
        assert!(v["category"]["name"].is_null());
    }

    #[test]
    fn create_request_reads_camel_case() {
        let req: CreateProductReq = serde_json::from_value(json!({
            "name": "Hammer",
            "categoryId": "abc",
            "price": 10,
            "imgURL": "h.png"
        }))
        .unwrap();
        let new: NewProduct = req.into();
        assert_eq!(new.category_id.as_deref(), Some("abc"));
        assert_eq!(new.price, Some(10.0));
        assert_eq!(new.img_url.as_deref(), Some("h.png"));
        assert_eq!(new.description, None);
    }
}
