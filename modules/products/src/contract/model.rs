use chrono::{DateTime, Utc};
use query_core::{FieldSelection, PageRequest};
use uuid::Uuid;

/// Pure product model (no serde); REST shapes live in `api::rest::dto`.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
    pub img_url: Option<String>,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a product, as received.
///
/// Everything is optional here: presence and shape are checked by the service
/// so that each failure gets its own error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewProduct {
    pub name: Option<String>,
    pub category_id: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub img_url: Option<String>,
}

/// Partial update; only name, image and price can change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub img_url: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// Price aggregates of the products of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub category_id: Uuid,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub total_price: f64,
    pub total_products: u64,
}

/// One page of a filtered product listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub items: Vec<Product>,
    /// Projection requested by the caller, applied when rendering.
    pub fields: FieldSelection,
    /// `None` when the listing was not paginated.
    pub page: Option<PageRequest>,
}
