use serde::{Deserialize, Serialize};

/// Configuration for the products module (`modules.products` in the app config).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductsConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    /// Page size of `GET /products/popular`.
    #[serde(default = "default_popular_limit")]
    pub popular_limit: u64,
    /// Popular products are priced strictly above this.
    #[serde(default = "default_popular_min_price")]
    pub popular_min_price: f64,
    /// Category names inserted at start-up when missing.
    #[serde(default)]
    pub seed_categories: Vec<String>,
}

impl Default for ProductsConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            popular_limit: default_popular_limit(),
            popular_min_price: default_popular_min_price(),
            seed_categories: Vec::new(),
        }
    }
}

fn default_page_size() -> u64 {
    100
}

fn default_max_page_size() -> u64 {
    1000
}

fn default_popular_limit() -> u64 {
    5
}

fn default_popular_min_price() -> f64 {
    2.0
}
