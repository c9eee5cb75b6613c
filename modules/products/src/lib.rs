//! Product catalog module: listing, search, statistics and CRUD over products,
//! with category names resolved from a read-only category table.

// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::model;

// === MODULE DEFINITION ===
pub mod config;
pub mod module;
pub use config::ProductsConfig;
pub use module::ProductsModule;

// === INTERNAL MODULES ===
// Exposed for tests and the server binary; only `contract` is a stable API.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
