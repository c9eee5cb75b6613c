pub mod model;

pub use model::{Category, CategoryStats, NewProduct, Product, ProductPage, ProductPatch};
