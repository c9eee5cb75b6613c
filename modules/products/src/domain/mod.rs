pub mod enrich;
pub mod error;
pub mod repo;
pub mod service;
