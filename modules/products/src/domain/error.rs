use apikit_db::QueryBuildError;
use thiserror::Error;

/// Operation that looked a product up by id; decides the not-found wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductOp {
    Get,
    Update,
    Delete,
}

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("The category name '{name}' does not exists.")]
    CategoryNameNotFound { name: String },

    #[error("{}", product_not_found_message(.op))]
    ProductNotFound { id: String, op: ProductOp },

    #[error("A product with the name '{name}' already exists.")]
    NameConflict { name: String },

    #[error("The category does not exists.")]
    InvalidCategory { category_id: Option<String> },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Could not save the product")]
    NotSaved,

    #[error("The product could not be updated.")]
    NotUpdated,

    #[error("Could not delete the product.")]
    NotDeleted,

    #[error(transparent)]
    Query(#[from] QueryBuildError),

    #[error("Database error: {message}")]
    Database { message: String },
}

fn product_not_found_message(op: &ProductOp) -> &'static str {
    match op {
        ProductOp::Get => "The product id does not exists.",
        ProductOp::Update => "The product does not exists",
        ProductOp::Delete => "The product does not exists.",
    }
}

impl DomainError {
    pub fn category_name_not_found(name: impl Into<String>) -> Self {
        Self::CategoryNameNotFound { name: name.into() }
    }

    pub fn product_not_found(id: impl Into<String>, op: ProductOp) -> Self {
        Self::ProductNotFound { id: id.into(), op }
    }

    pub fn name_conflict(name: impl Into<String>) -> Self {
        Self::NameConflict { name: name.into() }
    }

    pub fn invalid_category(category_id: Option<String>) -> Self {
        Self::InvalidCategory { category_id }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_wording_depends_on_operation() {
        let get = DomainError::product_not_found("x", ProductOp::Get);
        let upd = DomainError::product_not_found("x", ProductOp::Update);
        let del = DomainError::product_not_found("x", ProductOp::Delete);
        assert_eq!(get.to_string(), "The product id does not exists.");
        assert_eq!(upd.to_string(), "The product does not exists");
        assert_eq!(del.to_string(), "The product does not exists.");
    }

    #[test]
    fn messages_name_the_offender() {
        assert_eq!(
            DomainError::name_conflict("Hammer").to_string(),
            "A product with the name 'Hammer' already exists."
        );
        assert_eq!(
            DomainError::category_name_not_found("toys").to_string(),
            "The category name 'toys' does not exists."
        );
    }
}
