use apikit::{ApiError, ErrorSignal};

use crate::domain::error::{DomainError, ProductOp};

/// Map a domain error to the signal rendered by the centralized responder.
impl From<DomainError> for ErrorSignal {
    fn from(e: DomainError) -> Self {
        match &e {
            DomainError::CategoryNameNotFound { .. } => {
                ErrorSignal::bad_request("CATEGORY_NOT_FOUND", e.to_string())
            }
            // Single-product reads report a missing id as a bad request.
            DomainError::ProductNotFound {
                op: ProductOp::Get, ..
            } => ErrorSignal::bad_request("PRODUCT_NOT_FOUND", e.to_string()),
            DomainError::ProductNotFound { .. } => {
                ErrorSignal::not_found("PRODUCT_NOT_FOUND", e.to_string())
            }
            DomainError::NameConflict { .. } => {
                ErrorSignal::conflict("PRODUCT_NAME_CONFLICT", e.to_string())
            }
            DomainError::InvalidCategory { .. } => {
                ErrorSignal::bad_request("CATEGORY_INVALID", e.to_string())
            }
            DomainError::Validation { .. } => {
                ErrorSignal::bad_request("PRODUCT_VALIDATION", e.to_string())
            }
            DomainError::NotSaved => ErrorSignal::bad_request("PRODUCT_NOT_SAVED", e.to_string()),
            DomainError::NotUpdated => ErrorSignal::not_found("PRODUCT_NOT_UPDATED", e.to_string()),
            DomainError::NotDeleted => {
                ErrorSignal::bad_request("PRODUCT_NOT_DELETED", e.to_string())
            }
            DomainError::Query(_) => ErrorSignal::bad_request("QUERY_INVALID_VALUE", e.to_string()),
            DomainError::Database { .. } => {
                // Log the internal error details but don't expose them to the client
                tracing::error!(error = ?e, "Database error occurred");
                ErrorSignal::internal()
            }
        }
    }
}

impl From<DomainError> for ApiError<DomainError> {
    fn from(e: DomainError) -> Self {
        ApiError::from_domain(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apikit_db::{FieldKind, QueryBuildError};
    use axum::http::StatusCode;

    fn signal(e: DomainError) -> ErrorSignal {
        e.into()
    }

    #[test]
    fn not_found_status_depends_on_operation() {
        let s = signal(DomainError::product_not_found("x", ProductOp::Get));
        assert_eq!(s.status(), StatusCode::BAD_REQUEST);
        assert_eq!(s.message(), "The product id does not exists.");

        let s = signal(DomainError::product_not_found("x", ProductOp::Update));
        assert_eq!(s.status(), StatusCode::NOT_FOUND);

        let s = signal(DomainError::product_not_found("x", ProductOp::Delete));
        assert_eq!(s.status(), StatusCode::NOT_FOUND);
        assert_eq!(s.message(), "The product does not exists.");
    }

    #[test]
    fn client_errors_keep_their_message() {
        let s = signal(DomainError::name_conflict("Hammer"));
        assert_eq!(s.status(), StatusCode::CONFLICT);
        assert_eq!(s.message(), "A product with the name 'Hammer' already exists.");

        let s = signal(DomainError::invalid_category(Some("nope".into())));
        assert_eq!(s.status(), StatusCode::BAD_REQUEST);
        assert_eq!(s.message(), "The category does not exists.");

        let s = signal(DomainError::NotUpdated);
        assert_eq!(s.status(), StatusCode::NOT_FOUND);

        let s = signal(DomainError::Query(QueryBuildError::InvalidValue {
            field: "price".into(),
            kind: FieldKind::F64,
            value: "cheap".into(),
        }));
        assert_eq!(s.status(), StatusCode::BAD_REQUEST);
        assert_eq!(s.code(), "QUERY_INVALID_VALUE");
    }

    #[test]
    fn database_errors_are_hidden() {
        let s = signal(DomainError::database("disk I/O error"));
        assert_eq!(s.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!s.message().contains("disk"));
    }
}
