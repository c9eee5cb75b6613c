use axum::response::{IntoResponse, Response};

use super::signal::ErrorSignal;

/// Unified API error type at the handler boundary.
///
/// Handlers return `ApiResult<T, DomainError>` and use `?`; every failure is
/// turned into an [`ErrorSignal`] and rendered in one place.
#[derive(thiserror::Error, Debug)]
pub enum ApiError<D> {
    /// Malformed list query (bad operator token, oversized sort, ...)
    #[error(transparent)]
    Query(query_core::Error),

    /// Domain business logic errors
    #[error(transparent)]
    Domain(D),
}

impl<D> ApiError<D> {
    pub fn from_domain(e: D) -> Self {
        ApiError::Domain(e)
    }
}

impl<D> From<query_core::Error> for ApiError<D> {
    fn from(e: query_core::Error) -> Self {
        ApiError::Query(e)
    }
}

impl<D> ApiError<D>
where
    D: Into<ErrorSignal>,
{
    pub fn into_signal(self) -> ErrorSignal {
        match self {
            ApiError::Query(e) => e.into(),
            ApiError::Domain(d) => d.into(),
        }
    }
}

impl<D> IntoResponse for ApiError<D>
where
    D: Into<ErrorSignal>,
{
    fn into_response(self) -> Response {
        self.into_signal().into_response()
    }
}

/// Generic Result type for API handlers.
pub type ApiResult<T, D> = Result<T, ApiError<D>>;
