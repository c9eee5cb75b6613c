//! Axum extractor for list queries.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use query_core::ListQuery;

use super::signal::ErrorSignal;

/// The request's query string parsed into a [`ListQuery`].
///
/// Pair order is kept so repeated reserved keys resolve to the last value.
#[derive(Debug, Clone, Default)]
pub struct ListQueryParams(pub ListQuery);

impl<S> FromRequestParts<S> for ListQueryParams
where
    S: Send + Sync,
{
    type Rejection = ErrorSignal;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|e| ErrorSignal::bad_request("QUERY_MALFORMED", e.body_text()))?;
        let query = ListQuery::from_pairs(pairs)?;
        Ok(Self(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn extract(uri: &str) -> Result<ListQuery, ErrorSignal> {
        let (mut parts, _) = Request::get(uri).body(()).unwrap().into_parts();
        ListQueryParams::from_request_parts(&mut parts, &())
            .await
            .map(|p| p.0)
    }

    #[tokio::test]
    async fn parses_filters_and_reserved_keys() {
        let q = extract("/products?price%5Bgte%5D=5&sort=-price&limit=2&page=1&fields=name")
            .await
            .unwrap();
        assert_eq!(q.filters.len(), 1);
        assert_eq!(q.filters[0].field, "price");
        assert_eq!(q.order.to_param(), "-price");
        assert_eq!(q.limit, Some(2));
        assert!(q.fields.contains("name"));
    }

    #[tokio::test]
    async fn empty_query_string() {
        assert!(extract("/products").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_operator_is_rejected() {
        let err = extract("/products?price%5Bregex%5D=1").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "QUERY_UNSUPPORTED_OPERATOR");
    }
}
