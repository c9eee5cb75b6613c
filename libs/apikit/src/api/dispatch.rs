//! Centralized error responder for Axum.
//!
//! Every error response leaving the router is an RFC 9457 problem carrying the
//! request path and id: problems rendered by handlers get stamped, anything else
//! (extractor rejections, unknown routes, timeouts) is rewritten, and panics
//! become 500 problems.

use std::any::Any;

use axum::{
    body::Body,
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::problem::{Problem, ProblemResponse, APPLICATION_PROBLEM_JSON};
use crate::http::request_id::{self, XRequestId};

/// Largest plain-text error body that is carried over as the problem detail.
const MAX_DETAIL_BYTES: usize = 4 * 1024;

pub async fn error_mapping_middleware(request: Request, next: Next) -> Response {
    let instance = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<XRequestId>()
        .map(|r| r.0.clone())
        .or_else(|| {
            request
                .headers()
                .get(request_id::header())
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        });

    let response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let rendered = response.extensions().get::<Problem>().cloned();
    let mut problem = match rendered {
        Some(p) => p,
        None if is_problem_response(&response) => return response,
        None => problem_from_plain_response(response).await,
    };

    if problem.instance.is_empty() {
        problem.instance = instance;
    }
    if problem.request_id.is_none() {
        problem.request_id = request_id;
    }
    ProblemResponse(problem).into_response()
}

fn is_problem_response(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains(APPLICATION_PROBLEM_JSON))
        .unwrap_or(false)
}

fn fallback_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "ROUTE_NOT_FOUND",
        StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
        StatusCode::REQUEST_TIMEOUT => "REQUEST_TIMEOUT",
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => "INVALID_REQUEST",
        s if s.is_server_error() => "INTERNAL_ERROR",
        _ => "HTTP_ERROR",
    }
}

/// Build a problem from a non-problem error response. Short plain-text bodies
/// (axum rejections) become the detail; server error bodies are never echoed.
async fn problem_from_plain_response(response: Response) -> Problem {
    let status = response.status();
    let is_text = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("text/plain"))
        .unwrap_or(false);

    let detail = if is_text && status.is_client_error() {
        axum::body::to_bytes(response.into_body(), MAX_DETAIL_BYTES)
            .await
            .ok()
            .map(|b| String::from_utf8_lossy(&b).trim().to_string())
            .filter(|s| !s.is_empty())
    } else {
        None
    };

    let detail = detail.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });

    tracing::debug!(status = status.as_u16(), %detail, "normalizing error response into problem");
    Problem::from_status(status, detail).with_code(fallback_code(status))
}

/// Response for a handler panic; plug into `CatchPanicLayer::custom`.
pub fn panic_to_problem(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let msg = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = %msg, "handler panicked");

    ProblemResponse(
        Problem::from_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            "An internal error occurred",
        )
        .with_code("INTERNAL_ERROR"),
    )
    .into_response()
}
