//! HTTP plumbing shared by every router: request ids, tracing and the
//! middleware stack wrapped around module routes.

pub mod request_id;

use std::time::Duration;

use axum::{middleware::from_fn, response::Json, Router};
use serde_json::{json, Value};
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use crate::api::dispatch::{error_mapping_middleware, panic_to_problem};

#[derive(Clone, Debug)]
pub struct HttpStackConfig {
    /// Per-request timeout; `None` disables it.
    pub timeout: Option<Duration>,
    pub body_limit_bytes: usize,
}

impl Default for HttpStackConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            body_limit_bytes: 1024 * 1024,
        }
    }
}

/// Wrap `router` with the server middleware stack.
///
/// Order, outermost first: SetRequestId, PropagateRequestId, Trace,
/// push_req_id_to_extensions, error mapping, Timeout, BodyLimit, CatchPanic.
pub fn with_http_stack(router: Router, cfg: &HttpStackConfig) -> Router {
    let x_request_id = request_id::header();

    let mut router = router
        .layer(CatchPanicLayer::custom(panic_to_problem))
        .layer(RequestBodyLimitLayer::new(cfg.body_limit_bytes));

    if let Some(timeout) = cfg.timeout {
        router = router.layer(TimeoutLayer::new(timeout));
    }

    router
        .layer(from_fn(error_mapping_middleware))
        .layer(from_fn(request_id::push_req_id_to_extensions))
        .layer(request_id::create_trace_layer())
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
