//! # apikit
//!
//! Shared HTTP toolkit for catalog modules: RFC 9457 problem responses, the
//! `ErrorSignal` every failure is reduced to, the centralized error responder,
//! request ids and the default middleware stack.

pub mod api;
pub mod http;

pub use api::problem::{Problem, ProblemResponse, APPLICATION_PROBLEM_JSON};
pub use api::{ApiError, ApiResult, Envelope, ErrorSignal, ListQueryParams};
pub use http::{health_check, with_http_stack, HttpStackConfig};
