//! Handler-facing API surface: problem rendering, the error signal, the
//! `?`-friendly handler error, the centralized responder and the list query
//! extractor.

pub mod dispatch;
pub mod error;
pub mod problem;
pub mod query;
pub mod response;
pub mod signal;

pub use dispatch::{error_mapping_middleware, panic_to_problem};
pub use error::{ApiError, ApiResult};
pub use query::ListQueryParams;
pub use response::Envelope;
pub use signal::ErrorSignal;
