//! Error signal: the one value every failing operation hands to the responder.

use std::borrow::Cow;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::problem::{Problem, ProblemResponse};

/// An HTTP failure with a client-facing message and a machine-readable code.
///
/// Immutable once built; the centralized responder renders it as a problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSignal {
    status: StatusCode,
    code: Cow<'static, str>,
    message: String,
}

impl ErrorSignal {
    pub fn new(
        status: StatusCode,
        code: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    /// 500 with a generic message; the cause belongs in the logs, not the body.
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_problem(self) -> Problem {
        Problem::from_status(self.status, self.message).with_code(self.code)
    }
}

impl fmt::Display for ErrorSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.status.as_u16(), self.code, self.message)
    }
}

impl std::error::Error for ErrorSignal {}

impl From<ErrorSignal> for ProblemResponse {
    fn from(s: ErrorSignal) -> Self {
        ProblemResponse(s.into_problem())
    }
}

impl IntoResponse for ErrorSignal {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), code = %self.code, "{}", self.message);
        } else {
            tracing::warn!(status = self.status.as_u16(), code = %self.code, "{}", self.message);
        }
        ProblemResponse::from(self).into_response()
    }
}

/// Query parsing failures are client errors.
impl From<&query_core::Error> for ErrorSignal {
    fn from(e: &query_core::Error) -> Self {
        let code = match e {
            query_core::Error::UnsupportedOperator { .. } => "QUERY_UNSUPPORTED_OPERATOR",
            query_core::Error::MalformedKey(_) => "QUERY_MALFORMED_KEY",
            query_core::Error::TooLong(_)
            | query_core::Error::TooManySortFields
            | query_core::Error::TooManyFilters => "QUERY_TOO_COMPLEX",
        };
        Self::bad_request(code, e.to_string())
    }
}

impl From<query_core::Error> for ErrorSignal {
    fn from(e: query_core::Error) -> Self {
        Self::from(&e)
    }
}
