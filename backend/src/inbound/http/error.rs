//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while allowing Actix
//! handlers to turn domain failures into consistent JSON responses and status
//! codes.

use std::collections::BTreeMap;

use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER, TraceId};
use crate::middleware::RequestPath;

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

/// Message returned in place of internal failure detail.
pub const REDACTED_MESSAGE: &str = "An unexpected error occurred";

/// JSON error envelope returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub timestamp: DateTime<Utc>,
    #[schema(example = 404)]
    pub status: u16,
    #[schema(example = "Not Found")]
    pub error: String,
    #[schema(example = "User not found with id: 7")]
    pub message: String,
    #[schema(example = "/api/users/7")]
    pub path: String,
    /// Per-field messages for validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest | ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reason_for(code: ErrorCode, status: StatusCode) -> String {
    match code {
        ErrorCode::ValidationFailed => "Validation Failed".to_owned(),
        _ => status.canonical_reason().unwrap_or("Error").to_owned(),
    }
}

impl ErrorBody {
    /// Build the envelope for `error` served at `path`.
    pub fn from_error(error: &Error, path: impl Into<String>) -> Self {
        let status = status_for(error.code());
        let internal = matches!(error.code(), ErrorCode::InternalError);
        let trace_id = error
            .trace_id()
            .map(str::to_owned)
            .or_else(|| TraceId::current().map(|id| id.to_string()));
        Self {
            timestamp: Utc::now(),
            status: status.as_u16(),
            error: reason_for(error.code(), status),
            message: if internal {
                REDACTED_MESSAGE.to_owned()
            } else {
                error.message().to_owned()
            },
            path: path.into(),
            errors: (!error.field_errors().is_empty()).then(|| error.field_errors().clone()),
            details: if internal {
                None
            } else {
                error.details().cloned()
            },
            trace_id,
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self.code(), ErrorCode::InternalError) {
            error!(message = %self.message(), "request failed with internal error");
        }
        let body = ErrorBody::from_error(self, RequestPath::current().unwrap_or_default());
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = body.trace_id.as_deref() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        builder.json(body)
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        // Do not leak implementation details to clients.
        error!(error = %err, "actix error promoted to domain error");
        Error::internal("Internal server error")
    }
}

/// Map extractor failures (JSON body, path, query) onto `400` responses.
pub fn extractor_error(err: impl std::fmt::Display, req: &HttpRequest) -> actix_web::Error {
    warn!(error = %err, path = %req.path(), "request could not be decoded");
    Error::invalid_request(err.to_string()).into()
}

#[cfg(test)]
mod tests;
