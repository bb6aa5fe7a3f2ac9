//! Tests for HTTP error mapping.

use std::collections::BTreeMap;

use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::Error;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn internal_error_case() -> Error {
    Error::internal("boom")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"secret": "x"}))
}

#[fixture]
fn field_errors() -> BTreeMap<String, String> {
    BTreeMap::from([("username".to_owned(), "username is required".to_owned())])
}

async fn response_body(error: &Error, expected_status: StatusCode) -> ErrorBody {
    let response = ResponseError::error_response(error);
    assert_eq!(response.status(), expected_status);
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    serde_json::from_slice(&bytes).expect("error JSON deserialises")
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::validation(BTreeMap::new()), StatusCode::BAD_REQUEST)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("taken"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] err: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&err), status);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted(internal_error_case: Error) {
    let response = ResponseError::error_response(&internal_error_case);
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    assert_eq!(header.as_deref(), Some(TRACE_ID));

    let body = response_body(&internal_error_case, StatusCode::INTERNAL_SERVER_ERROR).await;
    assert_eq!(body.status, 500);
    assert_eq!(body.error, "Internal Server Error");
    assert_eq!(body.message, REDACTED_MESSAGE);
    assert!(body.details.is_none());
    assert_eq!(body.trace_id.as_deref(), Some(TRACE_ID));
}

#[rstest]
#[actix_web::test]
async fn validation_errors_carry_field_messages(field_errors: BTreeMap<String, String>) {
    let error = Error::validation(field_errors.clone());

    let body = response_body(&error, StatusCode::BAD_REQUEST).await;

    assert_eq!(body.error, "Validation Failed");
    assert_eq!(body.errors, Some(field_errors));
}

#[rstest]
#[actix_web::test]
async fn not_found_keeps_message_and_omits_optional_fields() {
    let error = Error::not_found("User not found with id: 7");

    let body = response_body(&error, StatusCode::NOT_FOUND).await;

    assert_eq!(body.error, "Not Found");
    assert_eq!(body.message, "User not found with id: 7");
    assert!(body.errors.is_none());
    assert!(body.trace_id.is_none());
    assert_eq!(body.path, "");
}

#[rstest]
#[tokio::test]
async fn path_and_trace_id_come_from_request_scope() {
    let trace_id = TraceId::generate();
    let body = TraceId::scope(
        trace_id,
        RequestPath::scope("/api/users/7", async {
            ErrorBody::from_error(
                &Error::not_found("missing"),
                RequestPath::current().unwrap_or_default(),
            )
        }),
    )
    .await;

    assert_eq!(body.path, "/api/users/7");
    assert_eq!(body.trace_id, Some(trace_id.to_string()));
}

#[test]
fn from_actix_error_is_redacted_internal_error() {
    let actix_err = actix_web::error::ErrorBadRequest("boom");
    let err: Error = actix_err.into();

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
    assert_eq!(err.details(), None);
}
