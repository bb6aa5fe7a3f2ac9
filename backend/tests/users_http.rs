//! HTTP scenarios for the user resource over the in-memory store.

use actix_web::http::StatusCode;
use actix_web::test;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

mod support;

use support::{Harness, user_payload};

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

macro_rules! send {
    ($app:expr, $req:expr) => {{
        let res = test::call_service(&$app, $req.to_request()).await;
        let status = res.status();
        let bytes = test::read_body(res).await;
        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        (status, body)
    }};
}

fn id_of(body: &Value) -> i64 {
    body["id"].as_i64().expect("id assigned")
}

#[rstest]
#[actix_web::test]
async fn create_returns_created_without_password(harness: Harness) {
    let app = test::init_service(harness.app()).await;

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/users")
            .set_json(user_payload("ada", 2, 1))
    );

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].is_i64());
    assert_eq!(body["username"], "ada");
    assert!(body.get("password").is_none());
}

#[rstest]
#[actix_web::test]
async fn selected_collection_is_loaded_and_others_stay_empty(harness: Harness) {
    let app = test::init_service(harness.app()).await;
    let (_, created) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/users")
            .set_json(user_payload("ada", 2, 0))
    );
    let id = id_of(&created);

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/users/{id}?attributes=addresses"))
    );

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["addresses"].as_array().map(Vec::len), Some(2));
    assert!(body["contacts"].as_array().is_none_or(Vec::is_empty));
}

#[rstest]
#[actix_web::test]
async fn plain_read_returns_scalars_only(harness: Harness) {
    let app = test::init_service(harness.app()).await;
    let (_, created) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/users")
            .set_json(user_payload("grace", 1, 1))
    );
    let id = id_of(&created);

    let (status, body) = send!(app, test::TestRequest::get().uri(&format!("/api/users/{id}")));

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["firstName"], "Ada");
    assert_eq!(body["addresses"], json!([]));
    assert_eq!(body["contacts"], json!([]));
    assert!(body["audit"].is_null());
}

#[rstest]
#[actix_web::test]
async fn audit_is_returned_on_request(harness: Harness) {
    let app = test::init_service(harness.app()).await;
    let (_, created) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/users")
            .set_json(user_payload("alan", 0, 0))
    );
    let id = id_of(&created);

    let (_, body) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/users/{id}?withAudit=true"))
    );

    assert_eq!(body["audit"]["createdBy"], "tester");
    assert!(body["audit"]["createdDate"].is_string());
}

#[rstest]
#[actix_web::test]
async fn unknown_attribute_is_rejected_before_loading(harness: Harness) {
    let app = test::init_service(harness.app()).await;

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri("/api/users/1?attributes=addresses.bogusField")
    );

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"].as_str().is_some_and(|m| m.contains("bogusField")),
        "message should name the bad segment: {body}"
    );
    assert_eq!(body["path"], "/api/users/1");
    assert_eq!(harness.users.calls(), 0);
}

#[rstest]
#[actix_web::test]
async fn list_selects_collections_for_every_user(harness: Harness) {
    let app = test::init_service(harness.app()).await;
    for (name, addresses) in [("ada", 1), ("grace", 3)] {
        let (status, _) = send!(
            app,
            test::TestRequest::post()
                .uri("/api/users")
                .set_json(user_payload(name, addresses, 0))
        );
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri("/api/users?attributes=addresses")
    );

    assert_eq!(status, StatusCode::OK);
    let counts: Vec<usize> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|user| user["addresses"].as_array().map_or(0, Vec::len))
        .collect();
    assert_eq!(counts, vec![1, 3]);
}

#[rstest]
#[actix_web::test]
async fn invalid_payload_reports_field_errors(harness: Harness) {
    let app = test::init_service(harness.app()).await;

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/users")
            .set_json(json!({ "firstName": "Nobody" }))
    );

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Failed");
    assert!(body["errors"]["username"].is_string());
    assert!(body["errors"]["password"].is_string());
    assert_eq!(harness.users.calls(), 0);
}

#[rstest]
#[actix_web::test]
async fn duplicate_username_conflicts(harness: Harness) {
    let app = test::init_service(harness.app()).await;
    let (first, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/users")
            .set_json(user_payload("ada", 0, 0))
    );
    assert_eq!(first, StatusCode::CREATED);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/users")
            .set_json(user_payload("ada", 0, 0))
    );

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");
}

#[rstest]
#[actix_web::test]
async fn update_patches_scalars(harness: Harness) {
    let app = test::init_service(harness.app()).await;
    let (_, created) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/users")
            .set_json(user_payload("ada", 1, 0))
    );
    let id = id_of(&created);

    let (status, body) = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/users/{id}"))
            .set_json(json!({ "lastName": "Byron" }))
    );

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lastName"], "Byron");
    assert_eq!(body["firstName"], "Ada");

    let (_, reread) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/users/{id}?attributes=addresses"))
    );
    assert_eq!(reread["lastName"], "Byron");
    assert_eq!(reread["addresses"].as_array().map(Vec::len), Some(1));
}

#[rstest]
#[actix_web::test]
async fn delete_removes_user_and_children(harness: Harness) {
    let app = test::init_service(harness.app()).await;
    let (_, created) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/users")
            .set_json(user_payload("ada", 2, 1))
    );
    let id = id_of(&created);

    let (status, body) = send!(app, test::TestRequest::delete().uri(&format!("/api/users/{id}")));
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (missing, error) = send!(app, test::TestRequest::get().uri(&format!("/api/users/{id}")));
    assert_eq!(missing, StatusCode::NOT_FOUND);
    assert_eq!(error["error"], "Not Found");

    let (_, addresses) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/addresses/user/{id}"))
    );
    assert_eq!(addresses, json!([]));
}

#[rstest]
#[case::get(test::TestRequest::get().uri("/api/users/404"))]
#[case::put(test::TestRequest::put().uri("/api/users/404").set_json(json!({ "lastName": "X" })))]
#[case::delete(test::TestRequest::delete().uri("/api/users/404"))]
#[actix_web::test]
async fn missing_user_is_not_found(harness: Harness, #[case] request: test::TestRequest) {
    let app = test::init_service(harness.app()).await;

    let (status, body) = send!(app, request);

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[rstest]
#[actix_web::test]
async fn malformed_path_id_is_a_bad_request(harness: Harness) {
    let app = test::init_service(harness.app()).await;

    let (status, body) = send!(app, test::TestRequest::get().uri("/api/users/abc"));

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
}
