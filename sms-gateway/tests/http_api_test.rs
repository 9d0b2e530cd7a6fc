//! HTTP-layer integration tests for the `/v1` API (§6): auth, the send/topup
//! happy paths and their documented failure codes.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serial_test::serial;
use tower::ServiceExt;

fn json_request(method: &str, uri: &str, api_key: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::from(serde_json::to_vec(&body).unwrap())).unwrap()
}

#[tokio::test]
#[serial]
async fn send_sms_without_api_key_is_unauthenticated() {
    let pool = common::setup_pool().await;
    let app = common::app(&pool);

    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/sms/send",
            None,
            serde_json::json!({ "phone": "+989123456789", "text": "hi", "type": "normal" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn send_sms_happy_path_returns_202_and_reserves_funds() {
    let pool = common::setup_pool().await;
    let (customer_id, api_key) = common::seed_customer_with_balance_and_key(&pool, 100).await;
    let app = common::app(&pool);

    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/sms/send",
            Some(&api_key),
            serde_json::json!({ "phone": "09123456789", "text": "hello", "type": "normal" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = common::body_json(response).await;
    assert_eq!(json["enqueued"], true);
    assert_eq!(json["type"], "normal");
    assert_eq!(json["customer_id"], customer_id);
    assert!(json["id"].as_str().unwrap().len() == 26, "message id should be a 26-char ULID");

    let (balance, reserved) = common::wallet_row(&pool, customer_id).await;
    assert_eq!(balance, 90);
    assert_eq!(reserved, 10);
}

#[tokio::test]
#[serial]
async fn send_sms_insufficient_funds_returns_402() {
    let pool = common::setup_pool().await;
    let (_, api_key) = common::seed_customer_with_balance_and_key(&pool, 5).await;
    let app = common::app(&pool);

    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/sms/send",
            Some(&api_key),
            serde_json::json!({ "phone": "+989123456789", "text": "hi", "type": "express" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let json = common::body_json(response).await;
    assert_eq!(json["error"], "insufficient_funds");
}

#[tokio::test]
#[serial]
async fn send_sms_unknown_type_returns_400() {
    let pool = common::setup_pool().await;
    let (_, api_key) = common::seed_customer_with_balance_and_key(&pool, 100).await;
    let app = common::app(&pool);

    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/sms/send",
            Some(&api_key),
            serde_json::json!({ "phone": "+989123456789", "text": "hi", "type": "urgent" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn send_sms_empty_type_defaults_to_normal() {
    let pool = common::setup_pool().await;
    let (_, api_key) = common::seed_customer_with_balance_and_key(&pool, 100).await;
    let app = common::app(&pool);

    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/sms/send",
            Some(&api_key),
            serde_json::json!({ "phone": "+989123456789", "text": "hi", "type": "" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = common::body_json(response).await;
    assert_eq!(json["type"], "normal");
}

#[tokio::test]
#[serial]
async fn wallet_topup_is_idempotent_on_request_id() {
    let pool = common::setup_pool().await;
    let (customer_id, api_key) = common::seed_customer_with_key(&pool).await;
    let app = common::app(&pool);

    let body = serde_json::json!({ "amount": 500, "request_id": "req-abc-123" });

    let first = app
        .clone()
        .oneshot(json_request("POST", "/v1/wallet/topup", Some(&api_key), body.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first_json = common::body_json(first).await;
    assert_eq!(first_json["idempotent"], false);

    let second = app
        .oneshot(json_request("POST", "/v1/wallet/topup", Some(&api_key), body))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second_json = common::body_json(second).await;
    assert_eq!(second_json["idempotent"], true);

    let (balance, _) = common::wallet_row(&pool, customer_id).await;
    assert_eq!(balance, 500, "second topup with the same request_id must not double-credit");
}

#[tokio::test]
#[serial]
async fn reports_lists_only_the_authenticated_customers_messages() {
    let pool = common::setup_pool().await;
    let (_, api_key_a) = common::seed_customer_with_balance_and_key(&pool, 100).await;
    let (_, api_key_b) = common::seed_customer_with_balance_and_key(&pool, 100).await;
    let app = common::app(&pool);

    let send_body = serde_json::json!({ "phone": "+989123456789", "text": "hi", "type": "normal" });
    app.clone()
        .oneshot(json_request("POST", "/v1/sms/send", Some(&api_key_a), send_body))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/reports/messages")
                .header("x-api-key", &api_key_b)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = common::body_json(response).await;
    assert_eq!(json["count"], 0, "customer b must not see customer a's messages");
}
