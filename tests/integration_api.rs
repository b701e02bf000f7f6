//! API Integration Tests
//!
//! Drive the HTTP surface end to end: authentication middleware, route
//! handlers, error codes and the engine behind them.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    middleware, Router,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use moneta::api::{self, AppState};

mod common;

use common::{seed_api_key, seed_user, setup_test_db, test_converter, SELF_GRANTS};

fn test_app(state: AppState) -> Router {
    api::create_router()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::middleware::auth_middleware,
        ))
        .with_state(state)
}

async fn response_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn json_request(method: &str, uri: &str, api_key: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("X-API-Key", api_key)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str, api_key: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("X-API-Key", api_key)
        .body(Body::empty())
        .unwrap()
}

fn funds_of(json: &Value) -> Decimal {
    json["funds"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_missing_api_key_rejected() {
    let pool = setup_test_db().await;
    let app = test_app(AppState::new(pool, test_converter()));

    let req = Request::builder()
        .method("GET")
        .uri("/accounts/1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = response_json(response).await;
    assert_eq!(json["error_code"], "missing_api_key");
}

#[tokio::test]
async fn test_invalid_api_key_rejected() {
    let pool = setup_test_db().await;
    let app = test_app(AppState::new(pool, test_converter()));

    let response = app
        .oneshot(get_request("/accounts/1", "no_such_key"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = response_json(response).await;
    assert_eq!(json["error_code"], "invalid_api_key");
}

#[tokio::test]
async fn test_money_movement_e2e() {
    let pool = setup_test_db().await;

    let alice = seed_user(&pool, "api_alice", SELF_GRANTS).await;
    let bob = seed_user(&pool, "api_bob", SELF_GRANTS).await;
    let alice_key = format!("api_key_alice_{alice}");
    let bob_key = format!("api_key_bob_{bob}");
    seed_api_key(&pool, alice, &alice_key).await;
    seed_api_key(&pool, bob, &bob_key).await;

    let app = test_app(AppState::new(pool.clone(), test_converter()));

    // Alice opens a USD account.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/accounts",
            &alice_key,
            json!({"user_id": alice, "funds": "0", "currency": "USD"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let alice_account = response_json(response).await["id"].as_i64().unwrap();

    // Bob opens a EUR account.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/accounts",
            &bob_key,
            json!({"user_id": bob, "funds": "50", "currency": "EUR"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bob_account = response_json(response).await["id"].as_i64().unwrap();

    // Replenish Alice with 100 USD.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/replenishments",
            &alice_key,
            json!({"account_id": alice_account, "amount": "100.00", "currency": "USD"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Transfer 10 USD to Bob's EUR account (rate 0.9).
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/transfers",
            &alice_key,
            json!({
                "from_account_id": alice_account,
                "to_account_id": bob_account,
                "amount": "10.00"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let transfer = response_json(response).await;
    assert_eq!(transfer["currency"], "USD");
    assert_eq!(transfer["to_user_id"].as_i64().unwrap(), bob);

    // Balances through each owner's own key.
    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/accounts/{alice_account}"),
            &alice_key,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(funds_of(&response_json(response).await), dec!(90));

    let response = app
        .clone()
        .oneshot(get_request(&format!("/accounts/{bob_account}"), &bob_key))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(funds_of(&response_json(response).await), dec!(59));

    // Bob sees the incoming transfer in his history.
    let response = app
        .clone()
        .oneshot(get_request(&format!("/users/{bob}/transfers"), &bob_key))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let history = response_json(response).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_insufficient_withdrawal_reports_stable_code() {
    let pool = setup_test_db().await;

    let user_id = seed_user(&pool, "api_short", SELF_GRANTS).await;
    let key = format!("api_key_short_{user_id}");
    seed_api_key(&pool, user_id, &key).await;

    let app = test_app(AppState::new(pool.clone(), test_converter()));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/accounts",
            &key,
            json!({"user_id": user_id, "funds": "50", "currency": "USD"}),
        ))
        .await
        .unwrap();
    let account_id = response_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/withdrawals",
            &key,
            json!({"account_id": account_id, "amount": "80.00", "currency": "USD"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["error_code"], "insufficient_funds");

    // Nothing moved.
    let response = app
        .clone()
        .oneshot(get_request(&format!("/accounts/{account_id}"), &key))
        .await
        .unwrap();
    assert_eq!(funds_of(&response_json(response).await), dec!(50));
}

#[tokio::test]
async fn test_foreign_account_is_forbidden() {
    let pool = setup_test_db().await;

    let owner = seed_user(&pool, "api_owner", SELF_GRANTS).await;
    let other = seed_user(&pool, "api_other", SELF_GRANTS).await;
    let owner_key = format!("api_key_owner_{owner}");
    let other_key = format!("api_key_other_{other}");
    seed_api_key(&pool, owner, &owner_key).await;
    seed_api_key(&pool, other, &other_key).await;

    let app = test_app(AppState::new(pool.clone(), test_converter()));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/accounts",
            &owner_key,
            json!({"user_id": owner, "funds": "10", "currency": "USD"}),
        ))
        .await
        .unwrap();
    let account_id = response_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(get_request(&format!("/accounts/{account_id}"), &other_key))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = response_json(response).await;
    assert_eq!(json["error_code"], "access_denied");
}

#[tokio::test]
async fn test_malformed_amount_is_rejected_before_processing() {
    let pool = setup_test_db().await;

    let user_id = seed_user(&pool, "api_malformed", SELF_GRANTS).await;
    let key = format!("api_key_malformed_{user_id}");
    seed_api_key(&pool, user_id, &key).await;

    let app = test_app(AppState::new(pool.clone(), test_converter()));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/accounts",
            &key,
            json!({"user_id": user_id, "funds": "10", "currency": "USD"}),
        ))
        .await
        .unwrap();
    let account_id = response_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/withdrawals",
            &key,
            json!({"account_id": account_id, "amount": "-5.00", "currency": "USD"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["error_code"], "invalid_amount");
}
