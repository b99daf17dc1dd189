//! Placing, reading and fulfilling orders against `PostgreSQL`.
//!
//! Payments run through the offline gateway, so no Stripe key is needed.
//!
//! Run with: cargo test -p bluejay-integration-tests -- --ignored

use axum::http::{Method, StatusCode};
use bluejay_integration_tests::{
    Session, TestResponse, db_state, request, send, signup, with_session,
};
use bluejay_server::AppState;
use serde_json::{Value, json};
use sqlx::PgPool;

/// A chef with two meal items and a customer who orders them.
async fn place_order(state: &AppState) -> (Session, TestResponse) {
    let (chef, _) = signup(state, "Kenji", "kenji@bluejay.test", true).await;
    let (customer, _) = signup(state, "Sam", "sam@bluejay.test", false).await;

    let mut ids = Vec::new();
    for (name, price) in [("Tonkotsu Ramen", "16.00"), ("Gyoza", "7.25")] {
        let body = json!({ "name": name, "price": price });
        let resp = send(
            state,
            with_session(request(Method::POST, "/meal_items", Some(&body)), &chef),
        )
        .await;
        assert_eq!(resp.status, StatusCode::CREATED);
        ids.push(resp.body["id"].clone());
    }

    let body = json!({
        "items": [
            { "mealItemId": ids[0], "quantity": 2 },
            { "mealItemId": ids[1], "quantity": 1 },
        ]
    });
    let resp = send(
        state,
        with_session(request(Method::POST, "/orders", Some(&body)), &customer),
    )
    .await;
    (customer, resp)
}

async fn fulfill(state: &AppState, session: &Session, id: &Value, secret: &str) -> TestResponse {
    let body = json!({ "clientSecret": secret });
    send(
        state,
        with_session(
            request(Method::PUT, &format!("/order/{id}"), Some(&body)),
            session,
        ),
    )
    .await
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_place_order(pool: PgPool) {
    let state = db_state(pool);
    let (_, resp) = place_order(&state).await;

    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["total"], json!("39.25"));
    assert_eq!(resp.body["isFulfilled"], json!(false));
    assert_eq!(resp.body["items"].as_array().map(Vec::len), Some(2));
    let secret = resp.body["clientSecret"].as_str().expect("clientSecret");
    assert!(secret.contains("_secret_"));
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_order_detail_matches_stored_row(pool: PgPool) {
    let state = db_state(pool.clone());
    let (customer, placed) = place_order(&state).await;
    let id = placed.body["id"].clone();

    let resp = send(
        &state,
        with_session(request(Method::GET, &format!("/order/{id}"), None), &customer),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);

    let (user_id, is_fulfilled): (i32, bool) =
        sqlx::query_as("SELECT user_id, is_fulfilled FROM orders WHERE id = $1")
            .bind(id.as_i64().and_then(|v| i32::try_from(v).ok()))
            .fetch_one(&pool)
            .await
            .expect("stored order");

    assert_eq!(resp.body["id"], id);
    assert_eq!(resp.body["userId"], json!(user_id));
    assert_eq!(resp.body["isFulfilled"], json!(is_fulfilled));
    assert_eq!(resp.body["total"], placed.body["total"]);
    assert!(resp.body.get("clientSecret").is_none());
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_missing_order_is_404(pool: PgPool) {
    let state = db_state(pool);
    let (session, _) = signup(&state, "Sam", "sam@bluejay.test", false).await;

    let resp = send(
        &state,
        with_session(request(Method::GET, "/order/9999", None), &session),
    )
    .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_fulfill_once(pool: PgPool) {
    let state = db_state(pool);
    let (customer, placed) = place_order(&state).await;
    let id = placed.body["id"].clone();
    let secret = placed.body["clientSecret"].as_str().expect("clientSecret");

    let resp = fulfill(&state, &customer, &id, secret).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["message"], json!("order created"));

    let resp = fulfill(&state, &customer, &id, secret).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);

    let resp = send(
        &state,
        with_session(request(Method::GET, &format!("/order/{id}"), None), &customer),
    )
    .await;
    assert_eq!(resp.body["isFulfilled"], json!(true));
    assert!(resp.body["fulfilledAt"].is_string());
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_fulfill_with_wrong_secret_is_403(pool: PgPool) {
    let state = db_state(pool);
    let (customer, placed) = place_order(&state).await;
    let id = placed.body["id"].clone();

    let resp = fulfill(&state, &customer, &id, "pi_other_secret_nope").await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = send(
        &state,
        with_session(request(Method::GET, &format!("/order/{id}"), None), &customer),
    )
    .await;
    assert_eq!(resp.body["isFulfilled"], json!(false));
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_invalid_orders_rejected(pool: PgPool) {
    let state = db_state(pool);
    let (session, _) = signup(&state, "Sam", "sam@bluejay.test", false).await;

    for body in [
        json!({ "items": [] }),
        json!({ "items": [{ "mealItemId": 4242, "quantity": 1 }] }),
        json!({ "items": [{ "mealItemId": 1, "quantity": -3 }] }),
    ] {
        let resp = send(
            &state,
            with_session(request(Method::POST, "/orders", Some(&body)), &session),
        )
        .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{body}");
    }
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_orders_lists_only_own(pool: PgPool) {
    let state = db_state(pool);
    let (customer, _) = place_order(&state).await;
    let (other, _) = signup(&state, "Ana", "ana@bluejay.test", false).await;

    let resp = send(&state, with_session(request(Method::GET, "/orders", None), &customer)).await;
    assert_eq!(resp.body.as_array().map(Vec::len), Some(1));

    let resp = send(&state, with_session(request(Method::GET, "/orders", None), &other)).await;
    assert_eq!(resp.body.as_array().map(Vec::len), Some(0));
}
