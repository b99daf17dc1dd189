//! Chefs and meal items against `PostgreSQL`.
//!
//! Requires `DATABASE_URL` pointing at a server where sqlx may create
//! throwaway databases.
//!
//! Run with: cargo test -p bluejay-integration-tests -- --ignored

use axum::http::{Method, StatusCode};
use bluejay_integration_tests::{db_state, request, send, signup, with_session};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_chefs_lists_only_chefs(pool: PgPool) {
    let state = db_state(pool);
    signup(&state, "Marta", "marta@bluejay.test", true).await;
    signup(&state, "Sam", "sam@bluejay.test", false).await;

    let resp = send(&state, request(Method::GET, "/chefs", None)).await;
    assert_eq!(resp.status, StatusCode::OK);

    let chefs = resp.body.as_array().expect("array");
    assert_eq!(chefs.len(), 1);
    assert_eq!(chefs[0]["email"], json!("marta@bluejay.test"));
    assert_eq!(chefs[0]["isChef"], json!(true));
    assert_eq!(chefs[0]["id"], chefs[0]["userId"]);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_duplicate_signup_is_409(pool: PgPool) {
    let state = db_state(pool);
    signup(&state, "Marta", "marta@bluejay.test", true).await;

    let body = json!({
        "name": "Other",
        "email": "MARTA@bluejay.test",
        "password": "another-password",
    });
    let resp = send(&state, request(Method::POST, "/users", Some(&body))).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_login_and_current_user(pool: PgPool) {
    let state = db_state(pool);
    signup(&state, "Sam", "sam@bluejay.test", false).await;

    let bad = json!({ "email": "sam@bluejay.test", "password": "wrong-password" });
    let resp = send(&state, request(Method::POST, "/users/login", Some(&bad))).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let good = json!({ "email": "sam@bluejay.test", "password": "correct-horse-battery" });
    let resp = send(&state, request(Method::POST, "/users/login", Some(&good))).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.cookie("refresh_token_cookie").is_some());

    let mut session = bluejay_integration_tests::Session::default();
    session.update(&resp);

    let resp = send(&state, with_session(request(Method::GET, "/users", None), &session)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["name"], json!("Sam"));
    assert_eq!(resp.body["isChef"], json!(false));

    // Refresh issues a new access cookie for the same user
    let resp = send(
        &state,
        with_session(request(Method::GET, "/users/login", None), &session),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.cookie("access_token_cookie").is_some());
    assert!(resp.cookie("refresh_token_cookie").is_none());
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_only_chefs_create_meal_items(pool: PgPool) {
    let state = db_state(pool);
    let (chef, chef_body) = signup(&state, "Marta", "marta@bluejay.test", true).await;
    let (customer, _) = signup(&state, "Sam", "sam@bluejay.test", false).await;

    let item = json!({ "name": "Jollof Rice", "price": "14.50" });

    let resp = send(
        &state,
        with_session(request(Method::POST, "/meal_items", Some(&item)), &customer),
    )
    .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = send(
        &state,
        with_session(request(Method::POST, "/meal_items", Some(&item)), &chef),
    )
    .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["price"], json!("14.50"));
    assert_eq!(resp.body["chefId"], chef_body["id"]);

    let uri = format!("/meal_items?chefId={}", chef_body["id"]);
    let resp = send(&state, request(Method::GET, &uri, None)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body.as_array().map(Vec::len), Some(1));
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_chef_profile_update_round_trips(pool: PgPool) {
    let state = db_state(pool);
    let (session, _) = signup(&state, "Marta", "marta@bluejay.test", true).await;

    let body = json!({
        "address": "12 Harbour Rd",
        "aboutMe": "Cooking since I was nine",
        "chefProfile": "West African home cooking",
        "chefCuisine": "Nigerian",
        "cuisines": ["Nigerian", "nigerian", "Ghanaian"],
        "profileImage": "https://cdn.bluejay.test/marta.png",
        "generalLocation": "Mission District",
        "latitude": 37.76,
        "longitude": -122.42,
    });
    let resp = send(
        &state,
        with_session(request(Method::PUT, "/users", Some(&body)), &session),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
    assert_eq!(resp.body["cuisines"], json!(["Nigerian", "Ghanaian"]));

    // A later partial edit keeps the other fields.
    let body = json!({ "aboutMe": "" });
    let resp = send(
        &state,
        with_session(request(Method::PUT, "/users", Some(&body)), &session),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["aboutMe"], serde_json::Value::Null);
    assert_eq!(resp.body["address"], json!("12 Harbour Rd"));
    assert_eq!(resp.body["latitude"], json!(37.76));

    let resp = send(&state, request(Method::GET, "/chefs", None)).await;
    let chef = &resp.body[0];
    assert_eq!(chef["chefCuisine"], json!("Nigerian"));
    assert_eq!(chef["generalLocation"], json!("Mission District"));
    assert_eq!(chef["profileImage"], json!("https://cdn.bluejay.test/marta.png"));
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_customer_profile_rejects_chef_fields(pool: PgPool) {
    let state = db_state(pool);
    let (session, _) = signup(&state, "Sam", "sam@bluejay.test", false).await;

    let body = json!({ "chefCuisine": "Thai" });
    let resp = send(
        &state,
        with_session(request(Method::PUT, "/users", Some(&body)), &session),
    )
    .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let body = json!({ "latitude": 12.0 });
    let resp = send(
        &state,
        with_session(request(Method::PUT, "/users", Some(&body)), &session),
    )
    .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.body["message"],
        json!("latitude and longitude must be given together")
    );
}
