//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Database readiness check
//!
//! # Users
//! POST /users                  - Sign up (sets JWT cookies)
//! GET  /users                  - Current user (auth)
//! PUT  /users                  - Update name/email (auth + CSRF)
//! POST /users/login            - Log in (sets JWT cookies)
//! GET  /users/login            - Refresh access token (refresh cookie)
//! POST /users/logout           - Clear JWT cookies
//!
//! # Chefs and menu
//! GET  /chefs                  - All chefs
//! GET  /meal_items             - Meal items (?chefId= filter)
//! POST /meal_items             - Create meal item (chef + CSRF)
//!
//! # Orders (auth)
//! GET  /order/{id}             - Order detail
//! PUT  /order/{id}             - Fulfill with clientSecret (CSRF)
//! GET  /orders                 - Caller's orders
//! POST /orders                 - Place order (CSRF)
//! ```

pub mod chefs;
pub mod health;
pub mod login;
pub mod logout;
pub mod meal_items;
pub mod orders;
pub mod users;

use axum::{
    Router,
    routing::{MethodRouter, get, post},
};

use crate::config::RateLimitSettings;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Apply the login/signup rate limiter when enabled.
fn limited(route: MethodRouter<AppState>, rate_limit: RateLimitSettings) -> MethodRouter<AppState> {
    if rate_limit.enabled {
        route.layer(auth_rate_limiter(rate_limit.trust_proxy_headers))
    } else {
        route
    }
}

/// Create the user, login and logout routes router.
pub fn user_routes(rate_limit: RateLimitSettings) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            limited(post(users::create), rate_limit)
                .get(users::show)
                .put(users::update),
        )
        .route(
            "/login",
            limited(post(login::login), rate_limit).get(login::refresh),
        )
        .route("/logout", post(logout::logout))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/order/{id}", get(orders::show).put(orders::fulfill))
        .route("/orders", get(orders::index).post(orders::create))
}

/// Create all routes.
pub fn routes(rate_limit: RateLimitSettings) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/users", user_routes(rate_limit))
        .route("/chefs", get(chefs::index))
        .route(
            "/meal_items",
            get(meal_items::index).post(meal_items::create),
        )
        .merge(order_routes())
}
