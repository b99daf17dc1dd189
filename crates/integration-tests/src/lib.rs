//! Integration tests for Bluejay.
//!
//! Requests are driven through the real router with
//! `tower::ServiceExt::oneshot`; no listener is bound.
//!
//! # Running Tests
//!
//! ```bash
//! # Router-only tests (no database needed)
//! cargo test -p bluejay-integration-tests
//!
//! # Database tests: sqlx creates a throwaway database per test
//! DATABASE_URL=postgres://localhost/bluejay cargo test -p bluejay-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `auth` - Cookie, CSRF and token handling at the HTTP boundary
//! - `orders` - Placing, reading and fulfilling orders against `PostgreSQL`
//! - `menu` - Chefs and meal items against `PostgreSQL`
//! - `rate_limit` - Login throttling on a shared router

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header},
};
use bluejay_server::{
    AppState, ServerConfig, build_app,
    config::{CookieSettings, JwtSettings, PaymentSettings, RateLimitSettings},
};
use cookie::Cookie;
use secrecy::SecretString;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

/// Signing secret for tests only.
pub const TEST_JWT_SECRET: &str = "q8Zr2vN5xK1pW7mT3bJ9cY4hL6dF0sGa";

/// Configuration suitable for tests: offline payments, no rate limit, CSRF on.
#[must_use]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://localhost/bluejay_test"),
        host: std::net::Ipv4Addr::LOCALHOST.into(),
        port: 0,
        jwt: JwtSettings {
            secret: SecretString::from(TEST_JWT_SECRET),
            access_token_minutes: 15,
            refresh_token_days: 30,
            issuer: "bluejay".to_string(),
            audience: "bluejay-api".to_string(),
        },
        cookies: CookieSettings {
            secure: false,
            csrf_protect: true,
        },
        payments: PaymentSettings {
            stripe_secret_key: None,
            currency: "usd".to_string(),
        },
        rate_limit: RateLimitSettings {
            enabled: false,
            trust_proxy_headers: false,
        },
        log_json: false,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// State over a pool that never connects, for tests that must not reach the
/// database.
///
/// # Panics
///
/// Panics if the placeholder URL cannot be parsed.
#[must_use]
pub fn offline_state() -> AppState {
    offline_state_with(test_config())
}

/// Like [`offline_state`], with a caller-supplied configuration.
///
/// # Panics
///
/// Panics if the placeholder URL cannot be parsed.
#[must_use]
pub fn offline_state_with(config: ServerConfig) -> AppState {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/bluejay_unreachable")
        .expect("lazy pool");
    AppState::new(config, pool)
}

/// State over a real pool, typically one handed out by `#[sqlx::test]`.
#[must_use]
pub fn db_state(pool: PgPool) -> AppState {
    AppState::new(test_config(), pool)
}

/// A response with its JSON body decoded (`Value::Null` when not JSON).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `Set-Cookie` values keyed by cookie name.
    #[must_use]
    pub fn set_cookies(&self) -> Vec<Cookie<'static>> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| Cookie::parse(v.to_string()).ok())
            .collect()
    }

    /// The named `Set-Cookie`, if present.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.set_cookies().into_iter().find(|c| c.name() == name)
    }
}

/// Cookies a browser would send back, plus the CSRF value to echo.
#[derive(Debug, Default, Clone)]
pub struct Session {
    cookies: Vec<(String, String)>,
    pub csrf_access: Option<String>,
}

impl Session {
    /// Absorb the cookies set by a response.
    pub fn update(&mut self, response: &TestResponse) {
        for cookie in response.set_cookies() {
            self.cookies.retain(|(name, _)| name != cookie.name());
            if !cookie.value().is_empty() {
                self.cookies
                    .push((cookie.name().to_string(), cookie.value().to_string()));
            }
            if cookie.name() == "csrf_access_token" {
                self.csrf_access =
                    Some(cookie.value().to_string()).filter(|value| !value.is_empty());
            }
        }
    }

    /// Value for a `Cookie` request header.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Build a request with an optional JSON body.
///
/// # Panics
///
/// Panics if the request cannot be assembled.
#[must_use]
pub fn request(method: Method, uri: &str, body: Option<&Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let result = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    };
    result.expect("valid request")
}

/// Attach a session's cookies and, for mutating methods, its CSRF header.
#[must_use]
pub fn with_session(mut req: Request<Body>, session: &Session) -> Request<Body> {
    if let Ok(value) = HeaderValue::from_str(&session.cookie_header()) {
        req.headers_mut().insert(header::COOKIE, value);
    }
    if let Some(csrf) = session
        .csrf_access
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
    {
        req.headers_mut().insert("x-csrf-token", csrf);
    }
    req
}

/// Send a request through a fresh router.
///
/// # Panics
///
/// Panics if the router fails (it is infallible) or the body cannot be read.
pub async fn send(state: &AppState, req: Request<Body>) -> TestResponse {
    send_to(&build_app(state.clone()), req).await
}

/// Send a request through an existing router, keeping layer state such as
/// rate-limit buckets across calls.
///
/// # Panics
///
/// Panics if the router fails (it is infallible) or the body cannot be read.
pub async fn send_to(app: &Router, req: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(req).await.expect("infallible");

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Sign up through `POST /users` and return the logged-in session.
///
/// # Panics
///
/// Panics if signup does not return 201.
pub async fn signup(state: &AppState, name: &str, email: &str, is_chef: bool) -> (Session, Value) {
    let body = serde_json::json!({
        "name": name,
        "email": email,
        "password": "correct-horse-battery",
        "confirmPassword": "correct-horse-battery",
        "isChef": is_chef,
    });
    let resp = send(state, request(Method::POST, "/users", Some(&body))).await;
    assert_eq!(resp.status, StatusCode::CREATED, "signup failed: {}", resp.body);

    let mut session = Session::default();
    session.update(&resp);
    (session, resp.body)
}
