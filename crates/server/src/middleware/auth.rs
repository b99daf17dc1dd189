//! Cookie-based JWT authentication.
//!
//! Login stores four cookies:
//!
//! | cookie                 | path           | `HttpOnly` | contents              |
//! |------------------------|----------------|------------|-----------------------|
//! | `access_token_cookie`  | `/`            | yes        | access JWT            |
//! | `csrf_access_token`    | `/`            | no         | access token's `csrf` |
//! | `refresh_token_cookie` | `/users/login` | yes        | refresh JWT           |
//! | `csrf_refresh_token`   | `/`            | no         | refresh token's `csrf`|
//!
//! On `POST`, `PUT`, `PATCH` and `DELETE` the client must copy the readable
//! CSRF cookie into the `X-CSRF-TOKEN` header (double submit).

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, Method, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use cookie::{Cookie, SameSite};
use serde_json::json;

use bluejay_core::{Role, UserId};

use crate::config::CookieSettings;
use crate::error::set_sentry_user;
use crate::services::auth::{IssuedToken, JwtError, TokenPair, TokenType, constant_time_compare};
use crate::state::AppState;

pub const ACCESS_COOKIE: &str = "access_token_cookie";
pub const REFRESH_COOKIE: &str = "refresh_token_cookie";
pub const ACCESS_CSRF_COOKIE: &str = "csrf_access_token";
pub const REFRESH_CSRF_COOKIE: &str = "csrf_refresh_token";
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Refresh cookies are only sent to the refresh endpoint.
pub const REFRESH_COOKIE_PATH: &str = "/users/login";

/// Identity carried by a validated token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub role: Role,
}

impl CurrentUser {
    #[must_use]
    pub const fn is_chef(&self) -> bool {
        self.role.is_chef()
    }
}

/// Extractor that requires a valid access token cookie.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, user {}!", user.id)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a valid refresh token cookie.
pub struct RequireRefresh(pub CurrentUser);

/// Why a request was not authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    MissingToken(&'static str),
    Expired,
    MissingCsrf,
    CsrfMismatch,
    /// Malformed token, bad signature, or wrong token type.
    Invalid(String),
}

impl AuthRejection {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken(_) | Self::Expired | Self::MissingCsrf | Self::CsrfMismatch => {
                StatusCode::UNAUTHORIZED
            }
            Self::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::MissingToken(cookie) => format!("Missing cookie \"{cookie}\""),
            Self::Expired => "Token has expired".to_string(),
            Self::MissingCsrf => format!("Missing CSRF token in {CSRF_HEADER} header"),
            Self::CsrfMismatch => "CSRF double submit tokens do not match".to_string(),
            Self::Invalid(reason) => reason.clone(),
        }
    }
}

impl From<JwtError> for AuthRejection {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => Self::Expired,
            other => Self::Invalid(other.to_string()),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        tracing::debug!(reason = ?self, "Request not authenticated");
        (self.status(), Json(json!({ "message": self.message() }))).into_response()
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(Self(*user));
        }

        let user = authenticate(parts, state, TokenType::Access)?;
        parts.extensions.insert(user);
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireRefresh {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state, TokenType::Refresh).map(Self)
    }
}

fn authenticate(
    parts: &Parts,
    state: &AppState,
    token_type: TokenType,
) -> Result<CurrentUser, AuthRejection> {
    let cookie_name = match token_type {
        TokenType::Access => ACCESS_COOKIE,
        TokenType::Refresh => REFRESH_COOKIE,
    };

    let token = find_cookie(&parts.headers, cookie_name)
        .ok_or(AuthRejection::MissingToken(cookie_name))?;

    let claims = state.jwt().validate(&token, token_type)?;

    if state.config().cookies.csrf_protect && requires_csrf(&parts.method) {
        check_csrf(&parts.headers, &claims.csrf)?;
    }

    let id = claims.user_id()?;
    set_sentry_user(&id, None);

    Ok(CurrentUser {
        id,
        role: claims.role,
    })
}

/// Double submit: the header must carry the token's `csrf` claim.
fn check_csrf(headers: &HeaderMap, expected: &str) -> Result<(), AuthRejection> {
    let presented = headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthRejection::MissingCsrf)?;

    if constant_time_compare(presented, expected) {
        Ok(())
    } else {
        Err(AuthRejection::CsrfMismatch)
    }
}

/// Methods that must carry the CSRF header.
fn requires_csrf(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Value of the named cookie across all `Cookie` headers.
#[must_use]
pub fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}

/// `Set-Cookie` headers for a freshly issued access and refresh token.
#[must_use]
pub fn set_auth_cookies(pair: &TokenPair, settings: CookieSettings) -> HeaderMap {
    let mut headers = set_access_cookies(&pair.access, settings);
    for cookie in [
        token_cookie(REFRESH_COOKIE, &pair.refresh, REFRESH_COOKIE_PATH, true, settings),
        token_cookie(REFRESH_CSRF_COOKIE, &pair.refresh, "/", false, settings),
    ] {
        append_cookie(&mut headers, &cookie);
    }
    headers
}

/// `Set-Cookie` headers for a new access token only.
#[must_use]
pub fn set_access_cookies(access: &IssuedToken, settings: CookieSettings) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for cookie in [
        token_cookie(ACCESS_COOKIE, access, "/", true, settings),
        token_cookie(ACCESS_CSRF_COOKIE, access, "/", false, settings),
    ] {
        append_cookie(&mut headers, &cookie);
    }
    headers
}

/// `Set-Cookie` headers that remove every auth cookie.
#[must_use]
pub fn unset_auth_cookies(settings: CookieSettings) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, path, http_only) in [
        (ACCESS_COOKIE, "/", true),
        (ACCESS_CSRF_COOKIE, "/", false),
        (REFRESH_COOKIE, REFRESH_COOKIE_PATH, true),
        (REFRESH_CSRF_COOKIE, "/", false),
    ] {
        let mut cookie = base_cookie(name, String::new(), path, http_only, settings);
        cookie.make_removal();
        append_cookie(&mut headers, &cookie);
    }
    headers
}

/// The JWT itself for `HttpOnly` cookies, its CSRF value otherwise.
fn token_cookie(
    name: &'static str,
    token: &IssuedToken,
    path: &'static str,
    http_only: bool,
    settings: CookieSettings,
) -> Cookie<'static> {
    let value = if http_only {
        token.token.clone()
    } else {
        token.csrf.clone()
    };

    let mut cookie = base_cookie(name, value, path, http_only, settings);
    let seconds = (token.expires_at - Utc::now()).num_seconds().max(0);
    cookie.set_max_age(cookie::time::Duration::seconds(seconds));
    cookie
}

fn base_cookie(
    name: &'static str,
    value: String,
    path: &'static str,
    http_only: bool,
    settings: CookieSettings,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path(path)
        .http_only(http_only)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .build()
}

fn append_cookie(headers: &mut HeaderMap, cookie: &Cookie<'_>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!(cookie = cookie.name(), error = %e, "Unencodable cookie"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    const SETTINGS: CookieSettings = CookieSettings {
        secure: true,
        csrf_protect: true,
    };

    fn issued(token_type: TokenType) -> IssuedToken {
        IssuedToken {
            token: "header.payload.sig".to_string(),
            csrf: "csrf123".to_string(),
            token_type,
            expires_at: Utc::now() + Duration::minutes(15),
        }
    }

    fn set_cookies(headers: &HeaderMap) -> Vec<Cookie<'static>> {
        headers
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| Cookie::parse(v.to_str().unwrap().to_string()).unwrap())
            .collect()
    }

    #[test]
    fn test_find_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1; access_token_cookie=tok"));
        headers.append(header::COOKIE, HeaderValue::from_static("b=2"));

        assert_eq!(find_cookie(&headers, ACCESS_COOKIE).as_deref(), Some("tok"));
        assert_eq!(find_cookie(&headers, "b").as_deref(), Some("2"));
        assert_eq!(find_cookie(&headers, REFRESH_COOKIE), None);
    }

    #[test]
    fn test_auth_cookie_attributes() {
        let pair = TokenPair {
            access: issued(TokenType::Access),
            refresh: issued(TokenType::Refresh),
        };
        let cookies = set_cookies(&set_auth_cookies(&pair, SETTINGS));
        assert_eq!(cookies.len(), 4);

        let by_name = |name: &str| cookies.iter().find(|c| c.name() == name).unwrap();

        let access = by_name(ACCESS_COOKIE);
        assert_eq!(access.value(), "header.payload.sig");
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.secure(), Some(true));
        assert_eq!(access.path(), Some("/"));
        assert!(access.max_age().is_some());

        let csrf = by_name(ACCESS_CSRF_COOKIE);
        assert_eq!(csrf.value(), "csrf123");
        assert_ne!(csrf.http_only(), Some(true));

        assert_eq!(by_name(REFRESH_COOKIE).path(), Some(REFRESH_COOKIE_PATH));
        assert_eq!(by_name(REFRESH_CSRF_COOKIE).path(), Some("/"));
    }

    #[test]
    fn test_unset_cookies() {
        let cookies = set_cookies(&unset_auth_cookies(SETTINGS));
        assert_eq!(cookies.len(), 4);
        for cookie in &cookies {
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age(), Some(cookie::time::Duration::ZERO));
        }
    }

    #[test]
    fn test_rejection_status() {
        assert_eq!(
            AuthRejection::MissingToken(ACCESS_COOKIE).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthRejection::Expired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthRejection::CsrfMismatch.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthRejection::Invalid("bad".to_string()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AuthRejection::from(JwtError::WrongTokenType { expected: "access" }),
            AuthRejection::Invalid("expected access token".to_string())
        );
    }

    #[test]
    fn test_check_csrf() {
        let mut headers = HeaderMap::new();
        assert_eq!(check_csrf(&headers, "abc123"), Err(AuthRejection::MissingCsrf));

        headers.insert(CSRF_HEADER, HeaderValue::from_static("abc124"));
        assert_eq!(check_csrf(&headers, "abc123"), Err(AuthRejection::CsrfMismatch));

        headers.insert(CSRF_HEADER, HeaderValue::from_static("abc12"));
        assert_eq!(check_csrf(&headers, "abc123"), Err(AuthRejection::CsrfMismatch));

        headers.insert(CSRF_HEADER, HeaderValue::from_static("abc123"));
        assert_eq!(check_csrf(&headers, "abc123"), Ok(()));
    }

    #[test]
    fn test_requires_csrf() {
        assert!(requires_csrf(&Method::POST));
        assert!(requires_csrf(&Method::PUT));
        assert!(!requires_csrf(&Method::GET));
        assert!(!requires_csrf(&Method::HEAD));
    }
}
