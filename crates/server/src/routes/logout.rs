//! `/users/logout`.

use axum::{Json, extract::State, http::HeaderMap};

use crate::error::clear_sentry_user;
use crate::middleware::auth::unset_auth_cookies;
use crate::schemas::MessageSchema;
use crate::state::AppState;

/// Remove every auth cookie. Works without a valid token so stale cookies
/// can always be cleared.
pub async fn logout(State(state): State<AppState>) -> (HeaderMap, Json<MessageSchema>) {
    clear_sentry_user();
    (
        unset_auth_cookies(state.config().cookies),
        Json(MessageSchema::new("logged out")),
    )
}
