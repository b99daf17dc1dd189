//! `/users/login`: password login and access token refresh.

use axum::{Json, extract::State, http::HeaderMap};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::middleware::RequireRefresh;
use crate::middleware::auth::{set_access_cookies, set_auth_cookies};
use crate::schemas::UserSchema;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Login body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Check credentials and set the access, refresh and CSRF cookies.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<UserSchema>)> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "Login failed"))?;

    let tokens = state
        .jwt()
        .issue_pair(user.id, user.role)
        .map_err(AuthError::from)?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok((
        set_auth_cookies(&tokens, state.config().cookies),
        Json(UserSchema::from(&user)),
    ))
}

/// Trade the refresh cookie for a new access cookie.
pub async fn refresh(
    State(state): State<AppState>,
    RequireRefresh(current): RequireRefresh,
) -> Result<(HeaderMap, Json<UserSchema>)> {
    let user = AuthService::new(state.pool())
        .get_user(current.id)
        .await
        .map_err(|e| match e {
            AuthError::UserNotFound => AppError::Unauthorized("account no longer exists".into()),
            other => other.into(),
        })?;

    let access = state
        .jwt()
        .issue_access(user.id, user.role)
        .map_err(AuthError::from)?;

    Ok((
        set_access_cookies(&access, state.config().cookies),
        Json(UserSchema::from(&user)),
    ))
}
