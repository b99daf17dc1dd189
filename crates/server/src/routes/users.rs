//! `/users` resource: signup, current user, profile update.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;

use bluejay_core::Role;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::middleware::auth::set_auth_cookies;
use crate::schemas::UserSchema;
use crate::services::auth::{AuthError, AuthService, ProfileUpdate, Signup};
use crate::state::AppState;

/// Signup body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: Option<String>,
    #[serde(default)]
    pub is_chef: bool,
}

/// Profile update body. Omitted fields are left unchanged.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub about_me: Option<String>,
    pub chef_profile: Option<String>,
    pub chef_cuisine: Option<String>,
    pub cuisines: Option<Vec<String>>,
    pub profile_image: Option<String>,
    pub general_location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<UpdateUserRequest> for ProfileUpdate {
    fn from(body: UpdateUserRequest) -> Self {
        Self {
            name: body.name,
            email: body.email,
            address: body.address,
            about_me: body.about_me,
            chef_profile: body.chef_profile,
            chef_cuisine: body.chef_cuisine,
            cuisines: body.cuisines,
            profile_image: body.profile_image,
            general_location: body.general_location,
            latitude: body.latitude,
            longitude: body.longitude,
        }
    }
}

/// Create an account and log it in.
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, HeaderMap, Json<UserSchema>)> {
    let user = AuthService::new(state.pool())
        .register(Signup {
            name: &body.name,
            email: &body.email,
            password: &body.password,
            confirm_password: body.confirm_password.as_deref(),
            role: Role::from_is_chef(body.is_chef),
        })
        .await?;

    let tokens = state
        .jwt()
        .issue_pair(user.id, user.role)
        .map_err(AuthError::from)?;
    let cookies = set_auth_cookies(&tokens, state.config().cookies);

    Ok((StatusCode::CREATED, cookies, Json(UserSchema::from(&user))))
}

/// The logged-in user.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<UserSchema>> {
    let user = AuthService::new(state.pool()).get_user(current.id).await?;
    Ok(Json(UserSchema::from(&user)))
}

/// Change the logged-in user's name, email or profile details.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserSchema>> {
    let user = AuthService::new(state.pool())
        .update_profile(current.id, &ProfileUpdate::from(body))
        .await?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(Json(UserSchema::from(&user)))
}
