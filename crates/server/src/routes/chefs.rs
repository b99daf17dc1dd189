//! `/chefs`: public list of chefs.

use axum::{Json, extract::State};

use crate::db::UserRepository;
use crate::error::Result;
use crate::schemas::ChefSchema;
use crate::state::AppState;

pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<ChefSchema>>> {
    let chefs = UserRepository::new(state.pool()).list_chefs().await?;
    Ok(Json(chefs.iter().map(ChefSchema::from).collect()))
}
