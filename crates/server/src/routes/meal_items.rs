//! `/meal_items` resource.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use bluejay_core::{Price, UserId};

use crate::db::MealItemRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::NewMealItem;
use crate::schemas::MealItemSchema;
use crate::state::AppState;

const MAX_NAME_LENGTH: usize = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealItemQuery {
    pub chef_id: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMealItemRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
}

/// List meal items, optionally for one chef (`?chefId=`).
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<MealItemQuery>,
) -> Result<Json<Vec<MealItemSchema>>> {
    let items = MealItemRepository::new(state.pool())
        .list(query.chef_id)
        .await?;

    Ok(Json(items.iter().map(MealItemSchema::from).collect()))
}

/// Add a meal item to the logged-in chef's menu.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(body): Json<CreateMealItemRequest>,
) -> Result<(StatusCode, Json<MealItemSchema>)> {
    if !current.is_chef() {
        return Err(AppError::Forbidden(
            "only chefs can create meal items".to_string(),
        ));
    }

    let new_item = validate(current.id, body)?;
    let item = MealItemRepository::new(state.pool())
        .create(&new_item)
        .await?;

    tracing::info!(meal_item_id = %item.id, chef_id = %item.chef_id, "Meal item created");
    Ok((StatusCode::CREATED, Json(MealItemSchema::from(&item))))
}

fn validate(chef_id: UserId, body: CreateMealItemRequest) -> Result<NewMealItem> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::BadRequest(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }

    let price = Price::new(body.price).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let description = body
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    Ok(NewMealItem {
        chef_id,
        name: name.to_string(),
        description,
        price,
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn body(name: &str, price: &str) -> CreateMealItemRequest {
        CreateMealItemRequest {
            name: name.to_string(),
            description: Some("  ".to_string()),
            price: Decimal::from_str(price).unwrap_or_default(),
        }
    }

    #[test]
    fn test_validate_ok() {
        let item = validate(UserId::new(2), body(" Pho ", "11.5")).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(item.name, "Pho");
        assert_eq!(item.description, None);
        assert_eq!(item.price.to_string(), "11.50");
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(matches!(
            validate(UserId::new(2), body("", "1")),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate(UserId::new(2), body("Pho", "-1")),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate(UserId::new(2), body("Pho", "1.999")),
            Err(AppError::BadRequest(_))
        ));
    }
}
