//! Order resources.
//!
//! `/order/{id}` reads and fulfills a single order; `/orders` places a new
//! order and lists the caller's own.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use bluejay_core::{MealItemId, OrderId};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::NewOrderLine;
use crate::schemas::{MessageSchema, OrderSchema};
use crate::services::OrderService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillRequest {
    pub client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub meal_item_id: MealItemId,
    pub quantity: i64,
}

impl From<&OrderItemRequest> for NewOrderLine {
    fn from(item: &OrderItemRequest) -> Self {
        Self {
            meal_item_id: item.meal_item_id,
            // Out-of-range quantities become 0 and are rejected by validation
            quantity: u32::try_from(item.quantity).unwrap_or(0),
        }
    }
}

/// `GET /order/{id}`
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_current): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderSchema>> {
    let order = OrderService::new(state.pool(), state.payments())
        .get(id)
        .await?;
    Ok(Json(OrderSchema::from(&order)))
}

/// `PUT /order/{id}`: fulfill with the order's client secret.
pub async fn fulfill(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<OrderId>,
    Json(body): Json<FulfillRequest>,
) -> Result<(StatusCode, Json<MessageSchema>)> {
    let client_secret = body
        .client_secret
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("clientSecret is required".to_string()))?;

    OrderService::new(state.pool(), state.payments())
        .fulfill(id, &client_secret)
        .await?;

    tracing::info!(order_id = %id, user_id = %current.id, "Fulfillment accepted");
    Ok((StatusCode::CREATED, Json(MessageSchema::new("order created"))))
}

/// `POST /orders`: the response is the only place the client secret is shown.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(body): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderSchema>)> {
    let lines: Vec<NewOrderLine> = body.items.iter().map(NewOrderLine::from).collect();

    let order = OrderService::new(state.pool(), state.payments())
        .place_order(current.id, &lines)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderSchema::with_client_secret(&order)),
    ))
}

/// `GET /orders`
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<Vec<OrderSchema>>> {
    let orders = OrderService::new(state.pool(), state.payments())
        .list_for_user(current.id)
        .await?;
    Ok(Json(orders.iter().map(OrderSchema::from).collect()))
}
