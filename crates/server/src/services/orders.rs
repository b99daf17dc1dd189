//! Order placement and fulfillment.

use std::collections::{HashMap, HashSet};

use sqlx::PgPool;
use thiserror::Error;

use bluejay_core::{FulfillmentError, MealItemId, OrderId, Price, UserId};

use super::payments::{PaymentError, PaymentGateway};
use crate::db::orders::PricedLine;
use crate::db::{MealItemRepository, OrderRepository, RepositoryError};
use crate::models::{MealItem, NewOrderLine, Order};

/// Upper bound for a single line's quantity.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("an order needs at least one meal item")]
    EmptyOrder,

    #[error("quantity for meal item {0} must be between 1 and {max}", max = MAX_LINE_QUANTITY)]
    InvalidQuantity(MealItemId),

    #[error("meal item {0} is listed more than once")]
    DuplicateItem(MealItemId),

    #[error("unknown meal items: {}", format_ids(.0))]
    UnknownMealItems(Vec<MealItemId>),

    #[error("order total is too large")]
    TotalTooLarge,

    #[error("order not found")]
    NotFound,

    #[error("order is already fulfilled")]
    AlreadyFulfilled,

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<FulfillmentError> for OrderError {
    fn from(err: FulfillmentError) -> Self {
        match err {
            FulfillmentError::AlreadyFulfilled => Self::AlreadyFulfilled,
        }
    }
}

fn format_ids(ids: &[MealItemId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Order service.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    meal_items: MealItemRepository<'a>,
    payments: &'a PaymentGateway,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, payments: &'a PaymentGateway) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            meal_items: MealItemRepository::new(pool),
            payments,
        }
    }

    /// Price the requested lines, open a payment and store the order.
    ///
    /// # Errors
    ///
    /// Returns a validation variant of `OrderError` for bad input,
    /// `OrderError::Payment` if the provider refuses the intent.
    pub async fn place_order(
        &self,
        user_id: UserId,
        requested: &[NewOrderLine],
    ) -> Result<Order, OrderError> {
        validate_lines(requested)?;

        let ids: Vec<MealItemId> = requested.iter().map(|l| l.meal_item_id).collect();
        let items = self.meal_items.get_many(&ids).await?;
        let (lines, total) = price_lines(requested, &items)?;

        let client_secret = self.payments.create_intent(total).await?;
        let order = self
            .orders
            .create(user_id, &client_secret, total, &lines)
            .await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user_id,
            total = %total,
            gateway = self.payments.name(),
            "Order placed"
        );
        Ok(order)
    }

    /// Load an order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if there is no such order.
    pub async fn get(&self, id: OrderId) -> Result<Order, OrderError> {
        self.orders.get_by_id(id).await?.ok_or(OrderError::NotFound)
    }

    /// A client's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_for_user(user_id).await?)
    }

    /// Fulfill an order by presenting its client secret.
    ///
    /// Succeeds at most once per order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` for unknown orders,
    /// `OrderError::Payment` if the secret or payment check fails, and
    /// `OrderError::AlreadyFulfilled` on every call after the first success.
    pub async fn fulfill(&self, id: OrderId, presented: &str) -> Result<Order, OrderError> {
        let mut order = self.get(id).await?;

        if !order.client_secret.matches(presented) {
            tracing::warn!(order_id = %id, "Fulfillment attempted with wrong client secret");
            return Err(PaymentError::SecretMismatch.into());
        }
        if order.status.is_fulfilled() {
            return Err(OrderError::AlreadyFulfilled);
        }

        self.payments.confirm(&order.client_secret, presented).await?;

        // Lost a race with a concurrent request
        let fulfilled_at = self
            .orders
            .mark_fulfilled(id)
            .await?
            .ok_or(OrderError::AlreadyFulfilled)?;

        order.mark_fulfilled(fulfilled_at)?;
        tracing::info!(order_id = %id, "Order fulfilled");
        Ok(order)
    }
}

/// Reject empty orders, out-of-range quantities and repeated meal items.
fn validate_lines(requested: &[NewOrderLine]) -> Result<(), OrderError> {
    if requested.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    let mut seen = HashSet::with_capacity(requested.len());
    for line in requested {
        if line.quantity == 0 || line.quantity > MAX_LINE_QUANTITY {
            return Err(OrderError::InvalidQuantity(line.meal_item_id));
        }
        if !seen.insert(line.meal_item_id) {
            return Err(OrderError::DuplicateItem(line.meal_item_id));
        }
    }
    Ok(())
}

/// Attach current prices to the requested lines and sum them.
fn price_lines(
    requested: &[NewOrderLine],
    items: &[MealItem],
) -> Result<(Vec<PricedLine>, Price), OrderError> {
    let prices: HashMap<MealItemId, Price> = items.iter().map(|i| (i.id, i.price)).collect();

    let missing: Vec<MealItemId> = requested
        .iter()
        .map(|l| l.meal_item_id)
        .filter(|id| !prices.contains_key(id))
        .collect();
    if !missing.is_empty() {
        return Err(OrderError::UnknownMealItems(missing));
    }

    let lines: Vec<PricedLine> = requested
        .iter()
        .filter_map(|l| {
            prices.get(&l.meal_item_id).map(|&unit_price| PricedLine {
                meal_item_id: l.meal_item_id,
                quantity: l.quantity,
                unit_price,
            })
        })
        .collect();

    let total: Price = lines.iter().map(|l| l.unit_price.times(l.quantity)).sum();
    if total.amount() > Price::MAX {
        return Err(OrderError::TotalTooLarge);
    }

    Ok((lines, total))
}
