//! Order repository.
//!
//! An order and its lines are written in one transaction. Fulfillment is a
//! single conditional `UPDATE`, so two concurrent fulfill requests for the
//! same order cannot both succeed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bluejay_core::{FulfillmentStatus, MealItemId, OrderId, Price, UserId};

use super::RepositoryError;
use crate::models::{ClientSecret, Order, OrderLine};

const ORDER_COLUMNS: &str = "id, user_id, client_secret, total, is_fulfilled, fulfilled_at, created_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    client_secret: String,
    total: Price,
    is_fulfilled: bool,
    fulfilled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderLineRow {
    order_id: OrderId,
    meal_item_id: MealItemId,
    name: String,
    quantity: i32,
    unit_price: Price,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            client_secret: ClientSecret::new(self.client_secret),
            total: self.total,
            status: FulfillmentStatus::from_flag(self.is_fulfilled),
            fulfilled_at: self.fulfilled_at,
            created_at: self.created_at,
            lines,
        }
    }
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = RepositoryError;

    fn try_from(r: OrderLineRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(r.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative quantity on order {} item {}",
                r.order_id, r.meal_item_id
            ))
        })?;

        Ok(Self {
            meal_item_id: r.meal_item_id,
            name: r.name,
            quantity,
            unit_price: r.unit_price,
        })
    }
}

/// A priced line to persist with a new order.
#[derive(Debug, Clone, Copy)]
pub struct PricedLine {
    pub meal_item_id: MealItemId,
    pub quantity: u32,
    pub unit_price: Price,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the client secret is already used.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        user_id: UserId,
        client_secret: &ClientSecret,
        total: Price,
        lines: &[PricedLine],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order_id: OrderId = sqlx::query_scalar(
            r"
            INSERT INTO orders (user_id, client_secret, total)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(client_secret.expose())
        .bind(total)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "client secret"))?;

        for line in lines {
            let quantity = i32::try_from(line.quantity).map_err(|_| {
                RepositoryError::Conflict(format!("quantity {} is too large", line.quantity))
            })?;

            sqlx::query(
                r"
                INSERT INTO order_meal_items (order_id, meal_item_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(order_id)
            .bind(line.meal_item_id)
            .bind(quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_by_id(order_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Get an order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut lines = self.lines_for(&[row.id]).await?;
        let order_lines = lines.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_order(order_lines)))
    }

    /// List a client's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<OrderId> = rows.iter().map(|r| r.id).collect();
        let mut lines = self.lines_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let order_lines = lines.remove(&row.id).unwrap_or_default();
                row.into_order(order_lines)
            })
            .collect())
    }

    /// Flip an unfulfilled order to fulfilled.
    ///
    /// Returns the fulfillment time, or `None` if the order was already
    /// fulfilled (or does not exist).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_fulfilled(
        &self,
        id: OrderId,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let fulfilled_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r"
            UPDATE orders
            SET is_fulfilled = TRUE, fulfilled_at = now()
            WHERE id = $1 AND is_fulfilled = FALSE
            RETURNING fulfilled_at
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(fulfilled_at)
    }

    async fn lines_for(
        &self,
        order_ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderLine>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let raw_ids: Vec<i32> = order_ids.iter().map(OrderId::as_i32).collect();
        let rows = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT oi.order_id, oi.meal_item_id, m.name, oi.quantity, oi.unit_price
            FROM order_meal_items oi
            JOIN meal_items m ON m.id = oi.meal_item_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.order_id, oi.meal_item_id
            ",
        )
        .bind(&raw_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for row in rows {
            let order_id = row.order_id;
            grouped
                .entry(order_id)
                .or_default()
                .push(OrderLine::try_from(row)?);
        }
        Ok(grouped)
    }
}
