//! Order domain types.

use std::fmt;

use chrono::{DateTime, Utc};

use bluejay_core::{FulfillmentError, FulfillmentStatus, MealItemId, OrderId, Price, UserId};

use crate::services::auth::constant_time_compare;

/// Marker between the payment intent id and the secret part of a client secret.
const SECRET_SEPARATOR: &str = "_secret_";

/// The payment token handed to the client when an order is placed.
///
/// Presenting it again is what fulfills the order. `Debug` is redacted so
/// the value never lands in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecret(String);

impl ClientSecret {
    #[must_use]
    pub const fn new(secret: String) -> Self {
        Self(secret)
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// The payment intent id embedded in the secret (`pi_123` in
    /// `pi_123_secret_abc`).
    #[must_use]
    pub fn payment_intent_id(&self) -> Option<&str> {
        self.0
            .split_once(SECRET_SEPARATOR)
            .map(|(id, _)| id)
            .filter(|id| !id.is_empty())
    }

    /// Compare against a presented secret without short-circuiting on the
    /// first differing byte.
    #[must_use]
    pub fn matches(&self, presented: &str) -> bool {
        constant_time_compare(&self.0, presented)
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret([REDACTED])")
    }
}

/// One meal item within an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub meal_item_id: MealItemId,
    /// Meal item name at read time.
    pub name: String,
    pub quantity: u32,
    /// Price captured when the order was placed.
    pub unit_price: Price,
}

impl OrderLine {
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// A requested order line before prices are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderLine {
    pub meal_item_id: MealItemId,
    pub quantity: u32,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    /// The client who placed the order.
    pub user_id: UserId,
    pub client_secret: ClientSecret,
    pub total: Price,
    pub status: FulfillmentStatus,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Apply fulfillment to this in-memory copy.
    ///
    /// Persistence uses a conditional update so that concurrent requests
    /// cannot both succeed; this mirrors that rule for the returned value.
    ///
    /// # Errors
    ///
    /// Returns [`FulfillmentError::AlreadyFulfilled`] if the order is
    /// already fulfilled.
    pub fn mark_fulfilled(&mut self, at: DateTime<Utc>) -> Result<(), FulfillmentError> {
        self.status = self.status.fulfill()?;
        self.fulfilled_at = Some(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        Order {
            id: OrderId::new(1),
            user_id: UserId::new(2),
            client_secret: ClientSecret::new("pi_3Abc_secret_xyz".to_string()),
            total: Price::from_cents(1500),
            status: FulfillmentStatus::Unfulfilled,
            fulfilled_at: None,
            created_at: Utc::now(),
            lines: vec![OrderLine {
                meal_item_id: MealItemId::new(7),
                name: "Ramen".to_string(),
                quantity: 2,
                unit_price: Price::from_cents(750),
            }],
        }
    }

    #[test]
    fn test_payment_intent_id() {
        let secret = ClientSecret::new("pi_3Abc_secret_xyz".to_string());
        assert_eq!(secret.payment_intent_id(), Some("pi_3Abc"));

        assert_eq!(ClientSecret::new("opaque".to_string()).payment_intent_id(), None);
        assert_eq!(ClientSecret::new("_secret_x".to_string()).payment_intent_id(), None);
    }

    #[test]
    fn test_matches() {
        let secret = ClientSecret::new("pi_1_secret_a".to_string());
        assert!(secret.matches("pi_1_secret_a"));
        assert!(!secret.matches("pi_1_secret_b"));
        assert!(!secret.matches("pi_1_secret_"));
    }

    #[test]
    fn test_debug_redacts() {
        let secret = ClientSecret::new("pi_1_secret_a".to_string());
        assert!(!format!("{secret:?}").contains("pi_1"));
    }

    #[test]
    fn test_mark_fulfilled_once() {
        let mut order = order();
        assert_eq!(order.lines[0].subtotal(), order.total);

        order.mark_fulfilled(Utc::now()).unwrap_or_else(|e| panic!("{e}"));
        assert!(order.status.is_fulfilled());
        assert!(order.fulfilled_at.is_some());

        assert_eq!(
            order.mark_fulfilled(Utc::now()),
            Err(FulfillmentError::AlreadyFulfilled)
        );
    }
}
