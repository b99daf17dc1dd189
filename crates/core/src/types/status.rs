//! Order fulfillment state.
//!
//! Fulfillment is a one-way flag: an order starts unfulfilled and becomes
//! fulfilled once its payment secret has been presented. There is no way back.

use serde::{Deserialize, Serialize};

/// Attempted an invalid fulfillment transition.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentError {
    /// The order was already fulfilled.
    #[error("order is already fulfilled")]
    AlreadyFulfilled,
}

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    #[default]
    Unfulfilled,
    Fulfilled,
}

impl FulfillmentStatus {
    /// Map the `is_fulfilled` column.
    #[must_use]
    pub const fn from_flag(is_fulfilled: bool) -> Self {
        if is_fulfilled {
            Self::Fulfilled
        } else {
            Self::Unfulfilled
        }
    }

    /// Whether the order has been fulfilled.
    #[must_use]
    pub const fn is_fulfilled(self) -> bool {
        matches!(self, Self::Fulfilled)
    }

    /// The state after fulfilling.
    ///
    /// # Errors
    ///
    /// Returns [`FulfillmentError::AlreadyFulfilled`] if the order is already
    /// fulfilled.
    pub const fn fulfill(self) -> Result<Self, FulfillmentError> {
        match self {
            Self::Unfulfilled => Ok(Self::Fulfilled),
            Self::Fulfilled => Err(FulfillmentError::AlreadyFulfilled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfill_is_one_way() {
        let status = FulfillmentStatus::default();
        assert!(!status.is_fulfilled());

        let fulfilled = status.fulfill();
        assert_eq!(fulfilled, Ok(FulfillmentStatus::Fulfilled));
        assert_eq!(
            FulfillmentStatus::Fulfilled.fulfill(),
            Err(FulfillmentError::AlreadyFulfilled)
        );
    }

    #[test]
    fn test_from_flag() {
        assert_eq!(
            FulfillmentStatus::from_flag(true),
            FulfillmentStatus::Fulfilled
        );
        assert_eq!(
            FulfillmentStatus::from_flag(false),
            FulfillmentStatus::Unfulfilled
        );
    }
}
