//! Meal prices using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(10,2)` and serialized as strings
//! (`"12.50"`) so that JSON clients never see binary floating point.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount has more than two decimal places.
    #[error("price must have at most 2 decimal places")]
    TooPrecise,
    /// The amount does not fit the database column.
    #[error("price is too large")]
    TooLarge,
}

/// A non-negative amount in the store currency with cent precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Largest amount accepted by a `NUMERIC(10,2)` column.
    pub const MAX: Decimal = Decimal::from_parts(999_999_999, 0, 0, false, 2);

    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Validate a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if the amount is negative, has more than two
    /// decimal places, or exceeds [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount.normalize().scale() > 2 {
            return Err(PriceError::TooPrecise);
        }
        if amount > Self::MAX {
            return Err(PriceError::TooLarge);
        }
        let mut amount = amount;
        amount.rescale(2);
        Ok(Self(amount))
    }

    /// Build a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The amount in cents, as payment providers expect it.
    ///
    /// Returns `None` only if the amount cannot be represented as `i64`,
    /// which [`Price::new`] already rules out.
    #[must_use]
    pub fn to_cents(&self) -> Option<i64> {
        (self.0 * Decimal::ONE_HUNDRED).round().to_i64()
    }

    /// Multiply by an order quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(Price::new(dec("-0.01")), Err(PriceError::Negative));
        assert!(Price::new(dec("0")).is_ok());
    }

    #[test]
    fn test_rejects_sub_cent_precision() {
        assert_eq!(Price::new(dec("1.005")), Err(PriceError::TooPrecise));
        // Trailing zeros are not extra precision.
        assert!(Price::new(dec("1.500")).is_ok());
    }

    #[test]
    fn test_rejects_too_large() {
        assert_eq!(Price::new(dec("10000000.00")), Err(PriceError::TooLarge));
        assert!(Price::new(dec("9999999.99")).is_ok());
    }

    #[test]
    fn test_cents_and_totals() {
        let burger = Price::new(dec("8.75")).unwrap();
        let fries = Price::from_cents(325);

        let total: Price = [burger.times(2), fries].into_iter().sum();
        assert_eq!(total.to_string(), "20.75");
        assert_eq!(total.to_cents(), Some(2075));
    }

    #[test]
    fn test_serde_uses_strings() {
        let price = Price::new(dec("12.5")).unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"12.50\"");

        let parsed: Price = serde_json::from_str("\"4.20\"").unwrap();
        assert_eq!(parsed.to_cents(), Some(420));

        assert!(serde_json::from_str::<Price>("\"-3\"").is_err());
    }
}
