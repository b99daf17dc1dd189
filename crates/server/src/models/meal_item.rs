//! Meal item domain types.

use chrono::{DateTime, Utc};

use bluejay_core::{MealItemId, Price, UserId};

/// A dish offered by a chef.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealItem {
    pub id: MealItemId,
    /// The chef who owns this item.
    pub chef_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub created_at: DateTime<Utc>,
}

/// Validated data for a new meal item.
#[derive(Debug, Clone)]
pub struct NewMealItem {
    pub chef_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
}
