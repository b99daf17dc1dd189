//! Meal item repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bluejay_core::{MealItemId, Price, UserId};

use super::RepositoryError;
use crate::models::{MealItem, NewMealItem};

const MEAL_ITEM_COLUMNS: &str = "id, chef_id, name, description, price, created_at";

#[derive(sqlx::FromRow)]
struct MealItemRow {
    id: MealItemId,
    chef_id: UserId,
    name: String,
    description: Option<String>,
    price: Price,
    created_at: DateTime<Utc>,
}

impl From<MealItemRow> for MealItem {
    fn from(r: MealItemRow) -> Self {
        Self {
            id: r.id,
            chef_id: r.chef_id,
            name: r.name,
            description: r.description,
            price: r.price,
            created_at: r.created_at,
        }
    }
}

/// Repository for meal item database operations.
pub struct MealItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MealItemRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List meal items, optionally only those of one chef.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, chef_id: Option<UserId>) -> Result<Vec<MealItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, MealItemRow>(&format!(
            r"
            SELECT {MEAL_ITEM_COLUMNS}
            FROM meal_items
            WHERE $1::INTEGER IS NULL OR chef_id = $1
            ORDER BY id
            "
        ))
        .bind(chef_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(MealItem::from).collect())
    }

    /// Fetch the meal items with the given IDs. Unknown IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[MealItemId]) -> Result<Vec<MealItem>, RepositoryError> {
        let raw_ids: Vec<i32> = ids.iter().map(MealItemId::as_i32).collect();

        let rows = sqlx::query_as::<_, MealItemRow>(&format!(
            "SELECT {MEAL_ITEM_COLUMNS} FROM meal_items WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(&raw_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(MealItem::from).collect())
    }

    /// Insert a new meal item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, item: &NewMealItem) -> Result<MealItem, RepositoryError> {
        let row = sqlx::query_as::<_, MealItemRow>(&format!(
            r"
            INSERT INTO meal_items (chef_id, name, description, price)
            VALUES ($1, $2, $3, $4)
            RETURNING {MEAL_ITEM_COLUMNS}
            "
        ))
        .bind(item.chef_id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
