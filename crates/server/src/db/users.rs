//! User repository for database operations.
//!
//! Chefs live in the same table; [`UserRepository::list_chefs`] is the only
//! place that filters on the role.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bluejay_core::{Email, Role, UserId};

use super::RepositoryError;
use crate::models::{Chef, Coordinates, NewUser, Profile, User};

/// Columns selected for a [`User`].
const USER_COLUMNS: &str = "id, name, email, role, address, about_me, chef_profile, \
    chef_cuisine, cuisines, profile_image, general_location, latitude, longitude, \
    created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    role: Role,
    address: Option<String>,
    about_me: Option<String>,
    chef_profile: Option<String>,
    chef_cuisine: Option<String>,
    cuisines: Vec<String>,
    profile_image: Option<String>,
    general_location: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        let coordinates = match (r.latitude, r.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            (None, None) => None,
            _ => {
                return Err(RepositoryError::DataCorruption(format!(
                    "user {} has only one coordinate",
                    r.id
                )));
            }
        };

        Ok(Self {
            id: r.id,
            name: r.name,
            email,
            role: r.role,
            profile: Profile {
                address: r.address,
                about_me: r.about_me,
                chef_profile: r.chef_profile,
                chef_cuisine: r.chef_cuisine,
                cuisines: r.cuisines,
                profile_image: r.profile_image,
                general_location: r.general_location,
                coordinates,
            },
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user together with their password hash, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithPasswordRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        Ok(Some((User::try_from(r.user)?, r.password_hash)))
    }

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "email"))?;

        User::try_from(row)
    }

    /// Replace a user's name, email and profile details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the email belongs to another user.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        email: &Email,
        profile: &Profile,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            UPDATE users
            SET name = $2, email = $3, address = $4, about_me = $5,
                chef_profile = $6, chef_cuisine = $7, cuisines = $8,
                profile_image = $9, general_location = $10,
                latitude = $11, longitude = $12, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(&profile.address)
        .bind(&profile.about_me)
        .bind(&profile.chef_profile)
        .bind(&profile.chef_cuisine)
        .bind(&profile.cuisines)
        .bind(&profile.profile_image)
        .bind(&profile.general_location)
        .bind(profile.coordinates.map(|c| c.latitude))
        .bind(profile.coordinates.map(|c| c.longitude))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "email"))?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(row)
    }

    /// List every chef, ordered by ID. Customers are never returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_chefs(&self) -> Result<Vec<Chef>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY id"
        ))
        .bind(Role::Chef)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let user = User::try_from(row)?;
                Chef::try_from(user).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
            })
            .collect()
    }
}
