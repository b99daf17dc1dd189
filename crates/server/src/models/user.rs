//! User domain types.

use chrono::{DateTime, Utc};

use bluejay_core::{Email, Role, UserId};

/// A registered user (customer or chef).
///
/// The password hash is deliberately absent; it is only ever loaded by the
/// login query.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: Email,
    /// Customer or chef.
    pub role: Role,
    /// Optional details edited from the account page.
    pub profile: Profile,
    /// When the user signed up.
    pub created_at: DateTime<Utc>,
    /// When the profile was last changed.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this user is a chef.
    #[must_use]
    pub const fn is_chef(&self) -> bool {
        self.role.is_chef()
    }
}

/// Free-form profile details. Every field may be empty.
///
/// `chef_profile`, `chef_cuisine` and `cuisines` are only ever set for chefs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub address: Option<String>,
    pub about_me: Option<String>,
    /// Longer introduction shown on the chef's page.
    pub chef_profile: Option<String>,
    /// Headline cuisine, e.g. "Sichuan".
    pub chef_cuisine: Option<String>,
    /// Cuisines the chef cooks, unique ignoring case, in the order given.
    pub cuisines: Vec<String>,
    /// Absolute `http(s)` URL.
    pub profile_image: Option<String>,
    /// Coarse, human-readable area such as a neighbourhood.
    pub general_location: Option<String>,
    pub coordinates: Option<Coordinates>,
}

/// A WGS84 point. Latitude is within ±90, longitude within ±180.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Validated signup data, ready to insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub role: Role,
}
