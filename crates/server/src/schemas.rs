//! JSON views of the domain models.
//!
//! Field names are camelCase. Password hashes are never part of a schema,
//! and an order's `clientSecret` is only included in the response that
//! creates it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bluejay_core::{MealItemId, OrderId, Price, UserId};

use crate::models::{Chef, MealItem, Order, OrderLine, User};

/// A user as returned by `/users` and `/users/login`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSchema {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub is_chef: bool,
    pub address: Option<String>,
    pub about_me: Option<String>,
    pub chef_profile: Option<String>,
    pub chef_cuisine: Option<String>,
    pub cuisines: Vec<String>,
    pub profile_image: Option<String>,
    pub general_location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserSchema {
    fn from(user: &User) -> Self {
        let profile = &user.profile;
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.to_string(),
            is_chef: user.is_chef(),
            address: profile.address.clone(),
            about_me: profile.about_me.clone(),
            chef_profile: profile.chef_profile.clone(),
            chef_cuisine: profile.chef_cuisine.clone(),
            cuisines: profile.cuisines.clone(),
            profile_image: profile.profile_image.clone(),
            general_location: profile.general_location.clone(),
            latitude: profile.coordinates.map(|c| c.latitude),
            longitude: profile.coordinates.map(|c| c.longitude),
            created_at: user.created_at,
        }
    }
}

/// A chef as listed by `/chefs`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChefSchema {
    pub id: UserId,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub is_chef: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chef_profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chef_cuisine: Option<String>,
    pub cuisines: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_location: Option<String>,
}

impl From<&Chef> for ChefSchema {
    fn from(chef: &Chef) -> Self {
        let user = chef.user();
        let profile = &user.profile;
        Self {
            id: user.id,
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.to_string(),
            is_chef: true,
            chef_profile: profile.chef_profile.clone(),
            chef_cuisine: profile.chef_cuisine.clone(),
            cuisines: profile.cuisines.clone(),
            profile_image: profile.profile_image.clone(),
            general_location: profile.general_location.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealItemSchema {
    pub id: MealItemId,
    pub chef_id: UserId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Price,
    pub created_at: DateTime<Utc>,
}

impl From<&MealItem> for MealItemSchema {
    fn from(item: &MealItem) -> Self {
        Self {
            id: item.id,
            chef_id: item.chef_id,
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineSchema {
    pub meal_item_id: MealItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub subtotal: Price,
}

impl From<&OrderLine> for OrderLineSchema {
    fn from(line: &OrderLine) -> Self {
        Self {
            meal_item_id: line.meal_item_id,
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal: line.subtotal(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSchema {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Price,
    pub is_fulfilled: bool,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderLineSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl OrderSchema {
    /// Include the client secret. Only for the order's creator, right after
    /// placing it.
    #[must_use]
    pub fn with_client_secret(order: &Order) -> Self {
        Self {
            client_secret: Some(order.client_secret.expose().to_string()),
            ..Self::from(order)
        }
    }
}

impl From<&Order> for OrderSchema {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            total: order.total,
            is_fulfilled: order.status.is_fulfilled(),
            fulfilled_at: order.fulfilled_at,
            created_at: order.created_at,
            items: order.lines.iter().map(OrderLineSchema::from).collect(),
            client_secret: None,
        }
    }
}

/// `{"message": "..."}`
#[derive(Debug, Clone, Serialize)]
pub struct MessageSchema {
    pub message: &'static str,
}

impl MessageSchema {
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bluejay_core::{Email, FulfillmentStatus, Role};
    use serde_json::{Value, json};

    use super::*;
    use crate::models::{ClientSecret, Coordinates, Profile};

    fn user(role: Role) -> User {
        User {
            id: UserId::new(3),
            name: "Ada".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
            role,
            profile: Profile::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order() -> Order {
        Order {
            id: OrderId::new(11),
            user_id: UserId::new(3),
            client_secret: ClientSecret::new("pi_9_secret_z".to_string()),
            total: Price::from_cents(2400),
            status: FulfillmentStatus::Unfulfilled,
            fulfilled_at: None,
            created_at: Utc::now(),
            lines: vec![OrderLine {
                meal_item_id: MealItemId::new(5),
                name: "Dumplings".to_string(),
                quantity: 3,
                unit_price: Price::from_cents(800),
            }],
        }
    }

    #[test]
    fn test_user_schema_camel_case() {
        let value = serde_json::to_value(UserSchema::from(&user(Role::Chef))).unwrap();
        assert_eq!(value["isChef"], json!(true));
        assert_eq!(value["email"], json!("ada@example.com"));
        assert!(value.get("password").is_none());
        assert!(value.get("passwordHash").is_none());
    }

    #[test]
    fn test_chef_schema() {
        let chef = Chef::try_from(user(Role::Chef)).unwrap();
        let value = serde_json::to_value(ChefSchema::from(&chef)).unwrap();
        assert_eq!(value["id"], json!(3));
        assert_eq!(value["userId"], json!(3));
        assert_eq!(value["isChef"], json!(true));
        assert_eq!(value["cuisines"], json!([]));
        assert!(value.get("chefProfile").is_none());
    }

    #[test]
    fn test_user_schema_profile_fields() {
        let mut chef = user(Role::Chef);
        chef.profile = Profile {
            about_me: Some("Cooks on weekends".to_string()),
            chef_cuisine: Some("Sichuan".to_string()),
            cuisines: vec!["Sichuan".to_string(), "Cantonese".to_string()],
            coordinates: Some(Coordinates {
                latitude: 37.77,
                longitude: -122.42,
            }),
            ..Profile::default()
        };

        let value = serde_json::to_value(UserSchema::from(&chef)).unwrap();
        assert_eq!(value["aboutMe"], json!("Cooks on weekends"));
        assert_eq!(value["chefCuisine"], json!("Sichuan"));
        assert_eq!(value["cuisines"], json!(["Sichuan", "Cantonese"]));
        assert_eq!(value["latitude"], json!(37.77));
        assert_eq!(value["longitude"], json!(-122.42));
        assert_eq!(value["address"], Value::Null);
    }

    #[test]
    fn test_order_schema_fields() {
        let order = order();
        let value = serde_json::to_value(OrderSchema::from(&order)).unwrap();

        assert_eq!(value["id"], json!(11));
        assert_eq!(value["userId"], json!(3));
        assert_eq!(value["total"], json!("24.00"));
        assert_eq!(value["isFulfilled"], json!(false));
        assert_eq!(value["fulfilledAt"], Value::Null);
        assert_eq!(value["items"][0]["quantity"], json!(3));
        assert_eq!(value["items"][0]["subtotal"], json!("24.00"));
        assert!(value.get("clientSecret").is_none());
    }

    #[test]
    fn test_order_schema_with_secret() {
        let value = serde_json::to_value(OrderSchema::with_client_secret(&order())).unwrap();
        assert_eq!(value["clientSecret"], json!("pi_9_secret_z"));
    }

    #[test]
    fn test_meal_item_description_optional() {
        let item = MealItem {
            id: MealItemId::new(1),
            chef_id: UserId::new(3),
            name: "Soup".to_string(),
            description: None,
            price: Price::from_cents(500),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(MealItemSchema::from(&item)).unwrap();
        assert!(value.get("description").is_none());
        assert_eq!(value["price"], json!("5.00"));
    }
}
