//! Domain models.
//!
//! These types represent validated rows, separate from the serialized
//! schemas in [`crate::schemas`].

pub mod chef;
pub mod meal_item;
pub mod order;
pub mod user;

pub use chef::{Chef, NotAChef};
pub use meal_item::{MealItem, NewMealItem};
pub use order::{ClientSecret, NewOrderLine, Order, OrderLine};
pub use user::{Coordinates, NewUser, Profile, User};
