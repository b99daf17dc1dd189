//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password signup/login and JWT issuing
//! - `orders` - Order placement and fulfillment
//! - `payments` - Payment intents (Stripe or offline)

pub mod auth;
pub mod orders;
pub mod payments;

pub use auth::{AuthError, AuthService, JwtService};
pub use orders::{OrderError, OrderService};
pub use payments::{PaymentError, PaymentGateway};
