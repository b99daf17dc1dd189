//! Chef view over a user row.

use std::fmt;

use super::User;

/// Tried to treat a customer as a chef.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("user is not a chef")]
pub struct NotAChef;

/// A user whose role is [`Role::Chef`](bluejay_core::Role::Chef).
#[derive(Debug, Clone, PartialEq)]
pub struct Chef(User);

impl Chef {
    /// The underlying user row.
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.0
    }
}

impl TryFrom<User> for Chef {
    type Error = NotAChef;

    fn try_from(user: User) -> Result<Self, Self::Error> {
        if user.is_chef() {
            Ok(Self(user))
        } else {
            Err(NotAChef)
        }
    }
}

impl fmt::Display for Chef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Chef #{}: {}>", self.0.id, self.0.name)
    }
}
