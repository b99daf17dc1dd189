//! User roles.
//!
//! A chef is a user with the `chef` role; there is no separate chef table.

use serde::{Deserialize, Serialize};

/// The role a user account plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Orders meals.
    #[default]
    Customer,
    /// Publishes meal items and cooks orders.
    Chef,
}

impl Role {
    /// Pick the role from the signup form's chef checkbox.
    #[must_use]
    pub const fn from_is_chef(is_chef: bool) -> Self {
        if is_chef { Self::Chef } else { Self::Customer }
    }

    /// Whether this is the chef role.
    #[must_use]
    pub const fn is_chef(self) -> bool {
        matches!(self, Self::Chef)
    }

    /// The database / token representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Chef => "chef",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "chef" => Ok(Self::Chef),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_is_chef() {
        assert_eq!(Role::from_is_chef(true), Role::Chef);
        assert_eq!(Role::from_is_chef(false), Role::Customer);
        assert!(Role::Chef.is_chef());
        assert!(!Role::Customer.is_chef());
    }

    #[test]
    fn test_string_forms_agree() {
        for role in [Role::Customer, Role::Chef] {
            let parsed: Role = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
            assert_eq!(
                serde_json::to_string(&role).unwrap(),
                format!("\"{role}\"")
            );
        }
        assert!("admin".parse::<Role>().is_err());
    }
}
