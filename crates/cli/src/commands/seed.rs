//! Seed the database with chefs and their meal items.
//!
//! The YAML file lists chefs, each with a menu:
//!
//! ```yaml
//! chefs:
//!   - name: Gordon
//!     email: gordon@kitchen.io
//!     password: beef-wellington
//!     meal_items:
//!       - name: Beef Wellington
//!         description: With mushroom duxelles
//!         price: "24.50"
//! ```
//!
//! Chefs whose email already exists are skipped together with their menu, so
//! running the same file twice does not duplicate anything.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info, warn};

use bluejay_core::{Email, Price, Role};
use bluejay_server::db::{self, MealItemRepository};
use bluejay_server::models::NewMealItem;
use bluejay_server::services::auth::{AuthError, AuthService, Signup};

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub chefs: Vec<SeedChef>,
}

#[derive(Debug, Deserialize)]
pub struct SeedChef {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub meal_items: Vec<SeedMealItem>,
}

#[derive(Debug, Deserialize)]
pub struct SeedMealItem {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
}

/// Summary of a seeding run.
#[derive(Debug, Default)]
pub struct SeedResult {
    pub chefs_created: usize,
    pub chefs_skipped: usize,
    pub meal_items_created: usize,
}

/// Problems that would make the seed fail halfway; checked before connecting.
#[must_use]
pub fn validate(seed: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut emails = std::collections::HashSet::new();

    for (i, chef) in seed.chefs.iter().enumerate() {
        if chef.name.trim().is_empty() {
            errors.push(format!("chefs[{i}]: name is empty"));
        }
        match Email::parse(&chef.email) {
            Ok(email) => {
                if !emails.insert(email.into_inner()) {
                    errors.push(format!("chefs[{i}]: duplicate email {}", chef.email));
                }
            }
            Err(e) => errors.push(format!("chefs[{i}]: {e}")),
        }
        if chef.password.len() < 8 {
            errors.push(format!("chefs[{i}]: password must be at least 8 characters"));
        }
        for (j, item) in chef.meal_items.iter().enumerate() {
            if item.name.trim().is_empty() {
                errors.push(format!("chefs[{i}].meal_items[{j}]: name is empty"));
            }
        }
    }

    errors
}

/// Seed chefs and meal items from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database operation fails.
pub async fn run(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let database_url = super::database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let auth = AuthService::new(&pool);
    let meal_items = MealItemRepository::new(&pool);
    let mut result = SeedResult::default();

    for chef in &seed.chefs {
        let signup = Signup {
            name: &chef.name,
            email: &chef.email,
            password: &chef.password,
            confirm_password: None,
            role: Role::Chef,
        };

        let user = match auth.register(signup).await {
            Ok(user) => user,
            Err(AuthError::UserAlreadyExists) => {
                warn!(email = %chef.email, "Chef already exists, skipping");
                result.chefs_skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        result.chefs_created += 1;

        for item in &chef.meal_items {
            meal_items
                .create(&NewMealItem {
                    chef_id: user.id,
                    name: item.name.trim().to_string(),
                    description: item.description.clone(),
                    price: item.price,
                })
                .await?;
            result.meal_items_created += 1;
        }
    }

    info!("Seeding complete!");
    info!("  Chefs created: {}", result.chefs_created);
    info!("  Chefs skipped (already exist): {}", result.chefs_skipped);
    info!("  Meal items created: {}", result.meal_items_created);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"
chefs:
  - name: Gordon
    email: gordon@kitchen.io
    password: beef-wellington
    meal_items:
      - name: Beef Wellington
        price: "24.50"
      - name: Risotto
        description: Mushroom
        price: "18"
  - name: Nigella
    email: nigella@kitchen.io
    password: chocolate-cake
"#;

    fn parse(yaml: &str) -> SeedFile {
        serde_yaml::from_str(yaml).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn test_parse_seed_file() {
        let seed = parse(SEED);
        assert_eq!(seed.chefs.len(), 2);
        assert_eq!(seed.chefs[0].meal_items.len(), 2);
        assert_eq!(seed.chefs[0].meal_items[0].price.to_string(), "24.50");
        assert!(seed.chefs[1].meal_items.is_empty());
        assert!(validate(&seed).is_empty());
    }

    #[test]
    fn test_negative_price_rejected_at_parse() {
        let yaml = r#"
chefs:
  - name: A
    email: a@b.io
    password: longenough
    meal_items:
      - name: X
        price: "-1"
"#;
        assert!(serde_yaml::from_str::<SeedFile>(yaml).is_err());
    }

    #[test]
    fn test_validate_reports_problems() {
        let yaml = r#"
chefs:
  - name: ""
    email: not-an-email
    password: short
  - name: B
    email: Dup@Kitchen.io
    password: longenough
  - name: C
    email: dup@kitchen.io
    password: longenough
"#;
        let errors = validate(&parse(yaml));
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("duplicate email")));
    }
}
