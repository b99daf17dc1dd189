//! CLI subcommands.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Database URL from `BLUEJAY_DATABASE_URL`, falling back to `DATABASE_URL`.
pub(crate) fn database_url() -> Result<SecretString, &'static str> {
    dotenvy::dotenv().ok();

    std::env::var("BLUEJAY_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "BLUEJAY_DATABASE_URL (or DATABASE_URL) not set")
}
