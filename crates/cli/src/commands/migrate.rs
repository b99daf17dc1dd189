//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! bluejay-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `BLUEJAY_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/server/migrations/` and are embedded into the
//! server library at build time.

use tracing::info;

use bluejay_server::db;

/// Run the server's database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails, or
/// a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;

    info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running migrations...");
    db::run_migrations(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
