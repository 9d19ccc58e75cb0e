//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! forkful migrate
//! ```
//!
//! # Environment Variables
//!
//! - `FORKFUL_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/server/migrations/`:
//! ```text
//! migrations/
//! ├── 20261018000001_create_users.sql
//! ├── 20261018000002_create_lookups.sql
//! ├── 20261018000003_create_food_recipes.sql
//! └── 20261018000004_create_engagement.sql
//! ```

use forkful_server::{config, db};

use super::CommandError;

/// Run all pending server migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails, or
/// a migration fails to apply.
pub async fn run() -> Result<(), CommandError> {
    let database_url = config::database_url()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
