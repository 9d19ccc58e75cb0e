//! Seed lookup tables.
//!
//! Inserts the difficulty and cooking duration names a fresh database needs
//! before recipes can be created. Existing rows are left alone, so the
//! command can be re-run safely.

use tracing::info;

use forkful_server::config;
use forkful_server::db::{self, lookups as lookup_tables};

use super::CommandError;

/// Seed `difficulties` and `cooking_durations`.
///
/// # Errors
///
/// Returns an error if the database URL is missing or an insert fails.
pub async fn lookups() -> Result<(), CommandError> {
    let database_url = config::database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let seeded = lookup_tables::seed(&pool).await?;

    info!("Seeding complete!");
    info!("  Difficulties inserted: {}", seeded.difficulties);
    info!("  Cooking durations inserted: {}", seeded.cooking_durations);
    Ok(())
}
