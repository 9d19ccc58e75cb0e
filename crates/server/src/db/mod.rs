//! Database operations for the recipe catalog.
//!
//! # Database: `forkful`
//!
//! ## Tables
//!
//! - `users` - Local mirror of identity-provider accounts
//! - `difficulties` / `cooking_durations` - Lookup tables
//! - `food_recipes` - Recipes, owned by a user
//! - `ratings` - Scores left on recipes
//! - `recipe_loves` - Favorites, unique per (user, recipe)
//!
//! # Stores
//!
//! Business logic talks to storage through the [`RecipeStore`],
//! [`EngagementStore`] and [`UserStore`] traits. The `PostgreSQL`
//! repositories in this module implement them for production; [`MemoryStore`]
//! implements them in-process with the same semantics.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p forkful-cli -- migrate
//! ```

pub mod engagement;
pub mod memory;
pub mod recipes;
pub mod users;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use forkful_core::{RecipeId, Score, UserId};

use crate::models::{
    CookingDuration, Difficulty, FoodRecipe, FoodRecipeChanges, FoodRecipeQuery, NewFoodRecipe,
    ProfileUpdate, Rating, User,
};

pub use engagement::EngagementRepository;
pub use memory::MemoryStore;
pub use recipes::RecipeRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unknown lookup id).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Lookup rows seeded into a fresh database.
pub mod lookups {
    use sqlx::PgPool;

    /// Difficulty names, in id order.
    pub const DIFFICULTIES: &[&str] = &["Easy", "Medium", "Hard"];

    /// Cooking duration names (minutes), in id order.
    pub const COOKING_DURATIONS: &[&str] = &["5 - 10", "11 - 30", "31 - 60", "60+"];

    /// Rows inserted by [`seed`].
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Seeded {
        pub difficulties: u64,
        pub cooking_durations: u64,
    }

    /// Insert every lookup name in one transaction. Existing rows are left
    /// alone, so seeding can be re-run.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if an insert fails.
    pub async fn seed(pool: &PgPool) -> Result<Seeded, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut seeded = Seeded::default();

        for name in DIFFICULTIES {
            seeded.difficulties += sqlx::query(
                "INSERT INTO difficulties (name) VALUES ($1) ON CONFLICT (name) DO NOTHING",
            )
            .bind(name)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        for name in COOKING_DURATIONS {
            seeded.cooking_durations += sqlx::query(
                "INSERT INTO cooking_durations (name) VALUES ($1) ON CONFLICT (name) DO NOTHING",
            )
            .bind(name)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        Ok(seeded)
    }
}

/// Recipe persistence.
pub trait RecipeStore: Send + Sync {
    /// Insert a recipe and return it with associations resolved.
    ///
    /// Fails with `Conflict` when the difficulty, cooking duration or owner
    /// does not exist.
    fn create(
        &self,
        recipe: &NewFoodRecipe,
    ) -> impl Future<Output = Result<FoodRecipe, RepositoryError>> + Send;

    /// One page of recipes ordered by name, filtered by the search term.
    fn search(
        &self,
        query: &FoodRecipeQuery,
    ) -> impl Future<Output = Result<Vec<FoodRecipe>, RepositoryError>> + Send;

    /// Number of recipes matching the query's search term (ignores paging).
    fn count(
        &self,
        query: &FoodRecipeQuery,
    ) -> impl Future<Output = Result<i64, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: RecipeId,
    ) -> impl Future<Output = Result<Option<FoodRecipe>, RepositoryError>> + Send;

    /// Apply a partial update, then re-read.
    ///
    /// Fails with `NotFound` if the recipe does not exist.
    fn update(
        &self,
        id: RecipeId,
        changes: &FoodRecipeChanges,
    ) -> impl Future<Output = Result<FoodRecipe, RepositoryError>> + Send;

    /// Returns whether a row was removed.
    fn delete(&self, id: RecipeId) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// All recipes owned by `owner`, ordered by name.
    fn list_by_owner(
        &self,
        owner: &UserId,
    ) -> impl Future<Output = Result<Vec<FoodRecipe>, RepositoryError>> + Send;

    fn difficulties(&self)
    -> impl Future<Output = Result<Vec<Difficulty>, RepositoryError>> + Send;

    fn cooking_durations(
        &self,
    ) -> impl Future<Output = Result<Vec<CookingDuration>, RepositoryError>> + Send;
}

/// Love and rating persistence.
pub trait EngagementStore: Send + Sync {
    /// Insert a love unless one already exists.
    ///
    /// Returns `true` if a row was inserted. Fails with `NotFound` when the
    /// recipe does not exist and `Conflict` when the user does not.
    fn like(
        &self,
        user: &UserId,
        recipe: RecipeId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Remove every love for the pair. Returns `true` if anything was removed.
    fn unlike(
        &self,
        user: &UserId,
        recipe: RecipeId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    fn has_loved(
        &self,
        user: &UserId,
        recipe: RecipeId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Recipes loved by `user`, most recently loved first.
    fn loved_recipes(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Result<Vec<FoodRecipe>, RepositoryError>> + Send;

    /// Record a rating. Fails like [`EngagementStore::like`] on dangling ids.
    fn rate(
        &self,
        user: &UserId,
        recipe: RecipeId,
        score: Score,
    ) -> impl Future<Output = Result<Rating, RepositoryError>> + Send;

    /// Ratings of a recipe, newest first.
    fn ratings(
        &self,
        recipe: RecipeId,
    ) -> impl Future<Output = Result<Vec<Rating>, RepositoryError>> + Send;

    fn recipe_exists(
        &self,
        recipe: RecipeId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

/// User persistence.
pub trait UserStore: Send + Sync {
    /// Look up a live (not soft-deleted) user.
    fn get_by_id(
        &self,
        id: &UserId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Insert or replace the user keyed by id, keeping the original
    /// `created_at`.
    fn upsert(&self, user: &User) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// Apply a profile update and flag the changed fields as user-chosen.
    ///
    /// Fails with `NotFound` if no live user has this id.
    fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// A full set of stores sharing one backing database.
///
/// Application state is generic over this so the HTTP layer can run against
/// `PostgreSQL` in production and [`MemoryStore`] in tests.
pub trait Backend: Clone + Send + Sync + 'static {
    type Recipes: RecipeStore;
    type Engagement: EngagementStore;
    type Users: UserStore;

    fn recipes(&self) -> Self::Recipes;
    fn engagement(&self) -> Self::Engagement;
    fn users(&self) -> Self::Users;

    /// Whether the backing database is reachable.
    fn is_ready(&self) -> impl Future<Output = bool> + Send;
}

/// `PostgreSQL`-backed stores.
#[derive(Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl Backend for PgBackend {
    type Recipes = RecipeRepository;
    type Engagement = EngagementRepository;
    type Users = UserRepository;

    fn recipes(&self) -> RecipeRepository {
        RecipeRepository::new(self.pool.clone())
    }

    fn engagement(&self) -> EngagementRepository {
        EngagementRepository::new(self.pool.clone())
    }

    fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    async fn is_ready(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map insert/update failures, turning constraint violations into `Conflict`.
pub(crate) fn map_write_error(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && (db_err.is_foreign_key_violation() || db_err.is_unique_violation())
    {
        let constraint = db_err.constraint().unwrap_or("unknown");
        return RepositoryError::Conflict(format!("{what} violates {constraint}"));
    }
    RepositoryError::Database(e)
}

/// Escape `%`, `_` and `\` so user text matches literally inside `LIKE`.
#[must_use]
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
