//! Love and rating repository for database operations.
//!
//! `recipe_loves` carries a unique constraint on `(user_id, recipe_id)`, so
//! [`EngagementStore::like`] is a single conflict-aware insert rather than a
//! check followed by an insert.

use sqlx::PgPool;

use forkful_core::{RecipeId, Score, UserId};

use super::recipes::{RECIPE_SELECT, RatingRow, RecipeRow, hydrate};
use super::{EngagementStore, RepositoryError};
use crate::models::{FoodRecipe, Rating};

/// A dangling recipe reference is `NotFound`; a dangling user is `Conflict`.
fn map_missing_recipe(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        let constraint = db_err.constraint().unwrap_or("unknown");
        if constraint.contains("user_id") {
            return RepositoryError::Conflict(format!("engagement violates {constraint}"));
        }
        return RepositoryError::NotFound;
    }
    RepositoryError::Database(e)
}

/// Repository for love and rating database operations.
#[derive(Clone)]
pub struct EngagementRepository {
    pool: PgPool,
}

impl EngagementRepository {
    /// Create a new engagement repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl EngagementStore for EngagementRepository {
    async fn like(&self, user: &UserId, recipe: RecipeId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO recipe_loves (user_id, recipe_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, recipe_id) DO NOTHING
            ",
        )
        .bind(user.as_str())
        .bind(recipe.as_i32())
        .execute(&self.pool)
        .await
        .map_err(map_missing_recipe)?;

        Ok(result.rows_affected() == 1)
    }

    async fn unlike(&self, user: &UserId, recipe: RecipeId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM recipe_loves WHERE user_id = $1 AND recipe_id = $2")
            .bind(user.as_str())
            .bind(recipe.as_i32())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn has_loved(&self, user: &UserId, recipe: RecipeId) -> Result<bool, RepositoryError> {
        let loved: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM recipe_loves WHERE user_id = $1 AND recipe_id = $2
            )
            ",
        )
        .bind(user.as_str())
        .bind(recipe.as_i32())
        .fetch_one(&self.pool)
        .await?;

        Ok(loved)
    }

    async fn loved_recipes(&self, user: &UserId) -> Result<Vec<FoodRecipe>, RepositoryError> {
        let sql = format!(
            "{RECIPE_SELECT} JOIN recipe_loves l ON l.recipe_id = r.id \
             WHERE l.user_id = $1 ORDER BY l.created_at DESC, l.id DESC"
        );
        let rows = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(user.as_str())
            .fetch_all(&self.pool)
            .await?;

        hydrate(&self.pool, rows).await
    }

    async fn rate(
        &self,
        user: &UserId,
        recipe: RecipeId,
        score: Score,
    ) -> Result<Rating, RepositoryError> {
        let row = sqlx::query_as::<_, RatingRow>(
            r"
            INSERT INTO ratings (food_recipe_id, user_id, score)
            VALUES ($1, $2, $3)
            RETURNING id, food_recipe_id, user_id, score, created_at
            ",
        )
        .bind(recipe.as_i32())
        .bind(user.as_str())
        .bind(score.value())
        .fetch_one(&self.pool)
        .await
        .map_err(map_missing_recipe)?;

        row.try_into()
    }

    async fn ratings(&self, recipe: RecipeId) -> Result<Vec<Rating>, RepositoryError> {
        let rows = sqlx::query_as::<_, RatingRow>(
            r"
            SELECT id, food_recipe_id, user_id, score, created_at
            FROM ratings
            WHERE food_recipe_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(recipe.as_i32())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn recipe_exists(&self, recipe: RecipeId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM food_recipes WHERE id = $1)")
                .bind(recipe.as_i32())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}
