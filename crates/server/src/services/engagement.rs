//! Engagement service: loves and ratings.

use tracing::instrument;

use forkful_core::{RecipeId, Score, UserId};

use super::error::{Context, ServiceError};
use crate::db::{EngagementStore, RepositoryError};
use crate::models::{FoodRecipe, Rating, with_average_ratings};

/// Map store errors for writes that reference both a user and a recipe.
fn engagement_error(context: &'static str, e: RepositoryError) -> ServiceError {
    match e {
        RepositoryError::NotFound => ServiceError::NotFound {
            context: "find recipe",
        },
        RepositoryError::Conflict(_) => ServiceError::NotFound {
            context: "find user",
        },
        other => ServiceError::from_repository(context, other),
    }
}

/// Love and rating operations.
#[derive(Clone)]
pub struct EngagementService<E> {
    store: E,
}

impl<E: EngagementStore> EngagementService<E> {
    #[must_use]
    pub const fn new(store: E) -> Self {
        Self { store }
    }

    /// Love a recipe. Returns `true` if this created the love.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the recipe or the user's record
    /// does not exist.
    #[instrument(skip(self), fields(user = %user, recipe_id = %recipe))]
    pub async fn like(&self, user: &UserId, recipe: RecipeId) -> Result<bool, ServiceError> {
        self.store
            .like(user, recipe)
            .await
            .map_err(|e| engagement_error("like recipe", e))
    }

    /// Remove the love, if any. Returns `true` if one was removed.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` if storage fails.
    #[instrument(skip(self), fields(user = %user, recipe_id = %recipe))]
    pub async fn unlike(&self, user: &UserId, recipe: RecipeId) -> Result<bool, ServiceError> {
        self.store
            .unlike(user, recipe)
            .await
            .context("unlike recipe")
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` if storage fails.
    pub async fn has_loved(&self, user: &UserId, recipe: RecipeId) -> Result<bool, ServiceError> {
        self.store
            .has_loved(user, recipe)
            .await
            .context("check love")
    }

    /// Flip the love state and return the new one.
    ///
    /// The insert is conflict-aware, so two concurrent toggles can never
    /// leave two loves behind.
    ///
    /// # Errors
    ///
    /// Same as [`like`](Self::like).
    pub async fn toggle_love(&self, user: &UserId, recipe: RecipeId) -> Result<bool, ServiceError> {
        if self.like(user, recipe).await? {
            return Ok(true);
        }
        self.unlike(user, recipe).await?;
        Ok(false)
    }

    /// Recipes the user loved, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` if storage fails.
    pub async fn loved_recipes(&self, user: &UserId) -> Result<Vec<FoodRecipe>, ServiceError> {
        let recipes = self
            .store
            .loved_recipes(user)
            .await
            .context("get loved recipes")?;
        Ok(with_average_ratings(recipes))
    }

    /// Rate a recipe.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the score is not within
    /// 1.0–5.0, `ServiceError::NotFound` if the recipe or user is missing.
    #[instrument(skip(self), fields(user = %user, recipe_id = %recipe))]
    pub async fn rate(
        &self,
        user: &UserId,
        recipe: RecipeId,
        score: f64,
    ) -> Result<Rating, ServiceError> {
        let score = Score::new(score).map_err(|e| ServiceError::validation(e.to_string()))?;
        let rating = self
            .store
            .rate(user, recipe, score)
            .await
            .map_err(|e| engagement_error("rate recipe", e))?;

        tracing::info!(rating_id = %rating.id, "recipe rated");
        Ok(rating)
    }

    /// Ratings of a recipe, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the recipe does not exist.
    pub async fn ratings(&self, recipe: RecipeId) -> Result<Vec<Rating>, ServiceError> {
        if !self
            .store
            .recipe_exists(recipe)
            .await
            .context("find recipe")?
        {
            return Err(ServiceError::NotFound {
                context: "find recipe",
            });
        }
        self.store.ratings(recipe).await.context("list ratings")
    }
}
