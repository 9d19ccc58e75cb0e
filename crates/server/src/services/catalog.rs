//! Recipe catalog service.
//!
//! Validates input, delegates to a [`RecipeStore`] and applies the average
//! rating to everything it returns.

use tracing::instrument;

use forkful_core::{RecipeId, UserId};

use super::error::{Context, ServiceError};
use crate::db::{RecipeStore, RepositoryError};
use crate::models::{
    CookingDuration, Difficulty, FoodRecipe, FoodRecipeChanges, FoodRecipeQuery, NewFoodRecipe,
    is_http_url, with_average_ratings,
};

/// One page of search results plus the total match count.
#[derive(Debug, Clone)]
pub struct RecipePage {
    pub results: Vec<FoodRecipe>,
    pub total: i64,
}

/// Recipe catalog operations.
#[derive(Clone)]
pub struct CatalogService<S> {
    store: S,
}

impl<S: RecipeStore> CatalogService<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a recipe and return it fully resolved.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a blank name, a non-positive
    /// lookup id, a bad image URL, or a difficulty/cooking duration/owner
    /// that does not exist.
    #[instrument(skip(self, recipe), fields(owner = %recipe.owner_id))]
    pub async fn create(&self, mut recipe: NewFoodRecipe) -> Result<FoodRecipe, ServiceError> {
        recipe.name = validate_name(&recipe.name)?;
        recipe.image_url = normalize_image_url(recipe.image_url)?;
        if recipe.difficulty_id.as_i32() <= 0 {
            return Err(ServiceError::validation("difficultyId must be positive"));
        }
        if recipe.cooking_duration_id.as_i32() <= 0 {
            return Err(ServiceError::validation("cookingDurationId must be positive"));
        }

        let created = self.store.create(&recipe).await.map_err(|e| match e {
            RepositoryError::Conflict(detail) => {
                tracing::debug!(%detail, "recipe references unknown row");
                ServiceError::validation(
                    "unknown difficulty, cooking duration or owner; sync the profile first",
                )
            }
            other => ServiceError::from_repository("create recipe", other),
        })?;

        tracing::info!(recipe_id = %created.id, "recipe created");
        Ok(created.with_average_rating())
    }

    /// One page of recipes ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` if storage fails.
    pub async fn search(&self, query: &FoodRecipeQuery) -> Result<Vec<FoodRecipe>, ServiceError> {
        let recipes = self.store.search(query).await.context("search recipes")?;
        Ok(with_average_ratings(recipes))
    }

    /// Number of recipes matching the query's search term.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` if storage fails.
    pub async fn count(&self, query: &FoodRecipeQuery) -> Result<i64, ServiceError> {
        self.store.count(query).await.context("count recipes")
    }

    /// [`search`](Self::search) and [`count`](Self::count) together.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` if storage fails.
    pub async fn search_page(&self, query: &FoodRecipeQuery) -> Result<RecipePage, ServiceError> {
        let results = self.search(query).await?;
        let total = self.count(query).await?;
        Ok(RecipePage { results, total })
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the recipe does not exist.
    pub async fn get_by_id(&self, id: RecipeId) -> Result<FoodRecipe, ServiceError> {
        self.store
            .get_by_id(id)
            .await
            .context("find recipe")?
            .map(FoodRecipe::with_average_rating)
            .ok_or(ServiceError::NotFound {
                context: "find recipe",
            })
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if nothing would change or a field
    /// is invalid, `ServiceError::NotFound` if the recipe does not exist.
    #[instrument(skip(self, changes), fields(recipe_id = %id))]
    pub async fn update(
        &self,
        id: RecipeId,
        mut changes: FoodRecipeChanges,
    ) -> Result<FoodRecipe, ServiceError> {
        if changes.is_empty() {
            return Err(ServiceError::validation("no fields to update"));
        }
        if let Some(name) = &changes.name {
            changes.name = Some(validate_name(name)?);
        }
        if let Some(url) = changes.image_url.take() {
            // Empty string clears the stored image
            changes.image_url = Some(normalize_image_url(Some(url))?.unwrap_or_default());
        }

        let updated = self.store.update(id, &changes).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                ServiceError::validation("unknown difficulty or cooking duration")
            }
            other => ServiceError::from_repository("update recipe", other),
        })?;

        Ok(updated.with_average_rating())
    }

    /// Delete a recipe. Deleting a missing recipe is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` if storage fails.
    #[instrument(skip(self), fields(recipe_id = %id))]
    pub async fn delete(&self, id: RecipeId) -> Result<(), ServiceError> {
        let removed = self.store.delete(id).await.context("delete recipe")?;
        if removed {
            tracing::info!("recipe deleted");
        }
        Ok(())
    }

    /// Recipes owned by `owner`, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` if storage fails.
    pub async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<FoodRecipe>, ServiceError> {
        let recipes = self.store.list_by_owner(owner).await.context("get recipes")?;
        Ok(with_average_ratings(recipes))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` if storage fails.
    pub async fn difficulties(&self) -> Result<Vec<Difficulty>, ServiceError> {
        self.store.difficulties().await.context("list difficulties")
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` if storage fails.
    pub async fn cooking_durations(&self) -> Result<Vec<CookingDuration>, ServiceError> {
        self.store
            .cooking_durations()
            .await
            .context("list cooking durations")
    }
}

fn validate_name(name: &str) -> Result<String, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::validation("name is required"));
    }
    Ok(name.to_owned())
}

/// Blank becomes `None`; anything else must be an http(s) URL.
fn normalize_image_url(url: Option<String>) -> Result<Option<String>, ServiceError> {
    match url.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(url) if is_http_url(url) => Ok(Some(url.to_owned())),
        Some(_) => Err(ServiceError::validation(
            "imageUrl must be an absolute http(s) URL",
        )),
    }
}
