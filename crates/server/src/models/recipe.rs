//! Food recipe domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use forkful_core::{CookingDurationId, DifficultyId, RecipeId, UserId};

use super::engagement::{Rating, RecipeLove, average_rating};

/// Difficulty lookup entry (e.g. "Easy").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Difficulty {
    pub id: DifficultyId,
    pub name: String,
}

/// Cooking duration lookup entry (e.g. "11 - 30").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CookingDuration {
    pub id: CookingDurationId,
    pub name: String,
}

/// The owner of a recipe, as shown alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeOwner {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub nick_name: String,
    pub image_profile_url: String,
}

/// A food recipe with its associations resolved.
#[derive(Debug, Clone)]
pub struct FoodRecipe {
    /// Server-assigned, immutable.
    pub id: RecipeId,
    pub name: String,
    pub description: String,
    pub ingredient: String,
    pub instruction: String,
    pub image_url: Option<String>,
    pub difficulty: Difficulty,
    pub cooking_duration: CookingDuration,
    pub owner: RecipeOwner,
    /// Ratings, newest first.
    pub ratings: Vec<Rating>,
    pub loves: Vec<RecipeLove>,
    /// Mean of `ratings`; filled in by [`FoodRecipe::with_average_rating`].
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FoodRecipe {
    /// Compute `average_rating` from the loaded ratings.
    #[must_use]
    pub fn with_average_rating(mut self) -> Self {
        self.average_rating = average_rating(&self.ratings);
        self
    }

    /// Whether `user` owns this recipe.
    #[must_use]
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner.id == *user
    }
}

/// Apply [`FoodRecipe::with_average_rating`] to a whole sequence.
#[must_use]
pub fn with_average_ratings(recipes: Vec<FoodRecipe>) -> Vec<FoodRecipe> {
    recipes
        .into_iter()
        .map(FoodRecipe::with_average_rating)
        .collect()
}

/// Fields for a recipe that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewFoodRecipe {
    pub name: String,
    pub description: String,
    pub ingredient: String,
    pub instruction: String,
    pub image_url: Option<String>,
    pub difficulty_id: DifficultyId,
    pub cooking_duration_id: CookingDurationId,
    pub owner_id: UserId,
}

/// A partial update. `None` leaves the stored value untouched; an empty
/// `image_url` clears the image.
#[derive(Debug, Clone, Default)]
pub struct FoodRecipeChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub ingredient: Option<String>,
    pub instruction: Option<String>,
    pub image_url: Option<String>,
    pub difficulty_id: Option<DifficultyId>,
    pub cooking_duration_id: Option<CookingDurationId>,
}

impl FoodRecipeChanges {
    /// True when no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.ingredient.is_none()
            && self.instruction.is_none()
            && self.image_url.is_none()
            && self.difficulty_id.is_none()
            && self.cooking_duration_id.is_none()
    }
}

/// Search and pagination parameters for listing recipes.
///
/// Pages are 1-based. Out-of-range values are normalized rather than
/// rejected: a page below 1 becomes 1 and the limit is clamped to
/// `1..=MAX_LIMIT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodRecipeQuery {
    search: String,
    page: i64,
    limit: i64,
}

impl FoodRecipeQuery {
    /// Page size when none is requested.
    pub const DEFAULT_LIMIT: i64 = 10;
    /// Largest page size served.
    pub const MAX_LIMIT: i64 = 100;

    /// Build a normalized query.
    #[must_use]
    pub fn new(search: impl Into<String>, page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            search: search.into(),
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    /// The search text, or `None` when blank.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        let term = self.search.trim();
        (!term.is_empty()).then_some(term)
    }

    #[must_use]
    pub const fn page(&self) -> i64 {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.limit
    }

    /// Rows to skip: `(page - 1) * limit`.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for FoodRecipeQuery {
    fn default() -> Self {
        Self::new("", None, None)
    }
}
