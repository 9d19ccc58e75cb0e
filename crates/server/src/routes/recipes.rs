//! Recipe catalog routes.
//!
//! Reads are public; writes need a bearer token and ownership (or the admin
//! role, for deletes).

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forkful_core::{CookingDurationId, DifficultyId, RecipeId, UserId};

use crate::db::Backend;
use crate::error::Result;
use crate::middleware::RequireClaims;
use crate::models::{
    CookingDuration, Difficulty, FoodRecipe, FoodRecipeChanges, FoodRecipeQuery, NewFoodRecipe,
    RecipeOwner,
};
use crate::services::{ServiceError, policy};
use crate::state::AppState;

// ============================================================================
// Response types
// ============================================================================

/// A recipe as served to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    pub id: RecipeId,
    pub name: String,
    pub description: String,
    pub ingredient: String,
    pub instruction: String,
    pub image_url: Option<String>,
    pub difficulty: Difficulty,
    pub cooking_duration: CookingDuration,
    pub owner: OwnerResponse,
    pub average_rating: f64,
    pub rating_count: usize,
    pub love_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a recipe's owner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerResponse {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub nick_name: String,
    pub image_profile_url: String,
}

impl From<RecipeOwner> for OwnerResponse {
    fn from(owner: RecipeOwner) -> Self {
        Self {
            id: owner.id,
            first_name: owner.first_name,
            last_name: owner.last_name,
            nick_name: owner.nick_name,
            image_profile_url: owner.image_profile_url,
        }
    }
}

impl From<FoodRecipe> for RecipeResponse {
    fn from(recipe: FoodRecipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            description: recipe.description,
            ingredient: recipe.ingredient,
            instruction: recipe.instruction,
            image_url: recipe.image_url,
            difficulty: recipe.difficulty,
            cooking_duration: recipe.cooking_duration,
            owner: recipe.owner.into(),
            average_rating: recipe.average_rating,
            rating_count: recipe.ratings.len(),
            love_count: recipe.loves.len(),
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        }
    }
}

/// Convert a list of recipes for the wire.
pub fn recipe_list(recipes: Vec<FoodRecipe>) -> Vec<RecipeResponse> {
    recipes.into_iter().map(RecipeResponse::from).collect()
}

/// One page of search results plus the total match count.
#[derive(Debug, Serialize)]
pub struct RecipePageResponse {
    pub results: Vec<RecipeResponse>,
    pub total: i64,
}

// ============================================================================
// Request types
// ============================================================================

/// Query string for `GET /food-recipes`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search: String,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<SearchParams> for FoodRecipeQuery {
    fn from(params: SearchParams) -> Self {
        Self::new(params.search, params.page, params.limit)
    }
}

/// Body of `POST /food-recipes`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipeRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredient: String,
    #[serde(default)]
    pub instruction: String,
    pub image_url: Option<String>,
    pub difficulty_id: DifficultyId,
    pub cooking_duration_id: CookingDurationId,
}

impl CreateRecipeRequest {
    fn into_new_recipe(self, owner_id: UserId) -> NewFoodRecipe {
        NewFoodRecipe {
            name: self.name,
            description: self.description,
            ingredient: self.ingredient,
            instruction: self.instruction,
            image_url: self.image_url,
            difficulty_id: self.difficulty_id,
            cooking_duration_id: self.cooking_duration_id,
            owner_id,
        }
    }
}

/// Body of `PUT /food-recipes/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub ingredient: Option<String>,
    pub instruction: Option<String>,
    pub image_url: Option<String>,
    pub difficulty_id: Option<DifficultyId>,
    pub cooking_duration_id: Option<CookingDurationId>,
}

impl From<UpdateRecipeRequest> for FoodRecipeChanges {
    fn from(request: UpdateRecipeRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            ingredient: request.ingredient,
            instruction: request.instruction,
            image_url: request.image_url,
            difficulty_id: request.difficulty_id,
            cooking_duration_id: request.cooking_duration_id,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Search recipes.
///
/// GET /api/v1/food-recipes?search=&page=&limit=
///
/// # Errors
///
/// Returns `AppError` if the query string is malformed or storage fails.
pub async fn index<B: Backend>(
    State(state): State<AppState<B>>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<RecipePageResponse>> {
    let Query(params) = params?;
    let page = state.catalog().search_page(&params.into()).await?;

    Ok(Json(RecipePageResponse {
        results: recipe_list(page.results),
        total: page.total,
    }))
}

/// Create a recipe owned by the caller.
///
/// POST /api/v1/food-recipes
///
/// # Errors
///
/// Returns `AppError` if the caller is unauthenticated or the recipe is
/// invalid.
pub async fn create<B: Backend>(
    State(state): State<AppState<B>>,
    RequireClaims(claims): RequireClaims,
    body: std::result::Result<Json<CreateRecipeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RecipeResponse>)> {
    let Json(body) = body?;
    let recipe = state
        .catalog()
        .create(body.into_new_recipe(claims.id))
        .await?;

    Ok((StatusCode::CREATED, Json(recipe.into())))
}

/// Recipe detail.
///
/// GET /api/v1/food-recipes/{id}
///
/// # Errors
///
/// Returns `AppError` if the recipe does not exist.
pub async fn show<B: Backend>(
    State(state): State<AppState<B>>,
    id: std::result::Result<Path<RecipeId>, PathRejection>,
) -> Result<Json<RecipeResponse>> {
    let Path(id) = id?;
    let recipe = state.catalog().get_by_id(id).await?;
    Ok(Json(recipe.into()))
}

/// Update a recipe. Only its owner may.
///
/// PUT /api/v1/food-recipes/{id}
///
/// # Errors
///
/// Returns `AppError` if the caller is not the owner, the recipe does not
/// exist, or the changes are invalid.
pub async fn update<B: Backend>(
    State(state): State<AppState<B>>,
    RequireClaims(claims): RequireClaims,
    id: std::result::Result<Path<RecipeId>, PathRejection>,
    body: std::result::Result<Json<UpdateRecipeRequest>, JsonRejection>,
) -> Result<Json<RecipeResponse>> {
    let Path(id) = id?;
    let Json(body) = body?;
    let catalog = state.catalog();

    let existing = catalog.get_by_id(id).await?;
    policy::ensure_can_modify(&existing, &claims)?;

    let updated = catalog.update(id, body.into()).await?;
    Ok(Json(updated.into()))
}

/// Delete a recipe. Its owner or an administrator may.
///
/// DELETE /api/v1/food-recipes/{id}
///
/// Deleting a recipe that is already gone succeeds.
///
/// # Errors
///
/// Returns `AppError` if the caller may not delete the recipe.
pub async fn destroy<B: Backend>(
    State(state): State<AppState<B>>,
    RequireClaims(claims): RequireClaims,
    id: std::result::Result<Path<RecipeId>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = id?;
    let catalog = state.catalog();

    match catalog.get_by_id(id).await {
        Ok(existing) => policy::ensure_can_delete(&existing, &claims)?,
        Err(ServiceError::NotFound { .. }) => return Ok(StatusCode::NO_CONTENT),
        Err(e) => return Err(e.into()),
    }

    catalog.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/difficulties
///
/// # Errors
///
/// Returns `AppError` if storage fails.
pub async fn difficulties<B: Backend>(
    State(state): State<AppState<B>>,
) -> Result<Json<Vec<Difficulty>>> {
    Ok(Json(state.catalog().difficulties().await?))
}

/// GET /api/v1/cooking-durations
///
/// # Errors
///
/// Returns `AppError` if storage fails.
pub async fn cooking_durations<B: Backend>(
    State(state): State<AppState<B>>,
) -> Result<Json<Vec<CookingDuration>>> {
    Ok(Json(state.catalog().cooking_durations().await?))
}
