//! Love and rating routes.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forkful_core::{RatingId, RecipeId, Score, UserId};

use crate::db::Backend;
use crate::error::Result;
use crate::middleware::RequireClaims;
use crate::models::Rating;
use crate::state::AppState;

/// A rating as served to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub id: RatingId,
    pub recipe_id: RecipeId,
    pub user_id: UserId,
    pub score: Score,
    pub created_at: DateTime<Utc>,
}

impl From<Rating> for RatingResponse {
    fn from(rating: Rating) -> Self {
        Self {
            id: rating.id,
            recipe_id: rating.recipe_id,
            user_id: rating.user_id,
            score: rating.score,
            created_at: rating.created_at,
        }
    }
}

/// Body of `POST /food-recipes/{id}/ratings`.
#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub score: f64,
}

/// Whether the caller has loved a recipe.
#[derive(Debug, Serialize)]
pub struct LoveResponse {
    pub loved: bool,
}

/// Ratings of a recipe, newest first.
///
/// GET /api/v1/food-recipes/{id}/ratings
///
/// # Errors
///
/// Returns `AppError` if the recipe does not exist.
pub async fn ratings<B: Backend>(
    State(state): State<AppState<B>>,
    id: std::result::Result<Path<RecipeId>, PathRejection>,
) -> Result<Json<Vec<RatingResponse>>> {
    let Path(id) = id?;
    let ratings = state.engagement().ratings(id).await?;
    Ok(Json(ratings.into_iter().map(RatingResponse::from).collect()))
}

/// Rate a recipe.
///
/// POST /api/v1/food-recipes/{id}/ratings
///
/// # Errors
///
/// Returns `AppError` if the score is out of range or the recipe or caller
/// does not exist.
pub async fn rate<B: Backend>(
    State(state): State<AppState<B>>,
    RequireClaims(claims): RequireClaims,
    id: std::result::Result<Path<RecipeId>, PathRejection>,
    body: std::result::Result<Json<RateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RatingResponse>)> {
    let Path(id) = id?;
    let Json(body) = body?;
    let rating = state.engagement().rate(&claims.id, id, body.score).await?;
    Ok((StatusCode::CREATED, Json(rating.into())))
}

/// GET /api/v1/food-recipes/{id}/love
///
/// # Errors
///
/// Returns `AppError` if the caller is unauthenticated or storage fails.
pub async fn has_loved<B: Backend>(
    State(state): State<AppState<B>>,
    RequireClaims(claims): RequireClaims,
    id: std::result::Result<Path<RecipeId>, PathRejection>,
) -> Result<Json<LoveResponse>> {
    let Path(id) = id?;
    let loved = state.engagement().has_loved(&claims.id, id).await?;
    Ok(Json(LoveResponse { loved }))
}

/// Love a recipe. Loving it again is a no-op.
///
/// POST /api/v1/food-recipes/{id}/love
///
/// Responds 201 when a love was recorded, 200 when it already existed.
///
/// # Errors
///
/// Returns `AppError` if the recipe or caller does not exist.
pub async fn love<B: Backend>(
    State(state): State<AppState<B>>,
    RequireClaims(claims): RequireClaims,
    id: std::result::Result<Path<RecipeId>, PathRejection>,
) -> Result<(StatusCode, Json<LoveResponse>)> {
    let Path(id) = id?;
    let inserted = state.engagement().like(&claims.id, id).await?;
    let status = if inserted {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(LoveResponse { loved: true })))
}

/// DELETE /api/v1/food-recipes/{id}/love
///
/// # Errors
///
/// Returns `AppError` if the caller is unauthenticated or storage fails.
pub async fn unlove<B: Backend>(
    State(state): State<AppState<B>>,
    RequireClaims(claims): RequireClaims,
    id: std::result::Result<Path<RecipeId>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = id?;
    state.engagement().unlike(&claims.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Flip the caller's love for a recipe.
///
/// POST /api/v1/food-recipes/{id}/love/toggle
///
/// # Errors
///
/// Returns `AppError` if the recipe or caller does not exist.
pub async fn toggle<B: Backend>(
    State(state): State<AppState<B>>,
    RequireClaims(claims): RequireClaims,
    id: std::result::Result<Path<RecipeId>, PathRejection>,
) -> Result<Json<LoveResponse>> {
    let Path(id) = id?;
    let loved = state.engagement().toggle_love(&claims.id, id).await?;
    Ok(Json(LoveResponse { loved }))
}
