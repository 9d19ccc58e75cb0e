//! User routes: claims sync, own profile, per-user recipe lists.
//!
//! Every handler here requires a bearer token.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use forkful_core::UserId;

use super::recipes::{RecipeResponse, recipe_list};
use crate::db::Backend;
use crate::error::Result;
use crate::middleware::RequireClaims;
use crate::models::User;
use crate::services::identity::resolve_target;
use crate::services::{ServiceError, UpdateProfileRequest, policy};
use crate::state::AppState;

/// A user record as served to its owner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub nick_name: String,
    pub image_profile_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            nick_name: user.nick_name,
            image_profile_url: user.image_profile_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Create or refresh the caller's record from their token claims.
///
/// POST /api/v1/auth/sync
///
/// # Errors
///
/// Returns `AppError` if the claims are incomplete or storage fails.
pub async fn sync<B: Backend>(
    State(state): State<AppState<B>>,
    RequireClaims(claims): RequireClaims,
) -> Result<Json<UserResponse>> {
    let user = state.identity().upsert_from_claims(&claims).await?;
    Ok(Json(user.into()))
}

/// The caller's own record.
///
/// GET /api/v1/users/self
///
/// # Errors
///
/// Returns `AppError` if the target is someone else, or 404 if the caller
/// has never synced.
pub async fn show<B: Backend>(
    State(state): State<AppState<B>>,
    RequireClaims(claims): RequireClaims,
    target: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<UserResponse>> {
    let Path(target) = target?;
    policy::ensure_self(&resolve_target(&target, &claims)?, &claims)?;

    let user = state
        .identity()
        .get_by_id(&claims)
        .await?
        .ok_or(ServiceError::NotFound {
            context: "find user",
        })?;
    Ok(Json(user.into()))
}

/// Recipes the caller loved, most recent first.
///
/// GET /api/v1/users/self/loved-recipes
///
/// # Errors
///
/// Returns `AppError` if the target is someone else or storage fails.
pub async fn loved_recipes<B: Backend>(
    State(state): State<AppState<B>>,
    RequireClaims(claims): RequireClaims,
    target: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<RecipeResponse>>> {
    let Path(target) = target?;
    policy::ensure_self(&resolve_target(&target, &claims)?, &claims)?;

    let recipes = state.engagement().loved_recipes(&claims.id).await?;
    Ok(Json(recipe_list(recipes)))
}

/// Recipes owned by a user. `self` addresses the caller.
///
/// GET /api/v1/users/{id}/food-recipes
///
/// # Errors
///
/// Returns `AppError` if the id is malformed or the caller has no record.
pub async fn food_recipes<B: Backend>(
    State(state): State<AppState<B>>,
    RequireClaims(claims): RequireClaims,
    target: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<RecipeResponse>>> {
    let Path(target) = target?;
    let recipes = state.identity().recipes_for_user(&target, &claims).await?;
    Ok(Json(recipe_list(recipes)))
}

/// Change the caller's nickname and/or profile image.
///
/// PATCH /api/v1/users/{id}/profile
///
/// # Errors
///
/// Returns `AppError` if the target is not the caller, no field is set, or
/// the user does not exist.
pub async fn update_profile<B: Backend>(
    State(state): State<AppState<B>>,
    RequireClaims(claims): RequireClaims,
    target: std::result::Result<Path<String>, PathRejection>,
    body: std::result::Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<StatusCode> {
    let Path(target) = target?;
    let Json(body) = body?;

    let target = resolve_target(&target, &claims)?;
    policy::ensure_self(&target, &claims)?;

    state.identity().update_profile(&target, body).await?;
    Ok(StatusCode::NO_CONTENT)
}
