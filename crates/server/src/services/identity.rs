//! Identity reconciliation.
//!
//! Keeps the local `users` table in step with the identity provider: verified
//! claims are merged into the stored record on every sync, and users may
//! override their nickname and profile image.

use serde::Deserialize;
use tracing::instrument;

use forkful_core::{UserId, UserRef};

use super::error::{Context, ServiceError};
use crate::db::{RecipeStore, UserStore};
use crate::models::{Claims, FoodRecipe, ProfileUpdate, User, is_http_url, with_average_ratings};

/// Profile fields a user may change. Empty strings mean "leave as is".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default, alias = "nickname")]
    pub nick_name: String,
    #[serde(default)]
    pub image_profile_url: String,
}

impl UpdateProfileRequest {
    /// The non-empty fields as an update, or `None` if there are none.
    fn into_update(self) -> Option<ProfileUpdate> {
        let nick_name = non_empty(self.nick_name);
        let image_profile_url = non_empty(self.image_profile_url);
        if nick_name.is_none() && image_profile_url.is_none() {
            return None;
        }
        Some(ProfileUpdate {
            nick_name,
            image_profile_url,
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// User record operations driven by verified claims.
#[derive(Clone)]
pub struct IdentityService<U, R> {
    users: U,
    recipes: R,
}

impl<U: UserStore, R: RecipeStore> IdentityService<U, R> {
    #[must_use]
    pub const fn new(users: U, recipes: R) -> Self {
        Self { users, recipes }
    }

    /// Create or refresh the caller's user record from their claims.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the claims are incomplete,
    /// `ServiceError::Persistence` if storage fails.
    #[instrument(skip(self, claims), fields(user = %claims.id))]
    pub async fn upsert_from_claims(&self, claims: &Claims) -> Result<User, ServiceError> {
        claims
            .validate()
            .map_err(|e| ServiceError::validation(format!("claims invalid: {e}")))?;

        let existing = self.users.get_by_id(&claims.id).await.context("find user")?;
        let is_new = existing.is_none();
        let merged = existing
            .unwrap_or_else(|| User::fresh(claims.id.clone()))
            .merge_claims(claims);

        let user = self.users.upsert(&merged).await.context("upsert user")?;

        if is_new {
            tracing::info!("user created from claims");
        } else {
            tracing::debug!("user refreshed from claims");
        }
        Ok(user)
    }

    /// The caller's own record, if it exists yet.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` if storage fails.
    pub async fn get_by_id(&self, claims: &Claims) -> Result<Option<User>, ServiceError> {
        self.users.get_by_id(&claims.id).await.context("find user")
    }

    /// Recipes owned by `target`, which may be the `self` alias.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a malformed target,
    /// `ServiceError::NotFound` with context `"find user"` if the caller has no
    /// user record.
    pub async fn recipes_for_user(
        &self,
        target: &str,
        claims: &Claims,
    ) -> Result<Vec<FoodRecipe>, ServiceError> {
        let target = resolve_target(target, claims)?;

        if self
            .users
            .get_by_id(&claims.id)
            .await
            .context("find user")?
            .is_none()
        {
            return Err(ServiceError::NotFound {
                context: "find user",
            });
        }

        let recipes = self
            .recipes
            .list_by_owner(&target)
            .await
            .context("get recipes")?;
        Ok(with_average_ratings(recipes))
    }

    /// Apply the non-empty fields of `request` to the user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if no field is set or the image is
    /// not an http(s) URL, `ServiceError::NotFound` if the user does not
    /// exist.
    #[instrument(skip(self, request), fields(user = %user))]
    pub async fn update_profile(
        &self,
        user: &UserId,
        request: UpdateProfileRequest,
    ) -> Result<(), ServiceError> {
        let update = request
            .into_update()
            .ok_or_else(|| ServiceError::validation("no fields to update"))?;

        if let Some(url) = &update.image_profile_url
            && !is_http_url(url)
        {
            return Err(ServiceError::validation(
                "imageProfileUrl must be an absolute http(s) URL",
            ));
        }

        self.users
            .update_profile(user, &update)
            .await
            .context("update profile")?;

        tracing::info!("profile updated");
        Ok(())
    }
}

/// Parse a path segment as a user reference and resolve `self`.
///
/// # Errors
///
/// Returns `ServiceError::Validation` if the segment is not a valid user id.
pub fn resolve_target(target: &str, claims: &Claims) -> Result<UserId, ServiceError> {
    UserRef::parse(target)
        .map(|r| r.resolve(&claims.id))
        .map_err(|e| ServiceError::validation(format!("invalid user id: {e}")))
}
