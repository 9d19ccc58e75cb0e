//! Who may change what.

use forkful_core::UserId;

use super::error::ServiceError;
use crate::models::{Claims, FoodRecipe};

/// Only the owner may edit a recipe.
///
/// # Errors
///
/// Returns `ServiceError::Forbidden` if the caller is not the owner.
pub fn ensure_can_modify(recipe: &FoodRecipe, claims: &Claims) -> Result<(), ServiceError> {
    if recipe.is_owned_by(&claims.id) {
        return Ok(());
    }
    Err(ServiceError::Forbidden("only the owner can modify this recipe"))
}

/// The owner or an administrator may delete a recipe.
///
/// # Errors
///
/// Returns `ServiceError::Forbidden` otherwise.
pub fn ensure_can_delete(recipe: &FoodRecipe, claims: &Claims) -> Result<(), ServiceError> {
    if recipe.is_owned_by(&claims.id) || claims.is_admin() {
        return Ok(());
    }
    Err(ServiceError::Forbidden(
        "only the owner or an administrator can delete this recipe",
    ))
}

/// Profiles can only be edited by their own user.
///
/// # Errors
///
/// Returns `ServiceError::Forbidden` if `target` is someone else.
pub fn ensure_self(target: &UserId, claims: &Claims) -> Result<(), ServiceError> {
    if *target == claims.id {
        return Ok(());
    }
    Err(ServiceError::Forbidden("you can only edit your own profile"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use forkful_core::{CookingDurationId, DifficultyId, RecipeId};

    use super::*;
    use crate::models::{ADMIN_ROLE, CookingDuration, Difficulty, RecipeOwner};

    fn claims(id: &str, roles: &[&str]) -> Claims {
        Claims {
            id: UserId::parse(id).unwrap(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            nick_name: String::new(),
            image_profile_url: String::new(),
            roles: roles.iter().map(ToString::to_string).collect(),
        }
    }

    fn recipe_owned_by(owner: &str) -> FoodRecipe {
        FoodRecipe {
            id: RecipeId::new(1),
            name: "Gaeng Som".to_string(),
            description: String::new(),
            ingredient: String::new(),
            instruction: String::new(),
            image_url: None,
            difficulty: Difficulty {
                id: DifficultyId::new(1),
                name: "Easy".to_string(),
            },
            cooking_duration: CookingDuration {
                id: CookingDurationId::new(1),
                name: "5 - 10".to_string(),
            },
            owner: RecipeOwner {
                id: UserId::parse(owner).unwrap(),
                first_name: String::new(),
                last_name: String::new(),
                nick_name: String::new(),
                image_profile_url: String::new(),
            },
            ratings: Vec::new(),
            loves: Vec::new(),
            average_rating: 0.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_can_modify_and_delete() {
        let recipe = recipe_owned_by("owner");
        let owner = claims("owner", &[]);
        assert!(ensure_can_modify(&recipe, &owner).is_ok());
        assert!(ensure_can_delete(&recipe, &owner).is_ok());
    }

    #[test]
    fn test_admin_can_delete_but_not_modify() {
        let recipe = recipe_owned_by("owner");
        let admin = claims("root", &[ADMIN_ROLE]);
        assert!(matches!(
            ensure_can_modify(&recipe, &admin),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(ensure_can_delete(&recipe, &admin).is_ok());
    }

    #[test]
    fn test_stranger_is_forbidden() {
        let recipe = recipe_owned_by("owner");
        let stranger = claims("other", &["user"]);
        assert!(ensure_can_delete(&recipe, &stranger).is_err());
    }

    #[test]
    fn test_ensure_self() {
        let me = claims("me", &[]);
        assert!(ensure_self(&UserId::parse("me").unwrap(), &me).is_ok());
        assert!(ensure_self(&UserId::parse("you").unwrap(), &me).is_err());
    }
}
