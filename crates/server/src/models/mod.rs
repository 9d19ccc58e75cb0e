//! Domain models for the recipe catalog.
//!
//! These types represent validated domain objects separate from database row
//! types and from the JSON shapes served by the API.

pub mod claims;
pub mod engagement;
pub mod recipe;
pub mod user;

pub use claims::{ADMIN_ROLE, Claims, ClaimsError, is_http_url};
pub use engagement::{Rating, RecipeLove, average_rating};
pub use recipe::{
    CookingDuration, Difficulty, FoodRecipe, FoodRecipeChanges, FoodRecipeQuery, NewFoodRecipe,
    RecipeOwner, with_average_ratings,
};
pub use user::{ProfileUpdate, User};
