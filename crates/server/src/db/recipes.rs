//! Recipe repository for database operations.
//!
//! Recipes are always read together with their difficulty, cooking duration
//! and owner (one joined query), then their ratings and loves are attached in
//! two batched follow-up queries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use forkful_core::{
    CookingDurationId, DifficultyId, LoveId, RatingId, RecipeId, Score, UserId,
};

use super::{RecipeStore, RepositoryError, escape_like, map_write_error};
use crate::models::{
    CookingDuration, Difficulty, FoodRecipe, FoodRecipeChanges, FoodRecipeQuery, NewFoodRecipe,
    Rating, RecipeLove, RecipeOwner,
};

/// Joined projection shared by every recipe read.
pub(super) const RECIPE_SELECT: &str = r"
    SELECT r.id, r.name, r.description, r.ingredient, r.instruction, r.image_url,
           r.created_at, r.updated_at,
           d.id AS difficulty_id, d.name AS difficulty_name,
           c.id AS cooking_duration_id, c.name AS cooking_duration_name,
           u.id AS owner_id, u.first_name AS owner_first_name,
           u.last_name AS owner_last_name, u.nick_name AS owner_nick_name,
           u.image_profile_url AS owner_image_profile_url
    FROM food_recipes r
    JOIN difficulties d ON d.id = r.difficulty_id
    JOIN cooking_durations c ON c.id = r.cooking_duration_id
    JOIN users u ON u.id = r.user_id
";

/// Name OR description contains the pattern, case-insensitively.
/// `$1` is NULL when there is no search term.
const SEARCH_FILTER: &str = r"
    WHERE ($1::text IS NULL
           OR r.name ILIKE $1 ESCAPE '\'
           OR r.description ILIKE $1 ESCAPE '\')
";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(super) struct RecipeRow {
    id: i32,
    name: String,
    description: String,
    ingredient: String,
    instruction: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    difficulty_id: i32,
    difficulty_name: String,
    cooking_duration_id: i32,
    cooking_duration_name: String,
    owner_id: String,
    owner_first_name: String,
    owner_last_name: String,
    owner_nick_name: String,
    owner_image_profile_url: String,
}

impl TryFrom<RecipeRow> for FoodRecipe {
    type Error = RepositoryError;

    fn try_from(row: RecipeRow) -> Result<Self, Self::Error> {
        let owner_id = UserId::parse(&row.owner_id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid owner id in database: {e}"))
        })?;

        Ok(Self {
            id: RecipeId::new(row.id),
            name: row.name,
            description: row.description,
            ingredient: row.ingredient,
            instruction: row.instruction,
            image_url: row.image_url,
            difficulty: Difficulty {
                id: DifficultyId::new(row.difficulty_id),
                name: row.difficulty_name,
            },
            cooking_duration: CookingDuration {
                id: CookingDurationId::new(row.cooking_duration_id),
                name: row.cooking_duration_name,
            },
            owner: RecipeOwner {
                id: owner_id,
                first_name: row.owner_first_name,
                last_name: row.owner_last_name,
                nick_name: row.owner_nick_name,
                image_profile_url: row.owner_image_profile_url,
            },
            ratings: Vec::new(),
            loves: Vec::new(),
            average_rating: 0.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct RatingRow {
    id: i32,
    food_recipe_id: i32,
    user_id: String,
    score: f64,
    created_at: DateTime<Utc>,
}

impl TryFrom<RatingRow> for Rating {
    type Error = RepositoryError;

    fn try_from(row: RatingRow) -> Result<Self, Self::Error> {
        let user_id = UserId::parse(&row.user_id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid rating user id: {e}"))
        })?;
        let score = Score::new(row.score)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid rating score: {e}")))?;

        Ok(Self {
            id: RatingId::new(row.id),
            recipe_id: RecipeId::new(row.food_recipe_id),
            user_id,
            score,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LoveRow {
    id: i32,
    user_id: String,
    recipe_id: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<LoveRow> for RecipeLove {
    type Error = RepositoryError;

    fn try_from(row: LoveRow) -> Result<Self, Self::Error> {
        let user_id = UserId::parse(&row.user_id)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid love user id: {e}")))?;

        Ok(Self {
            id: LoveId::new(row.id),
            user_id,
            recipe_id: RecipeId::new(row.recipe_id),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LookupRow {
    id: i32,
    name: String,
}

/// Convert joined rows and attach their ratings and loves, preserving order.
pub(super) async fn hydrate(
    pool: &PgPool,
    rows: Vec<RecipeRow>,
) -> Result<Vec<FoodRecipe>, RepositoryError> {
    let mut recipes = rows
        .into_iter()
        .map(FoodRecipe::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    if recipes.is_empty() {
        return Ok(recipes);
    }

    let ids: Vec<i32> = recipes.iter().map(|r| r.id.as_i32()).collect();

    let rating_rows = sqlx::query_as::<_, RatingRow>(
        r"
        SELECT id, food_recipe_id, user_id, score, created_at
        FROM ratings
        WHERE food_recipe_id = ANY($1)
        ORDER BY created_at DESC, id DESC
        ",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let love_rows = sqlx::query_as::<_, LoveRow>(
        r"
        SELECT id, user_id, recipe_id, created_at
        FROM recipe_loves
        WHERE recipe_id = ANY($1)
        ORDER BY created_at ASC, id ASC
        ",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut ratings: HashMap<RecipeId, Vec<Rating>> = HashMap::new();
    for row in rating_rows {
        let rating = Rating::try_from(row)?;
        ratings.entry(rating.recipe_id).or_default().push(rating);
    }

    let mut loves: HashMap<RecipeId, Vec<RecipeLove>> = HashMap::new();
    for row in love_rows {
        let love = RecipeLove::try_from(row)?;
        loves.entry(love.recipe_id).or_default().push(love);
    }

    for recipe in &mut recipes {
        recipe.ratings = ratings.remove(&recipe.id).unwrap_or_default();
        recipe.loves = loves.remove(&recipe.id).unwrap_or_default();
    }

    Ok(recipes)
}

fn search_pattern(query: &FoodRecipeQuery) -> Option<String> {
    query
        .search_term()
        .map(|term| format!("%{}%", escape_like(term)))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for recipe database operations.
#[derive(Clone)]
pub struct RecipeRepository {
    pool: PgPool,
}

impl RecipeRepository {
    /// Create a new recipe repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one(&self, id: RecipeId) -> Result<Option<FoodRecipe>, RepositoryError> {
        let sql = format!("{RECIPE_SELECT} WHERE r.id = $1");
        let row = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(hydrate(&self.pool, vec![row]).await?.pop())
    }
}

impl RecipeStore for RecipeRepository {
    async fn create(&self, recipe: &NewFoodRecipe) -> Result<FoodRecipe, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO food_recipes
                (name, description, ingredient, instruction, image_url,
                 difficulty_id, cooking_duration_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(&recipe.name)
        .bind(&recipe.description)
        .bind(&recipe.ingredient)
        .bind(&recipe.instruction)
        .bind(&recipe.image_url)
        .bind(recipe.difficulty_id.as_i32())
        .bind(recipe.cooking_duration_id.as_i32())
        .bind(recipe.owner_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "recipe"))?;

        // Deleted between insert and re-read
        self.fetch_one(RecipeId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn search(&self, query: &FoodRecipeQuery) -> Result<Vec<FoodRecipe>, RepositoryError> {
        let sql = format!(
            "{RECIPE_SELECT} {SEARCH_FILTER} ORDER BY r.name ASC, r.id ASC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(search_pattern(query))
            .bind(query.limit())
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        hydrate(&self.pool, rows).await
    }

    async fn count(&self, query: &FoodRecipeQuery) -> Result<i64, RepositoryError> {
        let sql = format!("SELECT COUNT(*) FROM food_recipes r {SEARCH_FILTER}");
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(search_pattern(query))
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn get_by_id(&self, id: RecipeId) -> Result<Option<FoodRecipe>, RepositoryError> {
        self.fetch_one(id).await
    }

    async fn update(
        &self,
        id: RecipeId,
        changes: &FoodRecipeChanges,
    ) -> Result<FoodRecipe, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE food_recipes
            SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                ingredient = COALESCE($4, ingredient),
                instruction = COALESCE($5, instruction),
                image_url = CASE WHEN $6::text IS NULL THEN image_url ELSE NULLIF($6, '') END,
                difficulty_id = COALESCE($7, difficulty_id),
                cooking_duration_id = COALESCE($8, cooking_duration_id),
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.ingredient.as_deref())
        .bind(changes.instruction.as_deref())
        .bind(changes.image_url.as_deref())
        .bind(changes.difficulty_id.map(|d| d.as_i32()))
        .bind(changes.cooking_duration_id.map(|c| c.as_i32()))
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "recipe"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.fetch_one(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: RecipeId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM food_recipes WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<FoodRecipe>, RepositoryError> {
        let sql = format!("{RECIPE_SELECT} WHERE r.user_id = $1 ORDER BY r.name ASC, r.id ASC");
        let rows = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(owner.as_str())
            .fetch_all(&self.pool)
            .await?;

        hydrate(&self.pool, rows).await
    }

    async fn difficulties(&self) -> Result<Vec<Difficulty>, RepositoryError> {
        let rows =
            sqlx::query_as::<_, LookupRow>("SELECT id, name FROM difficulties ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|r| Difficulty {
                id: DifficultyId::new(r.id),
                name: r.name,
            })
            .collect())
    }

    async fn cooking_durations(&self) -> Result<Vec<CookingDuration>, RepositoryError> {
        let rows = sqlx::query_as::<_, LookupRow>(
            "SELECT id, name FROM cooking_durations ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CookingDuration {
                id: CookingDurationId::new(r.id),
                name: r.name,
            })
            .collect())
    }
}
