//! In-process store with the same semantics as the `PostgreSQL` repositories.
//!
//! Used by tests and for running the API without a database. All tables live
//! behind one lock, so every operation is atomic with respect to the others.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use forkful_core::{CookingDurationId, DifficultyId, LoveId, RatingId, RecipeId, Score, UserId};

use super::{Backend, EngagementStore, RecipeStore, RepositoryError, UserStore, lookups};
use crate::models::{
    CookingDuration, Difficulty, FoodRecipe, FoodRecipeChanges, FoodRecipeQuery, NewFoodRecipe,
    ProfileUpdate, Rating, RecipeLove, RecipeOwner, User,
};

/// A recipe row: foreign keys, not resolved associations.
#[derive(Debug, Clone)]
struct RecipeRecord {
    id: RecipeId,
    name: String,
    description: String,
    ingredient: String,
    instruction: String,
    image_url: Option<String>,
    difficulty_id: DifficultyId,
    cooking_duration_id: CookingDurationId,
    owner_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    difficulties: Vec<Difficulty>,
    cooking_durations: Vec<CookingDuration>,
    recipes: HashMap<RecipeId, RecipeRecord>,
    ratings: Vec<Rating>,
    loves: Vec<RecipeLove>,
    next_recipe_id: i32,
    next_rating_id: i32,
    next_love_id: i32,
}

impl Tables {
    fn allocate(counter: &mut i32) -> i32 {
        *counter += 1;
        *counter
    }

    fn check_references(
        &self,
        difficulty_id: DifficultyId,
        cooking_duration_id: CookingDurationId,
    ) -> Result<(), RepositoryError> {
        if !self.difficulties.iter().any(|d| d.id == difficulty_id) {
            return Err(RepositoryError::Conflict(format!(
                "recipe violates food_recipes_difficulty_id_fkey ({difficulty_id})"
            )));
        }
        if !self
            .cooking_durations
            .iter()
            .any(|c| c.id == cooking_duration_id)
        {
            return Err(RepositoryError::Conflict(format!(
                "recipe violates food_recipes_cooking_duration_id_fkey ({cooking_duration_id})"
            )));
        }
        Ok(())
    }

    fn check_engagement(&self, user: &UserId, recipe: RecipeId) -> Result<(), RepositoryError> {
        if !self.recipes.contains_key(&recipe) {
            return Err(RepositoryError::NotFound);
        }
        if !self.users.contains_key(user) {
            return Err(RepositoryError::Conflict(format!(
                "engagement violates recipe_loves_user_id_fkey ({user})"
            )));
        }
        Ok(())
    }

    /// Resolve associations the way the joined `PostgreSQL` select does.
    fn resolve(&self, record: &RecipeRecord) -> Result<FoodRecipe, RepositoryError> {
        let corrupt = |what: &str| {
            RepositoryError::DataCorruption(format!("recipe {} has no {what}", record.id))
        };

        let difficulty = self
            .difficulties
            .iter()
            .find(|d| d.id == record.difficulty_id)
            .cloned()
            .ok_or_else(|| corrupt("difficulty"))?;
        let cooking_duration = self
            .cooking_durations
            .iter()
            .find(|c| c.id == record.cooking_duration_id)
            .cloned()
            .ok_or_else(|| corrupt("cooking duration"))?;
        let owner = self
            .users
            .get(&record.owner_id)
            .ok_or_else(|| corrupt("owner"))?;

        let mut ratings: Vec<Rating> = self
            .ratings
            .iter()
            .filter(|r| r.recipe_id == record.id)
            .cloned()
            .collect();
        ratings.sort_by(|a, b| (b.created_at, b.id.as_i32()).cmp(&(a.created_at, a.id.as_i32())));

        let loves = self
            .loves
            .iter()
            .filter(|l| l.recipe_id == record.id)
            .cloned()
            .collect();

        Ok(FoodRecipe {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            ingredient: record.ingredient.clone(),
            instruction: record.instruction.clone(),
            image_url: record.image_url.clone(),
            difficulty,
            cooking_duration,
            owner: RecipeOwner {
                id: owner.id.clone(),
                first_name: owner.first_name.clone(),
                last_name: owner.last_name.clone(),
                nick_name: owner.nick_name.clone(),
                image_profile_url: owner.image_profile_url.clone(),
            },
            ratings,
            loves,
            average_rating: 0.0,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    fn resolve_all<'a>(
        &self,
        records: impl IntoIterator<Item = &'a RecipeRecord>,
    ) -> Result<Vec<FoodRecipe>, RepositoryError> {
        records.into_iter().map(|r| self.resolve(r)).collect()
    }

    /// Matching records ordered by name, then id.
    fn matching(&self, query: &FoodRecipeQuery) -> Vec<&RecipeRecord> {
        let needle = query.search_term().map(str::to_lowercase);
        let mut matches: Vec<&RecipeRecord> = self
            .recipes
            .values()
            .filter(|r| {
                needle.as_deref().is_none_or(|n| {
                    r.name.to_lowercase().contains(n) || r.description.to_lowercase().contains(n)
                })
            })
            .collect();
        sort_by_name(&mut matches);
        matches
    }
}

fn sort_by_name(records: &mut [&RecipeRecord]) {
    records.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.as_i32().cmp(&b.id.as_i32())));
}

/// In-memory implementation of every store trait.
///
/// Clones share the same tables.
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// A store seeded with the standard difficulty and cooking-duration
    /// lookups.
    #[must_use]
    pub fn new() -> Self {
        let mut tables = Tables::default();
        tables.difficulties = (1..)
            .zip(lookups::DIFFICULTIES)
            .map(|(id, name)| Difficulty {
                id: DifficultyId::new(id),
                name: (*name).to_owned(),
            })
            .collect();
        tables.cooking_durations = (1..)
            .zip(lookups::COOKING_DURATIONS)
            .map(|(id, name)| CookingDuration {
                id: CookingDurationId::new(id),
                name: (*name).to_owned(),
            })
            .collect();

        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    #[cfg(test)]
    pub(crate) async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeStore for MemoryStore {
    async fn create(&self, recipe: &NewFoodRecipe) -> Result<FoodRecipe, RepositoryError> {
        let mut tables = self.tables.write().await;

        tables.check_references(recipe.difficulty_id, recipe.cooking_duration_id)?;
        if !tables.users.contains_key(&recipe.owner_id) {
            return Err(RepositoryError::Conflict(format!(
                "recipe violates food_recipes_user_id_fkey ({})",
                recipe.owner_id
            )));
        }

        let id = RecipeId::new(Tables::allocate(&mut tables.next_recipe_id));
        let now = Utc::now();
        let record = RecipeRecord {
            id,
            name: recipe.name.clone(),
            description: recipe.description.clone(),
            ingredient: recipe.ingredient.clone(),
            instruction: recipe.instruction.clone(),
            image_url: recipe.image_url.clone(),
            difficulty_id: recipe.difficulty_id,
            cooking_duration_id: recipe.cooking_duration_id,
            owner_id: recipe.owner_id.clone(),
            created_at: now,
            updated_at: now,
        };
        let created = tables.resolve(&record)?;
        tables.recipes.insert(id, record);

        Ok(created)
    }

    async fn search(&self, query: &FoodRecipeQuery) -> Result<Vec<FoodRecipe>, RepositoryError> {
        let tables = self.tables.read().await;
        let skip = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(query.limit()).unwrap_or(0);

        tables.resolve_all(tables.matching(query).into_iter().skip(skip).take(take))
    }

    async fn count(&self, query: &FoodRecipeQuery) -> Result<i64, RepositoryError> {
        let tables = self.tables.read().await;
        i64::try_from(tables.matching(query).len())
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }

    async fn get_by_id(&self, id: RecipeId) -> Result<Option<FoodRecipe>, RepositoryError> {
        let tables = self.tables.read().await;
        tables
            .recipes
            .get(&id)
            .map(|record| tables.resolve(record))
            .transpose()
    }

    async fn update(
        &self,
        id: RecipeId,
        changes: &FoodRecipeChanges,
    ) -> Result<FoodRecipe, RepositoryError> {
        let mut tables = self.tables.write().await;

        let mut record = tables
            .recipes
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;

        if let Some(name) = &changes.name {
            record.name.clone_from(name);
        }
        if let Some(description) = &changes.description {
            record.description.clone_from(description);
        }
        if let Some(ingredient) = &changes.ingredient {
            record.ingredient.clone_from(ingredient);
        }
        if let Some(instruction) = &changes.instruction {
            record.instruction.clone_from(instruction);
        }
        if let Some(image_url) = &changes.image_url {
            record.image_url = Some(image_url.clone()).filter(|url| !url.is_empty());
        }
        if let Some(difficulty_id) = changes.difficulty_id {
            record.difficulty_id = difficulty_id;
        }
        if let Some(cooking_duration_id) = changes.cooking_duration_id {
            record.cooking_duration_id = cooking_duration_id;
        }
        tables.check_references(record.difficulty_id, record.cooking_duration_id)?;
        record.updated_at = Utc::now();

        let updated = tables.resolve(&record)?;
        tables.recipes.insert(id, record);

        Ok(updated)
    }

    async fn delete(&self, id: RecipeId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;

        if tables.recipes.remove(&id).is_none() {
            return Ok(false);
        }
        tables.ratings.retain(|r| r.recipe_id != id);
        tables.loves.retain(|l| l.recipe_id != id);

        Ok(true)
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<FoodRecipe>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut owned: Vec<&RecipeRecord> = tables
            .recipes
            .values()
            .filter(|r| r.owner_id == *owner)
            .collect();
        sort_by_name(&mut owned);

        tables.resolve_all(owned)
    }

    async fn difficulties(&self) -> Result<Vec<Difficulty>, RepositoryError> {
        Ok(self.tables.read().await.difficulties.clone())
    }

    async fn cooking_durations(&self) -> Result<Vec<CookingDuration>, RepositoryError> {
        Ok(self.tables.read().await.cooking_durations.clone())
    }
}

impl EngagementStore for MemoryStore {
    async fn like(&self, user: &UserId, recipe: RecipeId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;

        tables.check_engagement(user, recipe)?;
        if tables
            .loves
            .iter()
            .any(|l| l.user_id == *user && l.recipe_id == recipe)
        {
            return Ok(false);
        }

        let id = LoveId::new(Tables::allocate(&mut tables.next_love_id));
        tables.loves.push(RecipeLove {
            id,
            user_id: user.clone(),
            recipe_id: recipe,
            created_at: Utc::now(),
        });

        Ok(true)
    }

    async fn unlike(&self, user: &UserId, recipe: RecipeId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.loves.len();
        tables
            .loves
            .retain(|l| !(l.user_id == *user && l.recipe_id == recipe));

        Ok(tables.loves.len() < before)
    }

    async fn has_loved(&self, user: &UserId, recipe: RecipeId) -> Result<bool, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .loves
            .iter()
            .any(|l| l.user_id == *user && l.recipe_id == recipe))
    }

    async fn loved_recipes(&self, user: &UserId) -> Result<Vec<FoodRecipe>, RepositoryError> {
        let tables = self.tables.read().await;

        let mut loves: Vec<&RecipeLove> =
            tables.loves.iter().filter(|l| l.user_id == *user).collect();
        loves.sort_by(|a, b| (b.created_at, b.id.as_i32()).cmp(&(a.created_at, a.id.as_i32())));

        tables.resolve_all(loves.iter().filter_map(|l| tables.recipes.get(&l.recipe_id)))
    }

    async fn rate(
        &self,
        user: &UserId,
        recipe: RecipeId,
        score: Score,
    ) -> Result<Rating, RepositoryError> {
        let mut tables = self.tables.write().await;

        tables.check_engagement(user, recipe)?;

        let rating = Rating {
            id: RatingId::new(Tables::allocate(&mut tables.next_rating_id)),
            recipe_id: recipe,
            user_id: user.clone(),
            score,
            created_at: Utc::now(),
        };
        tables.ratings.push(rating.clone());

        Ok(rating)
    }

    async fn ratings(&self, recipe: RecipeId) -> Result<Vec<Rating>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut ratings: Vec<Rating> = tables
            .ratings
            .iter()
            .filter(|r| r.recipe_id == recipe)
            .cloned()
            .collect();
        ratings.sort_by(|a, b| (b.created_at, b.id.as_i32()).cmp(&(a.created_at, a.id.as_i32())));

        Ok(ratings)
    }

    async fn recipe_exists(&self, recipe: RecipeId) -> Result<bool, RepositoryError> {
        Ok(self.tables.read().await.recipes.contains_key(&recipe))
    }
}

impl UserStore for MemoryStore {
    async fn get_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn upsert(&self, user: &User) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let stored = match tables.users.get(&user.id) {
            Some(existing) => User {
                created_at: existing.created_at,
                updated_at: now,
                ..user.clone()
            },
            None => User {
                created_at: now,
                updated_at: now,
                ..user.clone()
            },
        };
        tables.users.insert(stored.id.clone(), stored.clone());

        Ok(stored)
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(id).ok_or(RepositoryError::NotFound)?;

        if let Some(nick_name) = &update.nick_name {
            user.nick_name.clone_from(nick_name);
            user.nick_name_customized = true;
        }
        if let Some(image_profile_url) = &update.image_profile_url {
            user.image_profile_url.clone_from(image_profile_url);
            user.image_customized = true;
        }
        user.updated_at = Utc::now();

        Ok(())
    }
}

impl Backend for MemoryStore {
    type Recipes = Self;
    type Engagement = Self;
    type Users = Self;

    fn recipes(&self) -> Self {
        self.clone()
    }

    fn engagement(&self) -> Self {
        self.clone()
    }

    fn users(&self) -> Self {
        self.clone()
    }

    async fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::parse(s).unwrap()
    }

    async fn store_with_user(id: &str) -> MemoryStore {
        let store = MemoryStore::new();
        let mut user = User::fresh(uid(id));
        user.first_name = "Malee".to_string();
        user.last_name = "Srisuk".to_string();
        store.upsert(&user).await.unwrap();
        store
    }

    fn new_recipe(name: &str, description: &str, owner: &str) -> NewFoodRecipe {
        NewFoodRecipe {
            name: name.to_string(),
            description: description.to_string(),
            ingredient: "rice".to_string(),
            instruction: "cook".to_string(),
            image_url: None,
            difficulty_id: DifficultyId::new(1),
            cooking_duration_id: CookingDurationId::new(2),
            owner_id: uid(owner),
        }
    }

    #[tokio::test]
    async fn test_create_resolves_associations() {
        let store = store_with_user("u1").await;
        let recipe = store
            .create(&new_recipe("Khao Pad", "fried rice", "u1"))
            .await
            .unwrap();

        assert_eq!(recipe.difficulty.name, "Easy");
        assert_eq!(recipe.cooking_duration.name, "11 - 30");
        assert_eq!(recipe.owner.first_name, "Malee");
    }

    #[tokio::test]
    async fn test_create_with_unknown_lookup_conflicts() {
        let store = store_with_user("u1").await;
        let mut recipe = new_recipe("Khao Pad", "", "u1");
        recipe.difficulty_id = DifficultyId::new(99);

        let err = store.create(&recipe).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_with_unknown_owner_conflicts() {
        let store = MemoryStore::new();
        let err = store
            .create(&new_recipe("Khao Pad", "", "ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_ordered() {
        let store = store_with_user("u1").await;
        store
            .create(&new_recipe("Tom Yum", "spicy soup", "u1"))
            .await
            .unwrap();
        store
            .create(&new_recipe("Green Curry", "SOUPy curry", "u1"))
            .await
            .unwrap();
        store
            .create(&new_recipe("Mango Sticky Rice", "dessert", "u1"))
            .await
            .unwrap();

        let query = FoodRecipeQuery::new("soup", None, None);
        let names: Vec<String> = store
            .search(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Green Curry", "Tom Yum"]);
        assert_eq!(store.count(&query).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_search_paginates() {
        let store = store_with_user("u1").await;
        for name in ["A", "B", "C"] {
            store.create(&new_recipe(name, "", "u1")).await.unwrap();
        }

        let page = store
            .search(&FoodRecipeQuery::new("", Some(2), Some(2)))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "C");

        let beyond = store
            .search(&FoodRecipeQuery::new("", Some(5), Some(2)))
            .await
            .unwrap();
        assert!(beyond.is_empty());
    }

    #[tokio::test]
    async fn test_like_is_unique_per_pair() {
        let store = store_with_user("u1").await;
        let recipe = store.create(&new_recipe("A", "", "u1")).await.unwrap();

        assert!(store.like(&uid("u1"), recipe.id).await.unwrap());
        assert!(!store.like(&uid("u1"), recipe.id).await.unwrap());

        let loaded = RecipeStore::get_by_id(&store, recipe.id).await.unwrap().unwrap();
        assert_eq!(loaded.loves.len(), 1);
    }

    #[tokio::test]
    async fn test_like_unknown_recipe_not_found() {
        let store = store_with_user("u1").await;
        let err = store.like(&uid("u1"), RecipeId::new(7)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let store = store_with_user("u1").await;
        let recipe = store.create(&new_recipe("A", "", "u1")).await.unwrap();
        store.like(&uid("u1"), recipe.id).await.unwrap();
        store
            .rate(&uid("u1"), recipe.id, Score::new(4.0).unwrap())
            .await
            .unwrap();

        assert!(store.delete(recipe.id).await.unwrap());
        assert!(!store.delete(recipe.id).await.unwrap());
        assert!(!store.has_loved(&uid("u1"), recipe.id).await.unwrap());
        assert!(store.ratings(recipe.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_keeps_created_at() {
        let store = store_with_user("u1").await;
        let first = UserStore::get_by_id(&store, &uid("u1")).await.unwrap().unwrap();

        let mut changed = first.clone();
        changed.first_name = "Mali".to_string();
        let second = store.upsert(&changed).await.unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.first_name, "Mali");
    }

    #[tokio::test]
    async fn test_update_profile_missing_user() {
        let store = MemoryStore::new();
        let update = ProfileUpdate {
            nick_name: Some("chef".to_string()),
            image_profile_url: None,
        };
        let err = store
            .update_profile(&uid("ghost"), &update)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
