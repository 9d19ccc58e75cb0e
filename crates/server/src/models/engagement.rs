//! Ratings and loves: how users interact with recipes.

use chrono::{DateTime, Utc};

use forkful_core::{LoveId, RatingId, RecipeId, Score, UserId};

/// A single rating left on a recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    pub id: RatingId,
    pub recipe_id: RecipeId,
    pub user_id: UserId,
    pub score: Score,
    pub created_at: DateTime<Utc>,
}

/// "User favorited recipe". At most one per (user, recipe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeLove {
    pub id: LoveId,
    pub user_id: UserId,
    pub recipe_id: RecipeId,
    pub created_at: DateTime<Utc>,
}

/// Mean score of `ratings`, or `0.0` when there are none.
#[must_use]
pub fn average_rating(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }

    let total: f64 = ratings.iter().map(|r| r.score.value()).sum();
    #[allow(clippy::cast_precision_loss)] // Rating counts will never exceed f64 precision
    let count = ratings.len() as f64;
    total / count
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rating(id: i32, score: f64) -> Rating {
        Rating {
            id: RatingId::new(id),
            recipe_id: RecipeId::new(1),
            user_id: UserId::parse("u1").unwrap(),
            score: Score::new(score).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_average_of_empty_is_zero() {
        assert!((average_rating(&[]) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_of_one() {
        assert!((average_rating(&[rating(1, 4.0)]) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_is_sum_over_count() {
        let ratings = [rating(1, 5.0), rating(2, 4.0), rating(3, 1.5)];
        let expected = (5.0 + 4.0 + 1.5) / 3.0;
        assert!((average_rating(&ratings) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_average_of_identical_scores() {
        let ratings: Vec<Rating> = (1..=50).map(|i| rating(i, 3.0)).collect();
        assert!((average_rating(&ratings) - 3.0).abs() < 1e-9);
    }
}
