//! User repository for database operations.
//!
//! Users are keyed by the identity-provider subject. Rows are soft-deleted
//! through `deleted_at`; lookups ignore deleted rows and an upsert revives
//! them.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use forkful_core::UserId;

use super::{RepositoryError, UserStore};
use crate::models::{ProfileUpdate, User};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    first_name: String,
    last_name: String,
    nick_name: String,
    image_profile_url: String,
    nick_name_customized: bool,
    image_customized: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = UserId::parse(&row.id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid user id in database: {e}"))
        })?;

        Ok(Self {
            id,
            first_name: row.first_name,
            last_name: row.last_name,
            nick_name: row.nick_name,
            image_profile_url: row.image_profile_url,
            nick_name_customized: row.nick_name_customized,
            image_customized: row.image_customized,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserStore for UserRepository {
    async fn get_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, first_name, last_name, nick_name, image_profile_url,
                   nick_name_customized, image_customized, created_at, updated_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn upsert(&self, user: &User) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users
                (id, first_name, last_name, nick_name, image_profile_url,
                 nick_name_customized, image_customized)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                nick_name = EXCLUDED.nick_name,
                image_profile_url = EXCLUDED.image_profile_url,
                nick_name_customized = EXCLUDED.nick_name_customized,
                image_customized = EXCLUDED.image_customized,
                updated_at = NOW(),
                deleted_at = NULL
            RETURNING id, first_name, last_name, nick_name, image_profile_url,
                      nick_name_customized, image_customized, created_at, updated_at
            ",
        )
        .bind(user.id.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.nick_name)
        .bind(&user.image_profile_url)
        .bind(user.nick_name_customized)
        .bind(user.image_customized)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET
                nick_name = COALESCE($2, nick_name),
                nick_name_customized = nick_name_customized OR $2 IS NOT NULL,
                image_profile_url = COALESCE($3, image_profile_url),
                image_customized = image_customized OR $3 IS NOT NULL,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id.as_str())
        .bind(update.nick_name.as_deref())
        .bind(update.image_profile_url.as_deref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
