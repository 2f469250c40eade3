//! User repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::user::{User, UpsertUserRequest};
use crate::utils::errors::PlanlyError;

#[derive(Clone)]
#[derive(Debug)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the user or refresh its display name
    pub async fn upsert(&self, request: &UpsertUserRequest) -> Result<User, PlanlyError> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (id) DO UPDATE
            SET name = COALESCE(EXCLUDED.name, users.name),
                updated_at = EXCLUDED.updated_at
            RETURNING id, name, is_friend_added, created_at, updated_at
            "#
        )
        .bind(&request.id)
        .bind(&request.name)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, PlanlyError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, is_friend_added, created_at, updated_at FROM users WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Flip the friend flag; `None` if the user does not exist
    pub async fn set_friend_added(&self, id: &str) -> Result<Option<User>, PlanlyError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_friend_added = TRUE,
                updated_at = CASE WHEN is_friend_added THEN updated_at ELSE $2 END
            WHERE id = $1
            RETURNING id, name, is_friend_added, created_at, updated_at
            "#
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Count total users
    pub async fn count(&self) -> Result<i64, PlanlyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
