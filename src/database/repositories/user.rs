//! User repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::user::{User, CreateUserRequest};
use crate::utils::errors::ConsultBotError;

const USER_COLUMNS: &str = "id, telegram_id, state, previous_state, username, created_at, updated_at";

#[derive(Clone)]
#[derive(Debug)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a user; a concurrent first contact just takes the new state
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, ConsultBotError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (telegram_id, state, username, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (telegram_id) DO UPDATE
            SET previous_state = users.state,
                state = EXCLUDED.state,
                username = COALESCE(EXCLUDED.username, users.username),
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(request.telegram_id)
        .bind(request.state)
        .bind(request.username)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find user by Telegram ID
    pub async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, ConsultBotError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE telegram_id = $1",
            USER_COLUMNS
        ))
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Current state token of a user
    pub async fn get_state(&self, telegram_id: i64) -> Result<Option<String>, ConsultBotError> {
        let state = sqlx::query_scalar::<_, String>("SELECT state FROM users WHERE telegram_id = $1")
            .bind(telegram_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(state)
    }

    /// Overwrite the state token, moving the old one to `previous_state`
    pub async fn set_state(&self, telegram_id: i64, state: &str, username: Option<&str>) -> Result<(), ConsultBotError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET previous_state = state,
                state = $2,
                username = COALESCE($3, username),
                updated_at = $4
            WHERE telegram_id = $1
            "#
        )
        .bind(telegram_id)
        .bind(state)
        .bind(username)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ConsultBotError::UserNotFound { user_id: telegram_id });
        }

        Ok(())
    }
}
