//! Persistence port for user state tokens
//!
//! The engine only needs three operations on users, so it depends on this
//! trait rather than on the Postgres repository. Tests plug in an
//! in-memory store.

use async_trait::async_trait;
use crate::utils::errors::Result;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Current state token, `None` when the user has never written to the bot
    async fn get_state(&self, telegram_id: i64) -> Result<Option<String>>;

    /// Overwrite the state token, keeping the old one as `previous_state`
    async fn set_state(&self, telegram_id: i64, state: &str, username: Option<&str>) -> Result<()>;

    /// Register a user on first contact
    async fn create_user(&self, telegram_id: i64, state: &str, username: Option<&str>) -> Result<()>;
}
