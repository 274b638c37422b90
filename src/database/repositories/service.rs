//! Service catalog repository implementation

use sqlx::PgPool;
use crate::models::service::{AgeCategory, Service, ServiceDraft};
use crate::utils::errors::ConsultBotError;

#[derive(Clone)]
#[derive(Debug)]
pub struct ServiceRepository {
    pool: PgPool,
}

impl ServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Service>, ConsultBotError> {
        let services = sqlx::query_as::<_, Service>(
            "SELECT id, age_category, name, description, is_link, link FROM service ORDER BY id"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    pub async fn find_by_category(&self, category: AgeCategory) -> Result<Vec<Service>, ConsultBotError> {
        let services = sqlx::query_as::<_, Service>(
            r#"
            SELECT id, age_category, name, description, is_link, link
            FROM service
            WHERE age_category = $1
            ORDER BY id
            "#
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Service>, ConsultBotError> {
        let service = sqlx::query_as::<_, Service>(
            "SELECT id, age_category, name, description, is_link, link FROM service WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    pub async fn create(&self, draft: &ServiceDraft) -> Result<Service, ConsultBotError> {
        let service = sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO service (age_category, name, description, is_link, link)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, age_category, name, description, is_link, link
            "#
        )
        .bind(draft.age_category)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.is_link)
        .bind(&draft.link)
        .fetch_one(&self.pool)
        .await?;

        Ok(service)
    }

    /// Replace all fields; `None` when no service has this id
    pub async fn update(&self, id: i32, draft: &ServiceDraft) -> Result<Option<Service>, ConsultBotError> {
        let service = sqlx::query_as::<_, Service>(
            r#"
            UPDATE service
            SET age_category = $2, name = $3, description = $4, is_link = $5, link = $6
            WHERE id = $1
            RETURNING id, age_category, name, description, is_link, link
            "#
        )
        .bind(id)
        .bind(draft.age_category)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.is_link)
        .bind(&draft.link)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    /// Delete a service; appointments keep their rows with the reference cleared
    pub async fn delete(&self, id: i32) -> Result<bool, ConsultBotError> {
        let result = sqlx::query("DELETE FROM service WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
