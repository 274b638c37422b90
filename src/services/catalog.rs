//! Service catalog port

use async_trait::async_trait;
use crate::models::{AgeCategory, Service, ServiceDraft};
use crate::utils::errors::Result;

/// Storage of the services offered to clients
#[async_trait]
pub trait Catalog: Send + Sync {
    /// All services, ordered by id
    async fn list_services(&self) -> Result<Vec<Service>>;

    async fn services_by_category(&self, category: AgeCategory) -> Result<Vec<Service>>;

    async fn get_service(&self, id: i32) -> Result<Option<Service>>;

    async fn create_service(&self, draft: &ServiceDraft) -> Result<Service>;

    /// Replace every field of an existing service
    async fn update_service(&self, id: i32, draft: &ServiceDraft) -> Result<Service>;

    async fn delete_service(&self, id: i32) -> Result<()>;
}
