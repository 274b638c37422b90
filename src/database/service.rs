//! Database service layer
//!
//! Bundles the repositories and exposes them through the ports the dialog
//! engine depends on.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;
use crate::database::{AppointmentRepository, DatabasePool, ServiceRepository, UserRepository};
use crate::models::*;
use crate::services::{AppointmentBook, Catalog};
use crate::state::UserStore;
use crate::utils::errors::{ConsultBotError, Result};

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub users: UserRepository,
    pub services: ServiceRepository,
    pub appointments: AppointmentRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            services: ServiceRepository::new(pool.clone()),
            appointments: AppointmentRepository::new(pool),
        }
    }
}

#[async_trait]
impl UserStore for DatabaseService {
    async fn get_state(&self, telegram_id: i64) -> Result<Option<String>> {
        self.users.get_state(telegram_id).await
    }

    async fn set_state(&self, telegram_id: i64, state: &str, username: Option<&str>) -> Result<()> {
        self.users.set_state(telegram_id, state, username).await
    }

    async fn create_user(&self, telegram_id: i64, state: &str, username: Option<&str>) -> Result<()> {
        let user = self
            .users
            .create(CreateUserRequest {
                telegram_id,
                state: state.to_string(),
                username: username.map(str::to_string),
            })
            .await?;
        debug!(user_id = user.telegram_id, row_id = user.id, "User row stored");
        Ok(())
    }
}

#[async_trait]
impl Catalog for DatabaseService {
    async fn list_services(&self) -> Result<Vec<Service>> {
        self.services.list().await
    }

    async fn services_by_category(&self, category: AgeCategory) -> Result<Vec<Service>> {
        self.services.find_by_category(category).await
    }

    async fn get_service(&self, id: i32) -> Result<Option<Service>> {
        self.services.find_by_id(id).await
    }

    async fn create_service(&self, draft: &ServiceDraft) -> Result<Service> {
        self.services.create(draft).await
    }

    async fn update_service(&self, id: i32, draft: &ServiceDraft) -> Result<Service> {
        self.services
            .update(id, draft)
            .await?
            .ok_or(ConsultBotError::ServiceNotFound { service_id: id })
    }

    async fn delete_service(&self, id: i32) -> Result<()> {
        if !self.services.delete(id).await? {
            debug!(service_id = id, "Delete requested for a missing service");
        }
        Ok(())
    }
}

#[async_trait]
impl AppointmentBook for DatabaseService {
    async fn create_appointment(&self, request: &CreateAppointmentRequest) -> Result<Appointment> {
        self.appointments.create(request).await
    }

    async fn appointments_between(&self, since: NaiveDate, until: NaiveDate) -> Result<Vec<AppointmentRecord>> {
        self.appointments.find_between(since, until).await
    }

    async fn earliest_date(&self) -> Result<Option<NaiveDate>> {
        self.appointments.earliest_date().await
    }
}
