//! Appointment book port

use async_trait::async_trait;
use chrono::NaiveDate;
use crate::models::{Appointment, AppointmentRecord, CreateAppointmentRequest};
use crate::utils::errors::Result;

#[async_trait]
pub trait AppointmentBook: Send + Sync {
    async fn create_appointment(&self, request: &CreateAppointmentRequest) -> Result<Appointment>;

    /// Appointments dated strictly after `since` and strictly before `until`,
    /// joined with their service names
    async fn appointments_between(&self, since: NaiveDate, until: NaiveDate) -> Result<Vec<AppointmentRecord>>;

    /// Date of the oldest appointment, if any exist
    async fn earliest_date(&self) -> Result<Option<NaiveDate>>;
}
