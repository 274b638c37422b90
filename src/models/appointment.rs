//! Appointment model

use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: i32,
    /// Cleared when the service is deleted
    pub service_id: Option<i32>,
    pub client_name: String,
    pub problem_description: String,
    pub request: String,
    pub phone_number: String,
    pub username: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub service_id: i32,
    pub client_name: String,
    pub problem_description: String,
    pub request: String,
    pub phone_number: String,
    pub username: Option<String>,
    pub date: NaiveDate,
}

/// Appointment joined with its service name, as exported to admins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AppointmentRecord {
    pub username: Option<String>,
    pub client_name: String,
    pub service_name: String,
    pub problem_description: String,
    pub request: String,
    pub phone_number: String,
    pub date: NaiveDate,
}
