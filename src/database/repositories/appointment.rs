//! Appointment repository implementation

use chrono::NaiveDate;
use sqlx::PgPool;
use crate::models::appointment::{Appointment, AppointmentRecord, CreateAppointmentRequest};
use crate::utils::errors::ConsultBotError;

#[derive(Clone)]
#[derive(Debug)]
pub struct AppointmentRepository {
    pool: PgPool,
}

impl AppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &CreateAppointmentRequest) -> Result<Appointment, ConsultBotError> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointment (service_id, client_name, problem_description, request, phone_number, username, date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, service_id, client_name, problem_description, request, phone_number, username, date
            "#
        )
        .bind(request.service_id)
        .bind(&request.client_name)
        .bind(&request.problem_description)
        .bind(&request.request)
        .bind(&request.phone_number)
        .bind(&request.username)
        .bind(request.date)
        .fetch_one(&self.pool)
        .await?;

        Ok(appointment)
    }

    /// Appointments strictly between two dates with their service names
    pub async fn find_between(&self, since: NaiveDate, until: NaiveDate) -> Result<Vec<AppointmentRecord>, ConsultBotError> {
        let records = sqlx::query_as::<_, AppointmentRecord>(
            r#"
            SELECT a.username, a.client_name, COALESCE(s.name, '') AS service_name,
                   a.problem_description, a.request, a.phone_number, a.date
            FROM appointment a
            LEFT JOIN service s ON s.id = a.service_id
            WHERE a.date > $1 AND a.date < $2
            ORDER BY a.date, a.id
            "#
        )
        .bind(since)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn earliest_date(&self) -> Result<Option<NaiveDate>, ConsultBotError> {
        let date: (Option<NaiveDate>,) = sqlx::query_as("SELECT MIN(date) FROM appointment")
            .fetch_one(&self.pool)
            .await?;

        Ok(date.0)
    }
}
