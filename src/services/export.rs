//! Appointment export
//!
//! Admins download booked appointments as a spreadsheet-friendly CSV file.
//! A UTF-8 byte order mark is written first so spreadsheet software picks
//! the right encoding for the Cyrillic headers.

use crate::models::AppointmentRecord;
use crate::utils::errors::{ConsultBotError, Result};
use crate::utils::helpers::format_user_date;
use super::notification::Document;

const BOM: &[u8] = b"\xEF\xBB\xBF";

pub const HEADERS: [&str; 7] = [
    "Алиас",
    "Имя",
    "Услуга",
    "Описание проблемы",
    "Запрос",
    "Номер телефона",
    "Дата",
];

/// Render appointment records into a CSV document
pub fn appointments_csv(records: &[AppointmentRecord], file_name: &str) -> Result<Document> {
    let mut writer = csv::Writer::from_writer(BOM.to_vec());
    writer.write_record(HEADERS)?;

    for record in records {
        let date = format_user_date(record.date);
        writer.write_record([
            record.username.as_deref().unwrap_or_default(),
            record.client_name.as_str(),
            record.service_name.as_str(),
            record.problem_description.as_str(),
            record.request.as_str(),
            record.phone_number.as_str(),
            date.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ConsultBotError::Io(e.into_error()))?;

    Ok(Document {
        file_name: file_name.to_string(),
        bytes,
    })
}
