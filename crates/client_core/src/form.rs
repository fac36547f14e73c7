//! Raw form input and its validation into request values.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use shared::domain::AppointmentId;

use crate::error::BookingError;

pub const MISSING_FIELDS_MESSAGE: &str = "Completa todos los campos obligatorios.";
pub const INVALID_ID_MESSAGE: &str = "Ingresa un ID de cita válido.";

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Field values exactly as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentForm {
    pub name: String,
    pub phone: String,
    pub brand: String,
    pub model: String,
    pub year: String,
    pub scheduled_for: String,
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentRequest {
    pub name: String,
    pub phone: Option<String>,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub scheduled_at: DateTime<Utc>,
    pub service: String,
}

impl AppointmentForm {
    /// Validates every required field, interpreting the date in `tz`.
    pub fn validate<Tz: TimeZone>(&self, tz: &Tz) -> Result<AppointmentRequest, BookingError> {
        let missing = || BookingError::Validation(MISSING_FIELDS_MESSAGE.to_string());

        let name = required(&self.name).ok_or_else(missing)?;
        let brand = required(&self.brand).ok_or_else(missing)?;
        let model = required(&self.model).ok_or_else(missing)?;
        let service = required(&self.service).ok_or_else(missing)?;
        let year = parse_year(&self.year).ok_or_else(missing)?;
        let scheduled_at = parse_local_datetime(&self.scheduled_for, tz).ok_or_else(missing)?;

        Ok(AppointmentRequest {
            name,
            phone: required(&self.phone),
            brand,
            model,
            year,
            scheduled_at,
            service,
        })
    }
}

fn required(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_year(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok().filter(|year| *year != 0)
}

/// Parses a `datetime-local` style value in `tz`. Ambiguous local times
/// resolve to the earliest instant; nonexistent ones are rejected.
pub fn parse_local_datetime<Tz: TimeZone>(value: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

pub fn parse_appointment_id(value: &str) -> Result<AppointmentId, BookingError> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .map(AppointmentId)
        .ok_or_else(|| BookingError::Validation(INVALID_ID_MESSAGE.to_string()))
}

/// Blank notes clear the stored value.
pub fn normalize_notes(value: &str) -> Option<String> {
    required(value)
}
