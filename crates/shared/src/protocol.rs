use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::domain::{AppointmentId, AppointmentStatus, CustomerId, VehicleId};

pub const TABLE_CUSTOMERS: &str = "clientes";
pub const TABLE_VEHICLES: &str = "vehiculos";
pub const TABLE_APPOINTMENTS: &str = "citas";

pub const COLUMN_ID: &str = "id";
pub const COLUMN_SCHEDULED_AT: &str = "fecha_hora";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewCustomer {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "telefono")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewVehicle {
    #[serde(rename = "cliente_id")]
    pub customer_id: CustomerId,
    #[serde(rename = "marca")]
    pub brand: String,
    #[serde(rename = "modelo")]
    pub model: String,
    #[serde(rename = "anio")]
    pub year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewAppointment {
    #[serde(rename = "vehiculo_id")]
    pub vehicle_id: VehicleId,
    #[serde(rename = "fecha_hora")]
    pub scheduled_at: DateTime<Utc>,
    #[serde(rename = "servicio")]
    pub service: String,
    #[serde(rename = "estado")]
    pub status: AppointmentStatus,
}

/// Values written when a vehicle is checked in at the workshop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReceptionUpdate {
    #[serde(rename = "estado")]
    pub status: AppointmentStatus,
    #[serde(rename = "notas")]
    pub notes: Option<String>,
}

/// Minimal shape of a row echoed back by an insert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsertedRow {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerRef {
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VehicleRef {
    #[serde(rename = "marca", default)]
    pub brand: Option<String>,
    #[serde(rename = "modelo", default)]
    pub model: Option<String>,
    #[serde(rename = "clientes", default)]
    pub customer: Option<CustomerRef>,
}

/// One appointment as returned by the joined listing query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppointmentRow {
    pub id: AppointmentId,
    #[serde(rename = "fecha_hora", deserialize_with = "deserialize_timestamp")]
    pub scheduled_at: DateTime<Utc>,
    #[serde(rename = "servicio", default)]
    pub service: Option<String>,
    #[serde(rename = "estado", default)]
    pub status: Option<AppointmentStatus>,
    #[serde(rename = "notas", default)]
    pub notes: Option<String>,
    #[serde(rename = "vehiculos", default)]
    pub vehicle: Option<VehicleRef>,
}

/// Reads an RFC 3339 timestamp, or a zone-less one (`timestamp` columns) as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp `{raw}`")))
}
