use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(CustomerId);
id_newtype!(VehicleId);
id_newtype!(AppointmentId);

pub const STATUS_CONFIRMED: &str = "confirmada";
pub const STATUS_IN_RECEPTION: &str = "en_recepción";

/// Appointment status as stored by the backend.
///
/// The set of values is open-ended; the workshop staff may set statuses this
/// client has never seen, so unknown values are carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentStatus(pub String);

impl AppointmentStatus {
    pub fn confirmed() -> Self {
        Self(STATUS_CONFIRMED.to_string())
    }

    pub fn in_reception() -> Self {
        Self(STATUS_IN_RECEPTION.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Neutral,
    Info,
    Success,
    Error,
}
