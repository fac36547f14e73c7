use std::fmt;

use shared::error::ApiException;
use thiserror::Error;

/// Failure reported by a [`crate::backend::Backend`] implementation.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Api(#[from] ApiException),
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected backend response: {0}")]
    Decode(String),
}

/// Remote operations issued by the booking handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ListAppointments,
    CreateCustomer,
    CreateVehicle,
    CreateAppointment,
    MarkReceived,
}

impl Step {
    /// Operation name shown when the call runs out of time.
    pub fn label(self) -> &'static str {
        match self {
            Step::ListAppointments => "listar citas",
            Step::CreateCustomer => "crear cliente",
            Step::CreateVehicle => "crear vehículo",
            Step::CreateAppointment => "crear cita",
            Step::MarkReceived => "marcar recepción",
        }
    }

    /// Prefix attached to a backend error raised by this step.
    pub fn failure_prefix(self) -> &'static str {
        match self {
            Step::ListAppointments => "Error al cargar",
            Step::CreateCustomer => "Error cliente",
            Step::CreateVehicle => "Error vehículo",
            Step::CreateAppointment => "Error cita",
            Step::MarkReceived => "Error recepción",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0}")]
    NotReady(String),
    #[error("{0}")]
    Validation(String),
    #[error("{}: {source}", .step.failure_prefix())]
    Remote { step: Step, source: BackendError },
    #[error("⏳ Tiempo agotado en {step}")]
    Timeout { step: Step },
    #[error("{0}")]
    Unexpected(String),
}

impl BookingError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BookingError::Timeout { .. })
    }

    /// One-line text written to the status region.
    pub fn status_line(&self) -> String {
        match self {
            BookingError::Validation(message) => message.clone(),
            other => format!("❌ {other}"),
        }
    }
}
