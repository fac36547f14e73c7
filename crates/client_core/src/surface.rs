//! Presentation seam: where handlers report progress and results.

use shared::domain::{AppointmentId, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlId {
    CreateAppointment,
    MarkReceived,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlState {
    Busy { label: String },
    Idle { label: String },
}

impl ControlState {
    pub fn is_busy(&self) -> bool {
        matches!(self, ControlState::Busy { .. })
    }

    pub fn label(&self) -> &str {
        match self {
            ControlState::Busy { label } | ControlState::Idle { label } => label,
        }
    }
}

/// One rendered appointment, with every fallback already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentSummary {
    pub id: AppointmentId,
    pub time: String,
    pub date: String,
    pub brand: String,
    pub model: String,
    pub customer: String,
    pub service: String,
    pub status: String,
    pub notes: Option<String>,
}

/// Contents of the results region. Replaced wholesale on every render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Loading,
    Empty,
    Failed(String),
    Unavailable(String),
    Entries(Vec<AppointmentSummary>),
}

pub trait Surface: Send + Sync {
    fn status(&self, severity: Severity, message: &str);
    fn results(&self, view: &ListView);
    fn control(&self, control: ControlId, state: ControlState);
    fn reset_form(&self) {}
}
