use std::{fmt::Display, sync::Arc, time::Duration};

use chrono::{Local, TimeZone};
use serde::Serialize;
use serde_json::Value;
use shared::{
    domain::{AppointmentId, AppointmentStatus, CustomerId, Severity, VehicleId},
    protocol::{
        AppointmentRow, InsertedRow, NewAppointment, NewCustomer, NewVehicle, ReceptionUpdate,
        COLUMN_ID, COLUMN_SCHEDULED_AT, TABLE_APPOINTMENTS, TABLE_CUSTOMERS, TABLE_VEHICLES,
    },
};
use tracing::{info, warn};

pub mod backend;
pub mod deadline;
pub mod diagnostics;
pub mod error;
pub mod form;
pub mod ready;
pub mod render;
pub mod rest;
pub mod surface;

pub use backend::{Backend, InsertQuery, Order, Projection, SelectQuery, UpdateQuery};
pub use error::{BackendError, BookingError, Step};
pub use form::{AppointmentForm, AppointmentRequest};
pub use ready::{backend_channel, BackendPublisher, BackendReady};
pub use rest::RestBackend;
pub use surface::{AppointmentSummary, ControlId, ControlState, ListView, Surface};

use deadline::with_deadline;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_millis(3000);
pub const DEFAULT_LIST_LIMIT: u32 = 50;

pub const CREATE_LABEL: &str = "Crear cita";
pub const CREATE_BUSY_LABEL: &str = "Creando...";
pub const RECEIVE_LABEL: &str = "Marcar recibido";
pub const RECEIVE_BUSY_LABEL: &str = "Guardando...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingSettings {
    pub request_timeout: Duration,
    pub ready_timeout: Duration,
    pub list_limit: u32,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            ready_timeout: DEFAULT_READY_TIMEOUT,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

/// Listing size actually requested: never zero and never above the default.
pub fn capped_list_limit(limit: u32) -> u32 {
    limit.clamp(1, DEFAULT_LIST_LIMIT)
}

/// Projection used by the appointment listing.
pub fn appointment_projection() -> Projection {
    Projection::new()
        .column("id")
        .column("fecha_hora")
        .column("servicio")
        .column("estado")
        .column("notas")
        .relation(
            TABLE_VEHICLES,
            Projection::new()
                .column("marca")
                .column("modelo")
                .relation(TABLE_CUSTOMERS, Projection::new().column("nombre")),
        )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppointmentCreated {
    pub customer_id: CustomerId,
    pub vehicle_id: VehicleId,
    pub appointment_id: AppointmentId,
}

/// The list/create/receive handlers, wired to one backend and one surface.
///
/// Handlers never panic on remote failures: every error is written to the
/// surface before it is returned, so callers may ignore the `Err` value.
pub struct BookingService<Tz = Local>
where
    Tz: TimeZone,
{
    backend: Arc<dyn Backend>,
    surface: Arc<dyn Surface>,
    settings: BookingSettings,
    tz: Tz,
}

impl<Tz> BookingService<Tz>
where
    Tz: TimeZone + Send + Sync,
    Tz::Offset: Display + Send + Sync,
{
    pub fn new(
        backend: Arc<dyn Backend>,
        surface: Arc<dyn Surface>,
        settings: BookingSettings,
        tz: Tz,
    ) -> Self {
        Self {
            backend,
            surface,
            settings,
            tz,
        }
    }

    /// Waits for the backend handle and builds the service. When the handle
    /// never shows up, the diagnostic is rendered and nothing else runs.
    pub async fn bootstrap(
        ready: &BackendReady,
        surface: Arc<dyn Surface>,
        settings: BookingSettings,
        tz: Tz,
    ) -> Result<Self, BookingError> {
        match ready.wait(settings.ready_timeout).await {
            Ok(backend) => Ok(Self::new(backend, surface, settings, tz)),
            Err(err) => {
                surface.results(&ListView::Unavailable(err.to_string()));
                surface.status(Severity::Error, &err.status_line());
                Err(err)
            }
        }
    }

    pub async fn list_appointments(&self) -> Result<usize, BookingError> {
        self.surface.results(&ListView::Loading);

        match self.fetch_appointments().await {
            Ok(rows) if rows.is_empty() => {
                self.surface.results(&ListView::Empty);
                Ok(0)
            }
            Ok(rows) => {
                let entries: Vec<AppointmentSummary> = rows
                    .iter()
                    .map(|row| render::summarize(row, &self.tz))
                    .collect();
                let count = entries.len();
                self.surface.results(&ListView::Entries(entries));
                Ok(count)
            }
            Err(err) => {
                let message = match &err {
                    BookingError::Remote { source, .. } => source.to_string(),
                    other => other.to_string(),
                };
                self.surface.results(&ListView::Failed(message));
                Err(err)
            }
        }
    }

    async fn fetch_appointments(&self) -> Result<Vec<AppointmentRow>, BookingError> {
        let limit = capped_list_limit(self.settings.list_limit);
        let query = SelectQuery::new(TABLE_APPOINTMENTS, appointment_projection())
            .order(Order::ascending(COLUMN_SCHEDULED_AT))
            .limit(limit);
        let raw = with_deadline(
            Step::ListAppointments,
            self.settings.request_timeout,
            self.backend.select(&query),
        )
        .await?;

        let mut rows: Vec<AppointmentRow> = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<AppointmentRow>(value) {
                Ok(row) => Some(row),
                Err(err) => {
                    warn!(%err, "skipping unreadable appointment row");
                    None
                }
            })
            .collect();
        rows.sort_by_key(|row| row.scheduled_at);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    pub async fn create_appointment(
        &self,
        form: &AppointmentForm,
    ) -> Result<AppointmentCreated, BookingError> {
        self.surface.status(Severity::Neutral, "");
        let request = match form.validate(&self.tz) {
            Ok(request) => request,
            Err(err) => {
                info!("appointment form rejected");
                self.report_failure(&err);
                return Err(err);
            }
        };

        self.surface.control(
            ControlId::CreateAppointment,
            ControlState::Busy {
                label: CREATE_BUSY_LABEL.to_string(),
            },
        );

        let outcome = match self.run_create_chain(&request).await {
            Ok(created) => {
                info!(
                    appointment_id = created.appointment_id.0,
                    vehicle_id = created.vehicle_id.0,
                    customer_id = created.customer_id.0,
                    "appointment created"
                );
                self.surface.status(Severity::Success, "✅ Cita creada");
                self.surface.reset_form();
                let _ = self.list_appointments().await;
                Ok(created)
            }
            Err(err) => {
                self.report_failure(&err);
                Err(err)
            }
        };

        self.surface.control(
            ControlId::CreateAppointment,
            ControlState::Idle {
                label: CREATE_LABEL.to_string(),
            },
        );
        outcome
    }

    // Customer and vehicle rows created before a failing step stay behind.
    async fn run_create_chain(
        &self,
        request: &AppointmentRequest,
    ) -> Result<AppointmentCreated, BookingError> {
        self.surface.status(Severity::Info, "Creando cliente…");
        let customer_id = CustomerId(
            self.insert_row(
                Step::CreateCustomer,
                TABLE_CUSTOMERS,
                &NewCustomer {
                    name: request.name.clone(),
                    phone: request.phone.clone(),
                },
            )
            .await?,
        );

        self.surface.status(Severity::Info, "Creando vehículo…");
        let vehicle_id = self
            .insert_row(
                Step::CreateVehicle,
                TABLE_VEHICLES,
                &NewVehicle {
                    customer_id,
                    brand: request.brand.clone(),
                    model: request.model.clone(),
                    year: request.year,
                },
            )
            .await
            .map(VehicleId)
            .inspect_err(|_| {
                warn!(customer_id = customer_id.0, "orphaned customer after failed vehicle insert");
            })?;

        self.surface.status(Severity::Info, "Creando cita…");
        let appointment_id = self
            .insert_row(
                Step::CreateAppointment,
                TABLE_APPOINTMENTS,
                &NewAppointment {
                    vehicle_id,
                    scheduled_at: request.scheduled_at,
                    service: request.service.clone(),
                    status: AppointmentStatus::confirmed(),
                },
            )
            .await
            .map(AppointmentId)
            .inspect_err(|_| {
                warn!(
                    customer_id = customer_id.0,
                    vehicle_id = vehicle_id.0,
                    "orphaned customer and vehicle after failed appointment insert"
                );
            })?;

        Ok(AppointmentCreated {
            customer_id,
            vehicle_id,
            appointment_id,
        })
    }

    async fn insert_row<T>(&self, step: Step, table: &str, row: &T) -> Result<i64, BookingError>
    where
        T: Serialize + Sync,
    {
        let query = InsertQuery::new(table, row)
            .map_err(|source| BookingError::Remote { step, source })?
            .returning();
        let inserted = with_deadline(
            step,
            self.settings.request_timeout,
            self.backend.insert(&query),
        )
        .await?;

        let row = inserted.ok_or_else(|| {
            BookingError::Unexpected(format!("{table}: el backend no devolvió la fila creada"))
        })?;
        inserted_id(table, row)
    }

    pub async fn mark_received(
        &self,
        appointment_id: &str,
        notes: &str,
    ) -> Result<AppointmentId, BookingError> {
        let id = match form::parse_appointment_id(appointment_id) {
            Ok(id) => id,
            Err(err) => {
                info!("reception update rejected: invalid appointment id");
                self.report_failure(&err);
                return Err(err);
            }
        };

        self.surface.control(
            ControlId::MarkReceived,
            ControlState::Busy {
                label: RECEIVE_BUSY_LABEL.to_string(),
            },
        );
        self.surface
            .status(Severity::Info, &format!("Marcando cita #{id} en recepción…"));

        let outcome = match self.update_reception(id, notes).await {
            Ok(()) => {
                info!(appointment_id = id.0, "appointment marked as received");
                self.surface.status(
                    Severity::Success,
                    &format!("✅ Cita #{id} marcada en recepción"),
                );
                let _ = self.list_appointments().await;
                Ok(id)
            }
            Err(err) => {
                self.report_failure(&err);
                Err(err)
            }
        };

        self.surface.control(
            ControlId::MarkReceived,
            ControlState::Idle {
                label: RECEIVE_LABEL.to_string(),
            },
        );
        outcome
    }

    async fn update_reception(&self, id: AppointmentId, notes: &str) -> Result<(), BookingError> {
        let update = ReceptionUpdate {
            status: AppointmentStatus::in_reception(),
            notes: form::normalize_notes(notes),
        };
        let query = UpdateQuery::new(TABLE_APPOINTMENTS, &update, COLUMN_ID, id.0).map_err(
            |source| BookingError::Remote {
                step: Step::MarkReceived,
                source,
            },
        )?;
        with_deadline(
            Step::MarkReceived,
            self.settings.request_timeout,
            self.backend.update(&query),
        )
        .await
    }

    fn report_failure(&self, err: &BookingError) {
        self.surface.status(Severity::Error, &err.status_line());
    }
}

fn inserted_id(table: &str, row: Value) -> Result<i64, BookingError> {
    serde_json::from_value::<InsertedRow>(row)
        .map(|row| row.id)
        .map_err(|err| BookingError::Unexpected(format!("{table}: fila creada sin id ({err})")))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
