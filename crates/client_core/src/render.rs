use std::fmt::{Display, Write as _};

use chrono::{DateTime, TimeZone, Utc};
use shared::protocol::AppointmentRow;

use crate::surface::{AppointmentSummary, ListView};

pub const LOADING_TEXT: &str = "Cargando citas…";
pub const EMPTY_TEXT: &str = "Sin citas registradas aún.";
pub const MISSING_BRAND: &str = "—";
pub const MISSING_CUSTOMER: &str = "Cliente";

pub fn format_time<Tz>(ts: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ts.with_timezone(tz).format("%H:%M").to_string()
}

pub fn format_date<Tz>(ts: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ts.with_timezone(tz).format("%d/%m/%Y").to_string()
}

pub fn summarize<Tz>(row: &AppointmentRow, tz: &Tz) -> AppointmentSummary
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let vehicle = row.vehicle.as_ref();
    let brand = vehicle
        .and_then(|v| v.brand.clone())
        .unwrap_or_else(|| MISSING_BRAND.to_string());
    let model = vehicle.and_then(|v| v.model.clone()).unwrap_or_default();
    let customer = vehicle
        .and_then(|v| v.customer.as_ref())
        .and_then(|c| c.name.clone())
        .unwrap_or_else(|| MISSING_CUSTOMER.to_string());
    let notes = row
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    AppointmentSummary {
        id: row.id,
        time: format_time(&row.scheduled_at, tz),
        date: format_date(&row.scheduled_at, tz),
        brand,
        model,
        customer,
        service: row.service.clone().unwrap_or_default(),
        status: row
            .status
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        notes,
    }
}

pub fn render_summary(summary: &AppointmentSummary) -> String {
    let mut out = format!(
        "{} — {} {} ({}) #{}\n",
        summary.time, summary.brand, summary.model, summary.date, summary.id
    );
    let _ = writeln!(
        out,
        "  Cliente: {} • {} • Estado: {}",
        summary.customer, summary.service, summary.status
    );
    if let Some(notes) = &summary.notes {
        let _ = writeln!(out, "  Notas: {notes}");
    }
    out
}

pub fn render_list_view(view: &ListView) -> String {
    match view {
        ListView::Loading => format!("{LOADING_TEXT}\n"),
        ListView::Empty => format!("{EMPTY_TEXT}\n"),
        ListView::Failed(message) => format!("Error al cargar: {message}\n"),
        ListView::Unavailable(message) => format!("{message}\n"),
        ListView::Entries(entries) => entries
            .iter()
            .map(render_summary)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
