use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use client_core::{
    backend_channel, diagnostics::run_diagnostics, AppointmentForm, Backend, BookingService,
    RestBackend, Surface,
};
use shared::domain::Severity;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod terminal;

use config::{load_settings, DEFAULT_CONFIG_PATH};
use terminal::TerminalSurface;

#[derive(Parser, Debug)]
#[command(name = "taller", about = "Agenda de citas del taller")]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List upcoming appointments.
    List,
    /// Register customer, vehicle and appointment in one go.
    Create(CreateArgs),
    /// Mark an appointment as received at the workshop.
    Receive {
        id: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Check connectivity with the backend.
    Diagnose,
}

// Empty defaults let the booking form report missing fields itself.
#[derive(Args, Debug)]
struct CreateArgs {
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "")]
    brand: String,
    #[arg(long, default_value = "")]
    model: String,
    #[arg(long, default_value = "")]
    year: String,
    /// Local date and time, e.g. 2025-09-09T10:00
    #[arg(long, default_value = "")]
    date: String,
    #[arg(long, default_value = "")]
    service: String,
}

impl From<CreateArgs> for AppointmentForm {
    fn from(args: CreateArgs) -> Self {
        Self {
            name: args.name,
            phone: args.phone,
            brand: args.brand,
            model: args.model,
            year: args.year,
            scheduled_for: args.date,
            service: args.service,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let settings = load_settings(&cli.config);
    if settings.anon_key.is_empty() {
        warn!("anon key is empty; the backend will likely reject requests");
    }
    let surface: Arc<dyn Surface> = Arc::new(TerminalSurface);
    surface.status(
        Severity::Info,
        &format!(
            "Conectado a {} • anon len: {}",
            settings.backend_url,
            settings.anon_key.len()
        ),
    );

    let rest = Arc::new(
        RestBackend::new(&settings.backend_url, settings.anon_key.clone())
            .context("failed to configure backend client")?,
    );

    if let Command::Diagnose = cli.command {
        let outcome =
            run_diagnostics(&rest, surface.as_ref(), settings.booking().request_timeout).await;
        return Ok(exit_code(outcome.is_ok()));
    }

    let (publisher, ready) = backend_channel();
    let backend: Arc<dyn Backend> = rest;
    tokio::spawn(async move {
        publisher.publish(backend);
    });

    let Ok(booking) =
        BookingService::bootstrap(&ready, surface.clone(), settings.booking(), Local).await
    else {
        return Ok(ExitCode::FAILURE);
    };
    info!(backend = %settings.backend_url, "booking client ready");

    let succeeded = match cli.command {
        Command::List => booking.list_appointments().await.is_ok(),
        Command::Create(args) => booking
            .create_appointment(&AppointmentForm::from(args))
            .await
            .is_ok(),
        Command::Receive { id, notes } => booking.mark_received(&id, &notes).await.is_ok(),
        Command::Diagnose => true,
    };

    Ok(exit_code(succeeded))
}

fn exit_code(succeeded: bool) -> ExitCode {
    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
