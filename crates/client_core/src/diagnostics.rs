//! Three-step connectivity check against the configured backend.

use std::time::Duration;

use shared::{domain::Severity, protocol::TABLE_APPOINTMENTS};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    backend::{Backend, Projection, SelectQuery},
    rest::RestBackend,
    surface::Surface,
};

const BODY_PREVIEW_CHARS: usize = 80;
const UNAUTHORIZED: u16 = 401;

#[derive(Debug, Error)]
pub enum DiagnosticError {
    #[error("❌ Test {step}/3: {detail}")]
    Failed { step: u8, detail: String },
    #[error("❌ Excepción de red: {0}")]
    Network(String),
}

/// Runs the auth health, raw REST and client-level probes in order,
/// stopping at the first failure.
pub async fn run_diagnostics(
    rest: &RestBackend,
    surface: &dyn Surface,
    limit: Duration,
) -> Result<(), DiagnosticError> {
    let outcome = probe_all(rest, surface, limit).await;
    match &outcome {
        Ok(()) => {
            info!(backend = %rest.base_url(), "connectivity check passed");
            surface.status(Severity::Success, "✅ Conexión OK (3/3).");
        }
        Err(err) => {
            warn!(backend = %rest.base_url(), error = %err, "connectivity check failed");
            surface.status(Severity::Error, &err.to_string());
        }
    }
    outcome
}

async fn probe_all(
    rest: &RestBackend,
    surface: &dyn Surface,
    limit: Duration,
) -> Result<(), DiagnosticError> {
    surface.status(Severity::Info, "🔎 Test 1/3: /auth/v1/health…");
    let health = bounded(limit, rest.probe_auth_health()).await?;
    if !health.is_success() && health.status != UNAUTHORIZED {
        return Err(DiagnosticError::Failed {
            step: 1,
            detail: health.status.to_string(),
        });
    }

    surface.status(
        Severity::Info,
        &format!("🔎 Test 2/3: /rest/v1/{TABLE_APPOINTMENTS}?select=id…"),
    );
    let probe = bounded(limit, rest.probe_table(TABLE_APPOINTMENTS)).await?;
    if !probe.is_success() {
        let preview: String = probe.body.chars().take(BODY_PREVIEW_CHARS).collect();
        return Err(DiagnosticError::Failed {
            step: 2,
            detail: format!("{} {preview}", probe.status),
        });
    }

    surface.status(Severity::Info, "🔎 Test 3/3: select vía cliente…");
    let query = SelectQuery::new(TABLE_APPOINTMENTS, Projection::new().column("id")).limit(1);
    match tokio::time::timeout(limit, rest.select(&query)).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(err)) => Err(DiagnosticError::Failed {
            step: 3,
            detail: err.to_string(),
        }),
        Err(_) => Err(DiagnosticError::Failed {
            step: 3,
            detail: "tiempo agotado".to_string(),
        }),
    }
}

async fn bounded<T>(
    limit: Duration,
    probe: impl std::future::Future<Output = anyhow::Result<T>>,
) -> Result<T, DiagnosticError> {
    match tokio::time::timeout(limit, probe).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(DiagnosticError::Network(format!("{err:#}"))),
        Err(_) => Err(DiagnosticError::Network("tiempo agotado".to_string())),
    }
}

#[cfg(test)]
#[path = "tests/diagnostics_tests.rs"]
mod tests;
