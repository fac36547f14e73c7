//! One-shot publication of the backend handle from the startup routine.

use std::{sync::Arc, time::Duration};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::{backend::Backend, error::BookingError};

pub const NOT_READY_MESSAGE: &str =
    "El backend no está inicializado. Revisa la configuración (URL y anon key) y vuelve a intentar.";

type Slot = Option<Arc<dyn Backend>>;

/// Creates a linked publisher/readiness pair.
pub fn backend_channel() -> (BackendPublisher, BackendReady) {
    let (tx, rx) = watch::channel(None);
    (BackendPublisher { tx }, BackendReady { rx })
}

/// Held by the initialization step. Consumed on publish so the handle is set
/// exactly once.
pub struct BackendPublisher {
    tx: watch::Sender<Slot>,
}

impl BackendPublisher {
    pub fn publish(self, backend: Arc<dyn Backend>) {
        self.tx.send_replace(Some(backend));
        info!("backend client published");
    }
}

#[derive(Clone)]
pub struct BackendReady {
    rx: watch::Receiver<Slot>,
}

impl BackendReady {
    /// Waits for the handle, giving up after `limit` or when the publisher is
    /// dropped without publishing.
    pub async fn wait(&self, limit: Duration) -> Result<Arc<dyn Backend>, BookingError> {
        let mut rx = self.rx.clone();
        let waited = tokio::time::timeout(limit, async {
            rx.wait_for(Option::is_some)
                .await
                .ok()
                .and_then(|slot| slot.clone())
        })
        .await;

        match waited {
            Ok(Some(backend)) => Ok(backend),
            Ok(None) => {
                warn!("backend publisher dropped before publishing");
                Err(BookingError::NotReady(NOT_READY_MESSAGE.to_string()))
            }
            Err(_) => {
                warn!(limit_ms = limit.as_millis() as u64, "backend not ready in time");
                Err(BookingError::NotReady(NOT_READY_MESSAGE.to_string()))
            }
        }
    }
}
