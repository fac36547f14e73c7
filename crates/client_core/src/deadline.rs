use std::{future::Future, time::Duration};

use tracing::warn;

use crate::error::{BackendError, BookingError, Step};

/// Runs one remote call under a deadline. On expiry the call future is
/// dropped, which cancels the in-flight request.
pub async fn with_deadline<T, F>(step: Step, limit: Duration, call: F) -> Result<T, BookingError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => {
            warn!(step = %step, error = %source, "remote call failed");
            Err(BookingError::Remote { step, source })
        }
        Err(_) => {
            warn!(step = %step, limit_ms = limit.as_millis() as u64, "remote call timed out");
            Err(BookingError::Timeout { step })
        }
    }
}
