use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the backend's REST surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiException {
    pub status: u16,
    pub code: Option<String>,
    pub message: String,
}

impl ApiException {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            code: None,
            message: message.into(),
        }
    }
}

impl ApiError {
    pub fn into_exception(self, status: u16) -> ApiException {
        ApiException {
            status,
            code: self.code,
            message: self.message,
        }
    }
}
