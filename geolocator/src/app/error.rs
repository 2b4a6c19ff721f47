//! Application error types.

use std::fmt;

use crate::backend::{BackendError, BackendKind};
use crate::config::ConfigFileError;

/// Errors that can occur while starting a location session.
#[derive(Debug)]
pub enum AppError {
    /// The configured backend has no platform service behind it.
    MissingService(BackendKind),

    /// The cloud-assisted client could not be connected and falling back
    /// to the native backend was not possible.
    CloudConnection(BackendError),

    /// Configuration error.
    Config(ConfigFileError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MissingService(kind) => {
                write!(f, "No {} location service available", kind)
            }
            AppError::CloudConnection(e) => {
                write!(f, "Failed to connect to the cloud location service: {}", e)
            }
            AppError::Config(e) => {
                write!(f, "Configuration error: {}", e)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::MissingService(_) => None,
            AppError::CloudConnection(e) => Some(e),
            AppError::Config(e) => Some(e),
        }
    }
}

impl From<ConfigFileError> for AppError {
    fn from(e: ConfigFileError) -> Self {
        AppError::Config(e)
    }
}
