//! Coordinator error types.

use thiserror::Error;

use crate::backend::{BackendError, NativeProvider};
use crate::location::PermissionScope;

/// Terminal failure reported to the sink.
///
/// The `Display` text is the one notification the user sees.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("Location permission ({scope}) was denied")]
    PermissionDenied { scope: PermissionScope },

    #[error("The {0} location provider is disabled, enable it in the system settings")]
    ProviderDisabled(NativeProvider),

    #[error("Location settings cannot satisfy the request")]
    SettingsUnresolvable,

    /// The user turned down the settings resolution flow.
    #[error("Location settings not changed")]
    SettingsDeclined,

    #[error("Location provider is no longer available")]
    ProviderLost,

    /// The cloud-assisted client has not finished connecting.
    #[error("Location service is connecting, try again shortly")]
    ServiceConnecting,

    #[error("Location updates could not be started: {0}")]
    SubscriptionFailed(String),
}

impl ErrorKind {
    /// Whether this is one of the settings failures.
    pub fn is_settings_error(&self) -> bool {
        matches!(self, ErrorKind::SettingsUnresolvable | ErrorKind::SettingsDeclined)
    }
}

impl From<BackendError> for ErrorKind {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::ProviderDisabled(provider) => ErrorKind::ProviderDisabled(provider),
            BackendError::NotConnected => ErrorKind::ServiceConnecting,
            BackendError::ConnectionFailed(reason) | BackendError::Service(reason) => {
                ErrorKind::SubscriptionFailed(reason)
            }
        }
    }
}

/// Errors returned by [`CoordinatorHandle`](super::CoordinatorHandle).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    /// The coordinator task has stopped.
    #[error("Coordinator is not running")]
    Closed,
}
