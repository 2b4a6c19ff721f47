//! Settings client contract and outcomes.

use std::fmt;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::location::UpdateRequest;

/// Opaque key for a user-facing settings resolution flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolutionToken(u64);

impl ResolutionToken {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResolutionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resolution-{}", self.0)
    }
}

/// Identity of one settings check. Completions carrying a superseded id
/// are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NegotiationId(pub(crate) u64);

impl fmt::Display for NegotiationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the settings service reports for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsStatus {
    Satisfied,
    /// Fixable through the resolution flow keyed by the token.
    ResolutionRequired(ResolutionToken),
    /// Cannot be fixed from the device.
    Unavailable,
}

/// Result of a negotiation as seen by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsOutcome {
    Satisfied,
    Resolvable(ResolutionToken),
    Unresolvable,
}

/// Errors raised by a settings client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsClientError {
    /// The settings service could not be reached.
    #[error("Settings service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The service answered with something we cannot interpret.
    #[error("Unexpected settings response: {0}")]
    UnexpectedResponse(String),
}

/// Vendor settings API consumed by the cloud-assisted backend.
pub trait SettingsClient: Send + Sync {
    /// Check whether ambient device settings can satisfy `request`.
    fn check_settings(
        &self,
        request: &UpdateRequest,
    ) -> BoxFuture<'_, Result<SettingsStatus, SettingsClientError>>;
}
