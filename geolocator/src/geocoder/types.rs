//! Reverse geocoding contracts and outcomes.

use std::fmt;

use futures::future::BoxFuture;
use thiserror::Error;

use super::format::display_text;
use crate::location::Address;

/// Number of addresses asked from the service per lookup.
pub const MAX_RESULTS: usize = 1;

/// Errors raised by a geocoding service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeocodeError {
    /// No network connection; the service was not called.
    #[error("No network connection")]
    Offline,

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Failed to parse geocoder response: {0}")]
    Parse(String),

    /// The service answered but reported a failure of its own.
    #[error("Geocoding service error: {0}")]
    Service(String),
}

/// Outcome of one lookup.
///
/// `NotFound` means the lookup ran and found nothing usable. `LookupFailed`
/// means it could not run to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeocodeOutcome {
    Found(Address),
    NotFound,
    LookupFailed(GeocodeError),
}

impl GeocodeOutcome {
    pub fn address(&self) -> Option<&Address> {
        match self {
            GeocodeOutcome::Found(address) => Some(address),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, GeocodeOutcome::Found(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, GeocodeOutcome::LookupFailed(_))
    }
}

/// Address lookup capability.
pub trait GeocodingService: Send + Sync {
    /// Find up to `max_results` addresses near a coordinate.
    ///
    /// An empty vector means nothing was found.
    fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
        max_results: usize,
    ) -> BoxFuture<'_, Result<Vec<Address>, GeocodeError>>;
}

/// Network reachability probe consulted before each lookup.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Identity of one submitted lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeocodeRequestId(pub(crate) u64);

impl fmt::Display for GeocodeRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "geocode-{}", self.0)
    }
}

/// A finished lookup, as delivered to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressReport {
    pub request_id: GeocodeRequestId,
    pub latitude: f64,
    pub longitude: f64,
    pub outcome: GeocodeOutcome,
}

impl AddressReport {
    /// Text to show the user: the formatted address, or the fallback
    /// message for `NotFound` and `LookupFailed` alike.
    pub fn display(&self) -> String {
        display_text(&self.outcome)
    }

    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}
