//! Core location types shared by every layer of the engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default interval between updates requested from a provider (milliseconds).
pub const DEFAULT_INTERVAL_MILLIS: u64 = 10_000;

/// Default fastest interval the cloud-assisted provider may deliver at (milliseconds).
pub const DEFAULT_FASTEST_INTERVAL_MILLIS: u64 = 5_000;

/// Default minimum displacement between native provider updates (meters).
pub const DEFAULT_MIN_DISTANCE_METERS: u32 = 10;

/// Desired precision/power tradeoff for a location request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyTier {
    /// GPS-class precision, requires fine location permission.
    High,
    /// Network-class precision, requires coarse location permission.
    Balanced,
}

impl AccuracyTier {
    /// Permission scope required to receive updates at this tier.
    pub fn required_scope(&self) -> PermissionScope {
        match self {
            AccuracyTier::High => PermissionScope::Fine,
            AccuracyTier::Balanced => PermissionScope::Coarse,
        }
    }

    /// Lowercase name used in configuration files and CLI arguments.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccuracyTier::High => "high",
            AccuracyTier::Balanced => "balanced",
        }
    }
}

impl fmt::Display for AccuracyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccuracyTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(AccuracyTier::High),
            "balanced" => Ok(AccuracyTier::Balanced),
            other => Err(format!("unknown accuracy tier '{}'", other)),
        }
    }
}

/// Runtime location permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionScope {
    /// Precise location.
    Fine,
    /// Approximate location.
    Coarse,
}

impl fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionScope::Fine => f.write_str("fine"),
            PermissionScope::Coarse => f.write_str("coarse"),
        }
    }
}

/// A request for position updates.
///
/// Built with [`UpdateRequest::new`] plus the `with_*` modifiers. Once handed
/// to the coordinator it is never mutated; a new request supersedes it.
///
/// # Example
///
/// ```
/// use geolocator::location::{AccuracyTier, UpdateRequest};
///
/// let request = UpdateRequest::new(AccuracyTier::High).with_interval_millis(2_000);
/// assert_eq!(request.interval_millis(), 2_000);
/// assert_eq!(request.fastest_interval_millis(), 5_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateRequest {
    tier: AccuracyTier,
    interval_millis: u64,
    fastest_interval_millis: u64,
    min_distance_meters: u32,
}

impl UpdateRequest {
    /// Create a request for the given tier with default cadence.
    pub fn new(tier: AccuracyTier) -> Self {
        Self {
            tier,
            interval_millis: DEFAULT_INTERVAL_MILLIS,
            fastest_interval_millis: DEFAULT_FASTEST_INTERVAL_MILLIS,
            min_distance_meters: DEFAULT_MIN_DISTANCE_METERS,
        }
    }

    /// Set the desired interval between updates.
    pub fn with_interval_millis(mut self, millis: u64) -> Self {
        self.interval_millis = millis;
        self
    }

    /// Set the fastest interval the cloud-assisted provider may deliver at.
    pub fn with_fastest_interval_millis(mut self, millis: u64) -> Self {
        self.fastest_interval_millis = millis;
        self
    }

    /// Set the minimum displacement between native provider updates.
    pub fn with_min_distance_meters(mut self, meters: u32) -> Self {
        self.min_distance_meters = meters;
        self
    }

    pub fn tier(&self) -> AccuracyTier {
        self.tier
    }

    pub fn interval_millis(&self) -> u64 {
        self.interval_millis
    }

    pub fn fastest_interval_millis(&self) -> u64 {
        self.fastest_interval_millis
    }

    /// Only honored by the native backend.
    pub fn min_distance_meters(&self) -> u32 {
        self.min_distance_meters
    }

    /// Permission scope this request needs.
    pub fn required_scope(&self) -> PermissionScope {
        self.tier.required_scope()
    }
}

/// A raw sample reported by a location service.
///
/// Services hand fixes to a [`PositionListener`](crate::backend::PositionListener);
/// only the backend turns an accepted fix into a [`Position`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// When the service measured the fix. `None` means "now".
    pub timestamp: Option<DateTime<Utc>>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Whether the coordinates are finite and inside WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A position accepted from a provider backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    latitude: f64,
    longitude: f64,
    timestamp: DateTime<Utc>,
}

impl Position {
    /// Accept a fix. Returns `None` for invalid coordinates.
    pub(crate) fn from_fix(fix: LocationFix) -> Option<Self> {
        if !fix.is_valid() {
            return None;
        }
        Some(Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            timestamp: fix.timestamp.unwrap_or_else(Utc::now),
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// A postal address returned by reverse geocoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Structured postal lines, most specific first.
    pub lines: Vec<String>,
    pub postal_code: Option<String>,
    pub locality: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// Whether at least one line, the locality or the country carries text.
    ///
    /// A postal code on its own is not enough to show the user anything useful.
    pub fn is_usable(&self) -> bool {
        self.lines.iter().any(|l| !l.trim().is_empty())
            || non_blank(&self.locality).is_some()
            || non_blank(&self.country).is_some()
    }
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
