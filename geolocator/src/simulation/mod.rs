//! In-process stand-ins for every platform capability.
//!
//! Used by the CLI's `track` command and by tests to run complete sessions
//! without a device: permission prompts, both location backends, settings
//! checks, reverse geocoding and connectivity.

mod geocoder;
mod location;
mod permissions;
mod route;

pub use geocoder::{SimulatedConnectivity, SimulatedGeocoder};
pub use location::{RecordedRequest, SimulatedLocationService};
pub use permissions::{PermissionCall, SimulatedPermissions};
pub use route::{Route, RouteFeeder, RouteParseError, DEFAULT_WAYPOINT_INTERVAL};
