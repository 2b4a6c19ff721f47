//! Location data model.
//!
//! - [`AccuracyTier`] selects the provider class and drives the
//!   [`PermissionScope`] a request needs
//! - [`UpdateRequest`] carries the cadence hints handed to a backend
//! - [`LocationFix`] is what a service reports; [`Position`] is what a backend
//!   accepted and the coordinator republishes
//! - [`Address`] is a reverse-geocoding result

mod types;

pub use types::{
    AccuracyTier, Address, LocationFix, PermissionScope, Position, UpdateRequest,
    DEFAULT_FASTEST_INTERVAL_MILLIS, DEFAULT_INTERVAL_MILLIS, DEFAULT_MIN_DISTANCE_METERS,
};

pub(crate) use types::non_blank;
