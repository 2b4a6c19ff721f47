//! Geolocator - device position tracking with asynchronous reverse geocoding
//!
//! This library drives a location session end to end: it gates updates on
//! runtime permission, negotiates device location settings, subscribes to
//! a native or cloud-assisted provider, and resolves each fix to a
//! human-readable address without blocking the position stream.
//!
//! The [`coordinator`] owns the session state machine; [`app`] assembles a
//! session from platform services, and [`simulation`] provides in-process
//! stand-ins for all of them.

pub mod app;
pub mod backend;
pub mod config;
pub mod coordinator;
pub mod geocoder;
pub mod location;
pub mod logging;
pub mod permission;
pub mod settings;
pub mod simulation;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
