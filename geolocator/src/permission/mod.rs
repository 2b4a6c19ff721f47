//! Runtime location permissions.
//!
//! The platform's "request permissions, get a callback later" pattern is
//! re-shaped into [`PermissionGate::ensure`], which either grants immediately
//! or hands back a [`PendingPermission`] future resolved by
//! [`PermissionGate::resolve`].

mod gate;

pub use gate::{
    PendingPermission, PermissionDecision, PermissionGate, PermissionOutcome, PermissionPlatform,
};
