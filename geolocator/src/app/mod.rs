//! Application bootstrap and session lifecycle.
//!
//! [`LocationApp`] is the one place where a session is assembled:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        LocationApp                            │
//! │                                                               │
//! │  1. Backend selection ──► cloud: connect client               │
//! │                           └── failed? fall back to native     │
//! │  2. PermissionGate + ReverseGeocoder (+ connectivity probe)   │
//! │  3. CoordinatorDaemon spawned ──► CoordinatorHandle           │
//! │                                                               │
//! │  shutdown(): teardown, release permission, disconnect client  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::{CloudServices, LocationApp, PlatformServices};
pub use config::{AppConfig, DEFAULT_CONNECT_TIMEOUT};
pub use error::AppError;
