//! Provider backends.
//!
//! Two interchangeable sources of position updates behind one
//! [`ProviderBackend`] contract:
//!
//! - [`NativeBackend`] - OS location manager; fails fast when the provider
//!   for the tier is switched off
//! - [`CloudBackend`] - fused provider; needs a connected client and a
//!   settings negotiation before it subscribes
//!
//! A backend never pushes positions into the coordinator directly. Services
//! report through a [`PositionListener`], which tags every signal with the
//! subscription it belongs to and forwards it over a channel.

mod cloud;
mod native;
mod types;

pub use cloud::{CloudBackend, CloudLocationService, CloudPriority, CloudRequest};
pub use native::{provider_for, NativeBackend, NativeCriteria, NativeLocationService};
pub use types::{
    BackendError, BackendEvent, BackendKind, BackendSignal, NativeProvider, PositionListener,
    ProviderBackend, SubscriptionId,
};
