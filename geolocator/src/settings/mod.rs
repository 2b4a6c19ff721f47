//! Provider settings negotiation (cloud-assisted backend only).
//!
//! Before the cloud-assisted provider is subscribed, ambient device settings
//! (location services on, required accuracy available) are checked. The
//! answer is one of:
//!
//! - `Satisfied` - subscribe right away
//! - `Resolvable(token)` - the user can fix it through a resolution flow; the
//!   coordinator signals the token and re-checks once the user accepts
//! - `Unresolvable` - report failure, no automatic retry

mod negotiator;
mod types;

pub use negotiator::SettingsNegotiator;
pub use types::{
    NegotiationId, ResolutionToken, SettingsClient, SettingsClientError, SettingsOutcome,
    SettingsStatus,
};
