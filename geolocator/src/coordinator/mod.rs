//! Location update coordination.
//!
//! The [`CoordinatorDaemon`] drives permission acquisition, settings
//! negotiation and the backend subscription for one session, and hands each
//! accepted position to the [`LocationSink`] and the reverse geocoder.
//! Callers talk to it through a [`CoordinatorHandle`].

mod daemon;
mod error;
mod handle;
mod sink;
mod state;

pub use daemon::CoordinatorDaemon;
pub use error::{CoordinatorError, ErrorKind};
pub use handle::CoordinatorHandle;
pub use sink::{ChannelSink, LocationSink, SinkEvent};
pub use state::{CoordinatorState, CoordinatorStatus};
