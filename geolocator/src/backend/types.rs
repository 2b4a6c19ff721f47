//! Backend contract shared by the native and cloud-assisted variants.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

use crate::location::{LocationFix, PermissionScope, Position, UpdateRequest};
use crate::settings::SettingsNegotiator;

/// Which backend family a coordinator is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// OS-level location manager.
    Native,
    /// Cloud-assisted fused provider.
    Cloud,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Native => "native",
            BackendKind::Cloud => "cloud",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" => Ok(BackendKind::Native),
            "cloud" => Ok(BackendKind::Cloud),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// OS provider class used by the native backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeProvider {
    Gps,
    Network,
}

impl fmt::Display for NativeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeProvider::Gps => f.write_str("gps"),
            NativeProvider::Network => f.write_str("network"),
        }
    }
}

/// Errors raised by provider backends.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The OS provider for the requested tier is switched off.
    #[error("The {0} location provider is not enabled")]
    ProviderDisabled(NativeProvider),

    /// The cloud-assisted service has not finished connecting.
    #[error("Location service is still connecting")]
    NotConnected,

    /// The cloud-assisted service refused the connection.
    #[error("Location service connection failed: {0}")]
    ConnectionFailed(String),

    /// The underlying service rejected the subscription.
    #[error("Location service rejected the request: {0}")]
    Service(String),
}

/// Identity of one backend subscription.
///
/// Signals are tagged with it so that anything arriving after
/// `unsubscribe()` can be told apart from the live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Something a subscribed backend reports.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Position(Position),
    /// The backing service went away. Terminal for the subscription.
    Lost,
}

/// A [`BackendEvent`] tagged with the subscription it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSignal {
    pub subscription: SubscriptionId,
    pub event: BackendEvent,
}

/// Callback handle a service uses to report fixes for one subscription.
///
/// Cloning is cheap. Reports go through a channel so that they land on the
/// coordinator's own task rather than the service's thread.
#[derive(Debug, Clone)]
pub struct PositionListener {
    subscription: SubscriptionId,
    tx: mpsc::UnboundedSender<BackendSignal>,
}

impl PositionListener {
    pub(crate) fn new(subscription: SubscriptionId, tx: mpsc::UnboundedSender<BackendSignal>) -> Self {
        Self { subscription, tx }
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    /// Report a fix. Invalid coordinates are dropped.
    ///
    /// Returns `false` once the receiving side is gone.
    pub fn on_fix(&self, fix: LocationFix) -> bool {
        let Some(position) = Position::from_fix(fix) else {
            warn!(
                subscription = %self.subscription,
                latitude = fix.latitude,
                longitude = fix.longitude,
                "Dropping invalid location fix"
            );
            return !self.tx.is_closed();
        };
        self.send(BackendEvent::Position(position))
    }

    /// Report that the service became unavailable.
    pub fn on_lost(&self) -> bool {
        self.send(BackendEvent::Lost)
    }

    fn send(&self, event: BackendEvent) -> bool {
        self.tx
            .send(BackendSignal {
                subscription: self.subscription,
                event,
            })
            .is_ok()
    }
}

/// A source of position updates.
///
/// One implementation per backend family; the coordinator holds exactly
/// one, chosen when it is built.
pub trait ProviderBackend: Send {
    fn kind(&self) -> BackendKind;

    /// Negotiator to run between permission grant and subscription.
    ///
    /// `None` for backends that subscribe straight after the grant.
    fn settings_negotiator(&self) -> Option<Arc<SettingsNegotiator>> {
        None
    }

    /// Whether the backend can take a request right now.
    fn ready(&self) -> Result<(), BackendError> {
        Ok(())
    }

    /// Start delivering positions for `request` under `scope`.
    ///
    /// Any previous subscription is dropped first. Signals for the new
    /// subscription are sent on `signals`.
    fn subscribe(
        &mut self,
        request: &UpdateRequest,
        scope: PermissionScope,
        signals: mpsc::UnboundedSender<BackendSignal>,
    ) -> Result<SubscriptionId, BackendError>;

    /// Stop delivering positions. No-op when not subscribed.
    fn unsubscribe(&mut self);

    /// The live subscription, if any.
    fn subscription(&self) -> Option<SubscriptionId>;

    /// Release the backend for good.
    fn close(&mut self) {
        self.unsubscribe();
    }
}
