//! Native backend over the OS location manager.
//!
//! The tier picks the OS provider (GPS for `High`, network for `Balanced`).
//! The provider must be enabled at subscribe time, otherwise the subscribe
//! fails synchronously with [`BackendError::ProviderDisabled`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::info;

use super::types::{
    BackendError, BackendKind, BackendSignal, NativeProvider, PositionListener, ProviderBackend,
    SubscriptionId,
};
use crate::location::{AccuracyTier, PermissionScope, UpdateRequest};

/// Cadence hints passed to the OS provider. Best-effort, not guarantees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeCriteria {
    pub min_time: Duration,
    pub min_distance_meters: u32,
}

/// OS location manager capability.
pub trait NativeLocationService: Send + Sync {
    /// Whether the given OS provider is switched on.
    fn is_provider_enabled(&self, provider: NativeProvider) -> bool;

    /// Start reporting fixes from `provider` to `listener`.
    ///
    /// Replaces any listener registered earlier.
    fn request_updates(
        &self,
        provider: NativeProvider,
        criteria: NativeCriteria,
        listener: PositionListener,
    ) -> Result<(), BackendError>;

    /// Stop reporting fixes.
    fn remove_updates(&self);
}

/// OS provider class serving a tier.
pub fn provider_for(tier: AccuracyTier) -> NativeProvider {
    match tier {
        AccuracyTier::High => NativeProvider::Gps,
        AccuracyTier::Balanced => NativeProvider::Network,
    }
}

/// Backend bound to the OS location manager.
pub struct NativeBackend {
    service: Arc<dyn NativeLocationService>,
    next_subscription: u64,
    active: Option<SubscriptionId>,
}

impl NativeBackend {
    pub fn new(service: Arc<dyn NativeLocationService>) -> Self {
        Self {
            service,
            next_subscription: 1,
            active: None,
        }
    }
}

impl ProviderBackend for NativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn subscribe(
        &mut self,
        request: &UpdateRequest,
        scope: PermissionScope,
        signals: mpsc::UnboundedSender<BackendSignal>,
    ) -> Result<SubscriptionId, BackendError> {
        self.unsubscribe();

        let provider = provider_for(request.tier());
        if !self.service.is_provider_enabled(provider) {
            return Err(BackendError::ProviderDisabled(provider));
        }

        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;

        let criteria = NativeCriteria {
            min_time: Duration::from_millis(request.interval_millis()),
            min_distance_meters: request.min_distance_meters(),
        };
        self.service
            .request_updates(provider, criteria, PositionListener::new(id, signals))?;
        self.active = Some(id);

        info!(
            subscription = %id,
            %provider,
            %scope,
            min_time_ms = request.interval_millis(),
            min_distance_m = request.min_distance_meters(),
            "Native location updates requested"
        );
        Ok(id)
    }

    fn unsubscribe(&mut self) {
        if let Some(id) = self.active.take() {
            self.service.remove_updates();
            info!(subscription = %id, "Native location updates removed");
        }
    }

    fn subscription(&self) -> Option<SubscriptionId> {
        self.active
    }
}
