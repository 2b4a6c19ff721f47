//! Cloud-assisted backend over a fused location service.
//!
//! The service client has to be connected before anything is requested from
//! it. The coordinator runs the backend's [`SettingsNegotiator`] after the
//! permission grant and only subscribes once it reports `Satisfied`.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tracing::info;

use super::types::{
    BackendError, BackendKind, BackendSignal, PositionListener, ProviderBackend, SubscriptionId,
};
use crate::location::{AccuracyTier, PermissionScope, UpdateRequest};
use crate::settings::{SettingsClient, SettingsNegotiator};

/// Power/accuracy priority understood by the fused provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudPriority {
    HighAccuracy,
    BalancedPowerAccuracy,
}

impl From<AccuracyTier> for CloudPriority {
    fn from(tier: AccuracyTier) -> Self {
        match tier {
            AccuracyTier::High => CloudPriority::HighAccuracy,
            AccuracyTier::Balanced => CloudPriority::BalancedPowerAccuracy,
        }
    }
}

impl fmt::Display for CloudPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudPriority::HighAccuracy => f.write_str("high_accuracy"),
            CloudPriority::BalancedPowerAccuracy => f.write_str("balanced_power_accuracy"),
        }
    }
}

/// Request as handed to the fused provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloudRequest {
    pub priority: CloudPriority,
    pub interval_millis: u64,
    pub fastest_interval_millis: u64,
}

impl From<&UpdateRequest> for CloudRequest {
    fn from(request: &UpdateRequest) -> Self {
        Self {
            priority: request.tier().into(),
            interval_millis: request.interval_millis(),
            fastest_interval_millis: request.fastest_interval_millis(),
        }
    }
}

/// Fused location service client.
pub trait CloudLocationService: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Connect the client. Resolves once the service is usable or has
    /// refused the connection.
    fn connect(&self) -> BoxFuture<'_, Result<(), BackendError>>;

    fn disconnect(&self);

    /// Start reporting fixes to `listener`, replacing any earlier listener.
    fn request_updates(
        &self,
        request: CloudRequest,
        listener: PositionListener,
    ) -> Result<(), BackendError>;

    fn remove_updates(&self);
}

/// Backend bound to the cloud-assisted fused provider.
pub struct CloudBackend {
    service: Arc<dyn CloudLocationService>,
    negotiator: Arc<SettingsNegotiator>,
    next_subscription: u64,
    active: Option<SubscriptionId>,
}

impl CloudBackend {
    pub fn new(service: Arc<dyn CloudLocationService>, settings: Arc<dyn SettingsClient>) -> Self {
        Self {
            service,
            negotiator: Arc::new(SettingsNegotiator::new(settings)),
            next_subscription: 1,
            active: None,
        }
    }
}

impl ProviderBackend for CloudBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cloud
    }

    fn settings_negotiator(&self) -> Option<Arc<SettingsNegotiator>> {
        Some(Arc::clone(&self.negotiator))
    }

    fn ready(&self) -> Result<(), BackendError> {
        if self.service.is_connected() {
            Ok(())
        } else {
            Err(BackendError::NotConnected)
        }
    }

    fn subscribe(
        &mut self,
        request: &UpdateRequest,
        scope: PermissionScope,
        signals: mpsc::UnboundedSender<BackendSignal>,
    ) -> Result<SubscriptionId, BackendError> {
        self.unsubscribe();
        self.ready()?;

        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;

        let cloud_request = CloudRequest::from(request);
        self.service
            .request_updates(cloud_request, PositionListener::new(id, signals))?;
        self.active = Some(id);

        info!(
            subscription = %id,
            priority = %cloud_request.priority,
            %scope,
            interval_ms = cloud_request.interval_millis,
            fastest_interval_ms = cloud_request.fastest_interval_millis,
            "Fused location updates requested"
        );
        Ok(id)
    }

    fn unsubscribe(&mut self) {
        if let Some(id) = self.active.take() {
            self.service.remove_updates();
            info!(subscription = %id, "Fused location updates removed");
        }
    }

    fn subscription(&self) -> Option<SubscriptionId> {
        self.active
    }

    fn close(&mut self) {
        self.unsubscribe();
        self.negotiator.invalidate();
        if self.service.is_connected() {
            self.service.disconnect();
            info!("Fused location client disconnected");
        }
    }
}
