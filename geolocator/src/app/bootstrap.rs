//! Application bootstrap implementation.
//!
//! `LocationApp` picks the backend, connects the cloud client when needed,
//! wires the coordinator to the platform services and owns its task until
//! shutdown.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::config::AppConfig;
use super::error::AppError;
use crate::backend::{
    BackendError, BackendKind, CloudBackend, CloudLocationService, NativeBackend,
    NativeLocationService, ProviderBackend,
};
use crate::coordinator::{CoordinatorDaemon, CoordinatorError, CoordinatorHandle, LocationSink};
use crate::geocoder::{Connectivity, GeocodingService, ReverseGeocoder};
use crate::permission::{PermissionGate, PermissionPlatform};
use crate::settings::SettingsClient;

/// Cloud-assisted services. Only needed for the cloud backend.
#[derive(Clone)]
pub struct CloudServices {
    pub location: Arc<dyn CloudLocationService>,
    pub settings: Arc<dyn SettingsClient>,
}

/// Platform capabilities a session runs on.
#[derive(Clone)]
pub struct PlatformServices {
    pub permissions: Arc<dyn PermissionPlatform>,
    pub native: Option<Arc<dyn NativeLocationService>>,
    pub cloud: Option<CloudServices>,
    pub geocoding: Arc<dyn GeocodingService>,
    pub connectivity: Option<Arc<dyn Connectivity>>,
}

/// A running location session.
///
/// # Example
///
/// ```ignore
/// use geolocator::app::{AppConfig, LocationApp};
///
/// let app = LocationApp::start(config, services, sink).await?;
/// app.request_updates()?;
///
/// // Later: tear down, release the permission, disconnect
/// app.shutdown().await;
/// ```
pub struct LocationApp {
    handle: CoordinatorHandle,
    backend: BackendKind,
    config: AppConfig,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl LocationApp {
    /// Start a session. Must be called from within a Tokio runtime.
    ///
    /// For the cloud backend the client is connected first. If that fails
    /// and `fallback_to_native` is set, the session starts on the native
    /// backend instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected backend has no service, or the cloud
    /// client cannot connect and there is nothing to fall back to.
    pub async fn start(
        config: AppConfig,
        services: PlatformServices,
        sink: Arc<dyn LocationSink>,
    ) -> Result<Self, AppError> {
        info!(
            backend = %config.backend,
            tier = %config.request.tier(),
            "Starting location session"
        );

        let backend = Self::create_backend(&config, &services).await?;
        let kind = backend.kind();

        let gate = PermissionGate::new(Arc::clone(&services.permissions));
        let mut geocoder = ReverseGeocoder::new(Arc::clone(&services.geocoding));
        if let Some(probe) = &services.connectivity {
            geocoder = geocoder.with_connectivity(Arc::clone(probe));
        }

        let (daemon, handle) = CoordinatorDaemon::new(gate, backend, geocoder, sink);
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(daemon.run(shutdown.clone()));

        info!(backend = %kind, "Location session started");

        Ok(Self {
            handle,
            backend: kind,
            config,
            shutdown,
            task,
        })
    }

    async fn create_backend(
        config: &AppConfig,
        services: &PlatformServices,
    ) -> Result<Box<dyn ProviderBackend>, AppError> {
        match config.backend {
            BackendKind::Native => Self::native_backend(services),
            BackendKind::Cloud => {
                let cloud = services
                    .cloud
                    .as_ref()
                    .ok_or(AppError::MissingService(BackendKind::Cloud))?;

                match Self::connect(config, cloud.location.as_ref()).await {
                    Ok(()) => Ok(Box::new(CloudBackend::new(
                        Arc::clone(&cloud.location),
                        Arc::clone(&cloud.settings),
                    ))),
                    Err(e) if config.fallback_to_native && services.native.is_some() => {
                        warn!(error = %e, "Cloud location service unavailable, falling back to native");
                        Self::native_backend(services)
                    }
                    Err(e) => Err(AppError::CloudConnection(e)),
                }
            }
        }
    }

    fn native_backend(services: &PlatformServices) -> Result<Box<dyn ProviderBackend>, AppError> {
        let native = services
            .native
            .as_ref()
            .ok_or(AppError::MissingService(BackendKind::Native))?;
        Ok(Box::new(NativeBackend::new(Arc::clone(native))))
    }

    async fn connect(
        config: &AppConfig,
        location: &dyn CloudLocationService,
    ) -> Result<(), BackendError> {
        if location.is_connected() {
            return Ok(());
        }

        info!(timeout_secs = config.connect_timeout.as_secs(), "Connecting cloud location client");
        match tokio::time::timeout(config.connect_timeout, location.connect()).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::ConnectionFailed(format!(
                "no answer within {}s",
                config.connect_timeout.as_secs()
            ))),
        }
    }

    /// Handle for driving the coordinator.
    pub fn handle(&self) -> CoordinatorHandle {
        self.handle.clone()
    }

    /// Backend the session actually runs on, after any fallback.
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Issue the configured update request.
    pub fn request_updates(&self) -> Result<(), CoordinatorError> {
        self.handle.request_updates(self.config.request)
    }

    /// Token that stops the session when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop the session and wait for the coordinator to finish tearing down.
    pub async fn shutdown(self) {
        info!("Shutting down location session");
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Location coordinator task failed");
        }
        info!("Location session shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::{ChannelSink, CoordinatorState};
    use crate::simulation::{SimulatedGeocoder, SimulatedLocationService, SimulatedPermissions};
    use crate::location::{AccuracyTier, PermissionScope, UpdateRequest};

    fn services(location: &Arc<SimulatedLocationService>) -> PlatformServices {
        let (permissions, _prompts) = SimulatedPermissions::new();
        permissions.grant(PermissionScope::Fine);
        permissions.grant(PermissionScope::Coarse);
        PlatformServices {
            permissions,
            native: Some(location.clone()),
            cloud: Some(CloudServices {
                location: location.clone(),
                settings: location.clone(),
            }),
            geocoding: Arc::new(SimulatedGeocoder::new()),
            connectivity: None,
        }
    }

    #[tokio::test]
    async fn test_cloud_backend_connects_first() {
        let location = SimulatedLocationService::new();
        let (sink, _events) = ChannelSink::new();
        let config = AppConfig::default().with_backend(BackendKind::Cloud);

        let app = LocationApp::start(config, services(&location), Arc::new(sink))
            .await
            .unwrap();

        assert_eq!(app.backend(), BackendKind::Cloud);
        assert!(location.is_connected());
        app.shutdown().await;
        assert!(!location.is_connected());
    }

    #[tokio::test]
    async fn test_failed_connection_falls_back_to_native() {
        let location = SimulatedLocationService::new();
        location.fail_connections("play services missing");
        let (sink, _events) = ChannelSink::new();
        let config = AppConfig::default().with_backend(BackendKind::Cloud);

        let app = LocationApp::start(config, services(&location), Arc::new(sink))
            .await
            .unwrap();

        assert_eq!(app.backend(), BackendKind::Native);
        app.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_connection_without_fallback_is_error() {
        let location = SimulatedLocationService::new();
        location.fail_connections("play services missing");
        let (sink, _events) = ChannelSink::new();
        let config = AppConfig::default()
            .with_backend(BackendKind::Cloud)
            .with_fallback_to_native(false);

        let result = LocationApp::start(config, services(&location), Arc::new(sink)).await;
        assert!(matches!(result, Err(AppError::CloudConnection(_))));
    }

    #[tokio::test]
    async fn test_missing_native_service() {
        let location = SimulatedLocationService::new();
        let mut services = services(&location);
        services.native = None;
        let (sink, _events) = ChannelSink::new();

        let result = LocationApp::start(AppConfig::default(), services, Arc::new(sink)).await;
        assert!(matches!(
            result,
            Err(AppError::MissingService(BackendKind::Native))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_releases_subscription() {
        let location = SimulatedLocationService::new();
        let (sink, _events) = ChannelSink::new();
        let config =
            AppConfig::default().with_request(UpdateRequest::new(AccuracyTier::High));

        let app = LocationApp::start(config, services(&location), Arc::new(sink))
            .await
            .unwrap();
        let handle = app.handle();
        app.request_updates().unwrap();
        handle
            .wait_for_state(CoordinatorState::Subscribed)
            .await
            .unwrap();
        assert!(location.is_subscribed());

        app.shutdown().await;
        assert!(!location.is_subscribed());
        assert!(!handle.is_running());
    }
}
