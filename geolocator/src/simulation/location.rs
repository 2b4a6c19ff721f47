//! Simulated location services.
//!
//! One [`SimulatedLocationService`] plays the OS location manager, the fused
//! provider client and the settings client at once, so a test can drive a
//! session without caring which backend is in use.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::debug;

use crate::backend::{
    BackendError, CloudLocationService, CloudRequest, NativeCriteria, NativeLocationService,
    NativeProvider, PositionListener,
};
use crate::location::{LocationFix, UpdateRequest};
use crate::settings::{SettingsClient, SettingsClientError, SettingsStatus};

/// A request the service received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedRequest {
    Native {
        provider: NativeProvider,
        criteria: NativeCriteria,
    },
    Cloud(CloudRequest),
}

struct State {
    enabled: HashSet<NativeProvider>,
    connected: bool,
    connect_failure: Option<String>,
    listener: Option<PositionListener>,
    requests: Vec<RecordedRequest>,
    removals: usize,
    settings_script: VecDeque<Result<SettingsStatus, SettingsClientError>>,
    settings_checks: usize,
}

/// In-memory location service.
pub struct SimulatedLocationService {
    state: Mutex<State>,
}

impl SimulatedLocationService {
    /// Both providers enabled, cloud client not yet connected.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                enabled: [NativeProvider::Gps, NativeProvider::Network]
                    .into_iter()
                    .collect(),
                connected: false,
                connect_failure: None,
                listener: None,
                requests: Vec::new(),
                removals: 0,
                settings_script: VecDeque::new(),
                settings_checks: 0,
            }),
        })
    }

    pub fn set_provider_enabled(&self, provider: NativeProvider, enabled: bool) {
        let mut state = self.state.lock();
        if enabled {
            state.enabled.insert(provider);
        } else {
            state.enabled.remove(&provider);
        }
    }

    /// Make the next `connect()` calls fail with `reason`.
    pub fn fail_connections(&self, reason: impl Into<String>) {
        self.state.lock().connect_failure = Some(reason.into());
    }

    /// Queue replies for upcoming settings checks. Once the script runs out
    /// every check is satisfied.
    pub fn script_settings(&self, replies: impl IntoIterator<Item = SettingsStatus>) {
        self.state
            .lock()
            .settings_script
            .extend(replies.into_iter().map(Ok));
    }

    /// Queue a settings check failure.
    pub fn script_settings_error(&self, error: SettingsClientError) {
        self.state.lock().settings_script.push_back(Err(error));
    }

    /// Report a fix to the current listener.
    ///
    /// Returns `false` when nobody is subscribed or the listener is closed.
    pub fn emit(&self, fix: LocationFix) -> bool {
        let listener = self.state.lock().listener.clone();
        match listener {
            Some(listener) => listener.on_fix(fix),
            None => {
                debug!(
                    latitude = fix.latitude,
                    longitude = fix.longitude,
                    "No listener registered, fix not delivered"
                );
                false
            }
        }
    }

    /// Make the service disappear from under the current listener.
    pub fn lose(&self) -> bool {
        let listener = self.state.lock().listener.clone();
        listener.map(|l| l.on_lost()).unwrap_or(false)
    }

    pub fn listener(&self) -> Option<PositionListener> {
        self.state.lock().listener.clone()
    }

    pub fn is_subscribed(&self) -> bool {
        self.state.lock().listener.is_some()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    pub fn removals(&self) -> usize {
        self.state.lock().removals
    }

    pub fn settings_checks(&self) -> usize {
        self.state.lock().settings_checks
    }

    fn register(&self, request: RecordedRequest, listener: PositionListener) {
        let mut state = self.state.lock();
        state.requests.push(request);
        state.listener = Some(listener);
    }

    fn remove(&self) {
        let mut state = self.state.lock();
        state.removals += 1;
        state.listener = None;
    }
}

impl NativeLocationService for SimulatedLocationService {
    fn is_provider_enabled(&self, provider: NativeProvider) -> bool {
        self.state.lock().enabled.contains(&provider)
    }

    fn request_updates(
        &self,
        provider: NativeProvider,
        criteria: NativeCriteria,
        listener: PositionListener,
    ) -> Result<(), BackendError> {
        self.register(RecordedRequest::Native { provider, criteria }, listener);
        Ok(())
    }

    fn remove_updates(&self) {
        self.remove();
    }
}

impl CloudLocationService for SimulatedLocationService {
    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn connect(&self) -> BoxFuture<'_, Result<(), BackendError>> {
        let result = {
            let mut state = self.state.lock();
            match &state.connect_failure {
                Some(reason) => Err(BackendError::ConnectionFailed(reason.clone())),
                None => {
                    state.connected = true;
                    Ok(())
                }
            }
        };
        async move { result }.boxed()
    }

    fn disconnect(&self) {
        self.state.lock().connected = false;
    }

    fn request_updates(
        &self,
        request: CloudRequest,
        listener: PositionListener,
    ) -> Result<(), BackendError> {
        self.register(RecordedRequest::Cloud(request), listener);
        Ok(())
    }

    fn remove_updates(&self) {
        self.remove();
    }
}

impl SettingsClient for SimulatedLocationService {
    fn check_settings(
        &self,
        _request: &UpdateRequest,
    ) -> BoxFuture<'_, Result<SettingsStatus, SettingsClientError>> {
        let reply = {
            let mut state = self.state.lock();
            state.settings_checks += 1;
            state
                .settings_script
                .pop_front()
                .unwrap_or(Ok(SettingsStatus::Satisfied))
        };
        async move { reply }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ResolutionToken;

    #[tokio::test]
    async fn test_connect_and_failure() {
        let service = SimulatedLocationService::new();
        assert!(!service.is_connected());
        service.connect().await.unwrap();
        assert!(service.is_connected());

        let failing = SimulatedLocationService::new();
        failing.fail_connections("api unavailable");
        assert_eq!(
            failing.connect().await,
            Err(BackendError::ConnectionFailed("api unavailable".into()))
        );
        assert!(!failing.is_connected());
    }

    #[tokio::test]
    async fn test_settings_script_then_satisfied() {
        let service = SimulatedLocationService::new();
        let token = ResolutionToken::new(1);
        service.script_settings([SettingsStatus::ResolutionRequired(token)]);
        let request = UpdateRequest::new(crate::location::AccuracyTier::Balanced);

        assert_eq!(
            service.check_settings(&request).await,
            Ok(SettingsStatus::ResolutionRequired(token))
        );
        assert_eq!(
            service.check_settings(&request).await,
            Ok(SettingsStatus::Satisfied)
        );
        assert_eq!(service.settings_checks(), 2);
    }

    #[test]
    fn test_emit_without_listener() {
        let service = SimulatedLocationService::new();
        assert!(!service.emit(LocationFix::new(41.1, -8.6)));
        assert!(!service.lose());
    }
}
