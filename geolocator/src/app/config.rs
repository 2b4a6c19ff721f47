//! Application configuration for `LocationApp`.

use std::time::Duration;

use crate::backend::BackendKind;
use crate::config::ConfigFile;
use crate::location::{AccuracyTier, UpdateRequest};

/// How long to wait for the cloud client to connect.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to start a session.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// Backend to bind the coordinator to.
    pub backend: BackendKind,

    /// Request issued by [`LocationApp::request_updates`](super::LocationApp::request_updates).
    pub request: UpdateRequest,

    /// Use the native backend when the cloud client cannot connect.
    pub fallback_to_native: bool,

    pub connect_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Native,
            request: UpdateRequest::new(AccuracyTier::Balanced),
            fallback_to_native: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl AppConfig {
    /// Build from the `[location]` section of the config file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            backend: config.location.backend,
            request: config.location.update_request(),
            fallback_to_native: config.location.fallback_to_native,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_request(mut self, request: UpdateRequest) -> Self {
        self.request = request;
        self
    }

    pub fn with_fallback_to_native(mut self, fallback: bool) -> Self {
        self.fallback_to_native = fallback;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_file() {
        let mut file = ConfigFile::default();
        file.location.backend = BackendKind::Cloud;
        file.location.tier = AccuracyTier::High;
        file.location.interval_ms = 3_000;
        file.location.fallback_to_native = false;

        let config = AppConfig::from_config_file(&file);

        assert_eq!(config.backend, BackendKind::Cloud);
        assert_eq!(config.request.tier(), AccuracyTier::High);
        assert_eq!(config.request.interval_millis(), 3_000);
        assert!(!config.fallback_to_native);
    }

    #[test]
    fn test_builders() {
        let config = AppConfig::default()
            .with_backend(BackendKind::Cloud)
            .with_fallback_to_native(false)
            .with_connect_timeout(Duration::from_secs(1));

        assert_eq!(config.backend, BackendKind::Cloud);
        assert!(!config.fallback_to_native);
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
    }
}
