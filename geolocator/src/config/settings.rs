//! Settings structs, one per `[section]` of config.ini, and their defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::backend::BackendKind;
use crate::geocoder::{DEFAULT_NOMINATIM_URL, DEFAULT_USER_AGENT};
use crate::location::{
    AccuracyTier, UpdateRequest, DEFAULT_FASTEST_INTERVAL_MILLIS, DEFAULT_INTERVAL_MILLIS,
    DEFAULT_MIN_DISTANCE_METERS,
};

/// Default geocoder HTTP timeout (seconds).
pub const DEFAULT_GEOCODER_TIMEOUT_SECS: u64 = 10;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "geolocator.log";

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub location: LocationSettings,
    pub geocoder: GeocoderSettings,
    pub logging: LoggingSettings,
}

/// `[location]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSettings {
    pub backend: BackendKind,
    pub tier: AccuracyTier,
    pub interval_ms: u64,
    pub fastest_interval_ms: u64,
    pub min_distance_m: u32,
    /// Start on the native backend when the cloud client cannot connect.
    pub fallback_to_native: bool,
}

impl LocationSettings {
    /// Update request described by these settings.
    pub fn update_request(&self) -> UpdateRequest {
        UpdateRequest::new(self.tier)
            .with_interval_millis(self.interval_ms)
            .with_fastest_interval_millis(self.fastest_interval_ms)
            .with_min_distance_meters(self.min_distance_m)
    }
}

/// `[geocoder]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocoderSettings {
    pub url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl GeocoderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl LoggingSettings {
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file)
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            location: LocationSettings {
                backend: BackendKind::Native,
                tier: AccuracyTier::Balanced,
                interval_ms: DEFAULT_INTERVAL_MILLIS,
                fastest_interval_ms: DEFAULT_FASTEST_INTERVAL_MILLIS,
                min_distance_m: DEFAULT_MIN_DISTANCE_METERS,
                fallback_to_native: true,
            },
            geocoder: GeocoderSettings {
                url: DEFAULT_NOMINATIM_URL.to_string(),
                timeout_secs: DEFAULT_GEOCODER_TIMEOUT_SECS,
                user_agent: DEFAULT_USER_AGENT.to_string(),
            },
            logging: LoggingSettings {
                directory: super::file::config_directory(),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
