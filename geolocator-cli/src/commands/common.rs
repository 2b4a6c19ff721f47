//! Common types and utilities shared across CLI commands.

use clap::ValueEnum;
use geolocator::app::AppConfig;
use geolocator::backend::BackendKind;
use geolocator::config::ConfigFile;
use geolocator::location::AccuracyTier;

/// Location backend selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum BackendArg {
    /// OS location manager (GPS or network provider)
    Native,
    /// Cloud-assisted fused provider with settings negotiation
    Cloud,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Native => BackendKind::Native,
            BackendArg::Cloud => BackendKind::Cloud,
        }
    }
}

/// Accuracy tier selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TierArg {
    /// GPS-class precision (fine permission)
    High,
    /// Network-class precision (coarse permission)
    Balanced,
}

impl From<TierArg> for AccuracyTier {
    fn from(arg: TierArg) -> Self {
        match arg {
            TierArg::High => AccuracyTier::High,
            TierArg::Balanced => AccuracyTier::Balanced,
        }
    }
}

/// Location overrides given on the command line.
#[derive(Debug, Clone, Default)]
pub struct LocationOverrides {
    pub backend: Option<BackendArg>,
    pub tier: Option<TierArg>,
    pub interval_ms: Option<u64>,
    pub fastest_interval_ms: Option<u64>,
    pub min_distance_m: Option<u32>,
    pub no_fallback: bool,
}

/// Resolve session settings: CLI takes precedence, then config.
pub fn resolve_app_config(overrides: &LocationOverrides, config: &ConfigFile) -> AppConfig {
    let mut location = config.location.clone();

    if let Some(backend) = overrides.backend {
        location.backend = backend.into();
    }
    if let Some(tier) = overrides.tier {
        location.tier = tier.into();
    }
    if let Some(interval) = overrides.interval_ms {
        location.interval_ms = interval;
        // Keep the fastest interval from exceeding the interval.
        location.fastest_interval_ms = location.fastest_interval_ms.min(interval);
    }
    if let Some(fastest) = overrides.fastest_interval_ms {
        location.fastest_interval_ms = fastest;
    }
    if let Some(distance) = overrides.min_distance_m {
        location.min_distance_m = distance;
    }
    if overrides.no_fallback {
        location.fallback_to_native = false;
    }

    AppConfig::default()
        .with_backend(location.backend)
        .with_request(location.update_request())
        .with_fallback_to_native(location.fallback_to_native)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_used_without_overrides() {
        let mut config = ConfigFile::default();
        config.location.backend = BackendKind::Cloud;
        config.location.tier = AccuracyTier::High;

        let app = resolve_app_config(&LocationOverrides::default(), &config);

        assert_eq!(app.backend, BackendKind::Cloud);
        assert_eq!(app.request.tier(), AccuracyTier::High);
        assert!(app.fallback_to_native);
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = ConfigFile::default();
        let overrides = LocationOverrides {
            backend: Some(BackendArg::Cloud),
            tier: Some(TierArg::High),
            interval_ms: Some(2_000),
            no_fallback: true,
            ..Default::default()
        };

        let app = resolve_app_config(&overrides, &config);

        assert_eq!(app.backend, BackendKind::Cloud);
        assert_eq!(app.request.tier(), AccuracyTier::High);
        assert_eq!(app.request.interval_millis(), 2_000);
        assert_eq!(app.request.fastest_interval_millis(), 2_000);
        assert!(!app.fallback_to_native);
    }
}
