//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! Produces the commented INI written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let fallback_to_native = if config.location.fallback_to_native {
        "true"
    } else {
        "false"
    };

    format!(
        r#"[location]
; Location backend:
;   native - OS location manager (GPS or network provider)
;   cloud  - cloud-assisted fused provider (needs a connected client)
backend = {}
; Accuracy tier:
;   high     - GPS-class precision, needs fine location permission
;   balanced - network-class precision, needs coarse location permission
tier = {}
; Desired interval between updates in milliseconds (default: 10000)
interval_ms = {}
; Fastest interval the cloud backend may deliver at in milliseconds (default: 5000)
fastest_interval_ms = {}
; Minimum displacement between native updates in meters (default: 10)
min_distance_m = {}
; Start on the native backend when the cloud client cannot connect (default: true)
fallback_to_native = {}

[geocoder]
; Nominatim-compatible reverse geocoding endpoint
url = {}
; Timeout in seconds for one lookup (default: 10)
timeout_secs = {}
; User agent sent with every lookup
user_agent = {}

[logging]
; Directory for the log file
directory = {}
; Log file name, truncated at the start of every session
file = {}
"#,
        config.location.backend,
        config.location.tier,
        config.location.interval_ms,
        config.location.fastest_interval_ms,
        config.location.min_distance_m,
        fallback_to_native,
        config.geocoder.url,
        config.geocoder.timeout_secs,
        config.geocoder.user_agent,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
