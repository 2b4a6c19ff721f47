//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [location] section
    if let Some(section) = ini.section(Some("location")) {
        if let Some(v) = section.get("backend") {
            config.location.backend =
                parse_value("location", "backend", v, "must be 'native' or 'cloud'")?;
        }
        if let Some(v) = section.get("tier") {
            config.location.tier =
                parse_value("location", "tier", v, "must be 'high' or 'balanced'")?;
        }
        if let Some(v) = section.get("interval_ms") {
            config.location.interval_ms = parse_value(
                "location",
                "interval_ms",
                v,
                "must be a positive integer (milliseconds)",
            )?;
        }
        if let Some(v) = section.get("fastest_interval_ms") {
            config.location.fastest_interval_ms = parse_value(
                "location",
                "fastest_interval_ms",
                v,
                "must be a positive integer (milliseconds)",
            )?;
        }
        if let Some(v) = section.get("min_distance_m") {
            config.location.min_distance_m = parse_value(
                "location",
                "min_distance_m",
                v,
                "must be a non-negative integer (meters)",
            )?;
        }
        if let Some(v) = section.get("fallback_to_native") {
            config.location.fallback_to_native = parse_bool(v);
        }
    }

    if config.location.fastest_interval_ms > config.location.interval_ms {
        return Err(ConfigFileError::InvalidValue {
            section: "location".to_string(),
            key: "fastest_interval_ms".to_string(),
            value: config.location.fastest_interval_ms.to_string(),
            reason: format!(
                "must not exceed interval_ms ({})",
                config.location.interval_ms
            ),
        });
    }

    // [geocoder] section
    if let Some(section) = ini.section(Some("geocoder")) {
        if let Some(v) = section.get("url") {
            let v = v.trim();
            if !v.starts_with("http://") && !v.starts_with("https://") {
                return Err(ConfigFileError::InvalidValue {
                    section: "geocoder".to_string(),
                    key: "url".to_string(),
                    value: v.to_string(),
                    reason: "must be an http:// or https:// URL".to_string(),
                });
            }
            config.geocoder.url = v.to_string();
        }
        if let Some(v) = section.get("timeout_secs") {
            config.geocoder.timeout_secs = parse_value(
                "geocoder",
                "timeout_secs",
                v,
                "must be a positive integer (seconds)",
            )?;
            if config.geocoder.timeout_secs == 0 {
                return Err(ConfigFileError::InvalidValue {
                    section: "geocoder".to_string(),
                    key: "timeout_secs".to_string(),
                    value: v.to_string(),
                    reason: "must be a positive integer (seconds)".to_string(),
                });
            }
        }
        if let Some(v) = section.get("user_agent") {
            let v = v.trim();
            if !v.is_empty() {
                config.geocoder.user_agent = v.to_string();
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        })
}

pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
