//! User configuration (`~/.geolocator/config.ini`).
//!
//! Precedence is CLI flags, then the config file, then built-in defaults.

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, GeocoderSettings, LocationSettings, LoggingSettings,
    DEFAULT_GEOCODER_TIMEOUT_SECS, DEFAULT_LOG_FILE,
};
