//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use geolocator::app::AppError;
use geolocator::backend::BackendKind;
use geolocator::config::ConfigFileError;
use geolocator::coordinator::{CoordinatorError, ErrorKind};
use geolocator::geocoder::GeocodeError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to build the async runtime
    Runtime(std::io::Error),
    /// Failed to start the location session
    Session(AppError),
    /// The coordinator stopped accepting commands
    Coordinator(CoordinatorError),
    /// The session ended with a terminal failure
    Tracking(ErrorKind),
    /// Reverse geocoding failed
    Lookup(GeocodeError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Session(AppError::CloudConnection(_)) => {
                eprintln!();
                eprintln!("The cloud location service could not be reached. Either:");
                eprintln!("  1. Run with --backend native");
                eprintln!("  2. Set fallback_to_native = true in the [location] section");
            }
            CliError::Session(AppError::MissingService(BackendKind::Cloud)) => {
                eprintln!();
                eprintln!("No cloud location service is available on this platform.");
            }
            CliError::Lookup(GeocodeError::Http(_)) | CliError::Lookup(GeocodeError::Offline) => {
                eprintln!();
                eprintln!("Check your network connection and the [geocoder] url setting.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Session(e) => write!(f, "{}", e),
            CliError::Coordinator(e) => write!(f, "{}", e),
            CliError::Tracking(kind) => write!(f, "{}", kind),
            CliError::Lookup(e) => write!(f, "Address lookup failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Runtime(e) => Some(e),
            CliError::Session(e) => Some(e),
            CliError::Coordinator(e) => Some(e),
            CliError::Tracking(e) => Some(e),
            CliError::Lookup(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::Session(e)
    }
}

impl From<CoordinatorError> for CliError {
    fn from(e: CoordinatorError) -> Self {
        CliError::Coordinator(e)
    }
}
