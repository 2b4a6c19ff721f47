//! CLI runner for common setup.
//!
//! Loads the config file, initializes logging and builds the async runtime
//! so command handlers don't repeat it.

use tokio::runtime::Runtime;
use tracing::info;

use geolocator::config::ConfigFile;
use geolocator::logging::{init_logging, ConsoleOutput, LoggingGuard};

use crate::error::CliError;

/// Runner that manages CLI lifecycle.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load config and initialize logging.
    ///
    /// With `verbose`, log lines are mirrored to stdout as well as the file.
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let console = if verbose {
            ConsoleOutput::Stdout
        } else {
            ConsoleOutput::Off
        };
        let logging_guard = init_logging(
            &config.logging.directory,
            &config.logging.file,
            console,
        )
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("Geolocator v{}", geolocator::VERSION);
        info!(
            log_file = %self.logging_guard.path().display(),
            "Geolocator CLI: {} command",
            command
        );
    }

    /// Multi-threaded runtime for the command's async work.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)
    }
}
