//! Configuration management CLI commands.
//!
//! Provides `config init`, `config show` and `config path`.

use clap::Subcommand;
use geolocator::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init { force } => run_init(force),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Path => run_path(),
    }
}

fn run_init(force: bool) -> Result<(), CliError> {
    let path = config_file_path();

    if force {
        ConfigFile::default().save_to(&path)?;
        println!("Wrote default configuration to {}", path.display());
    } else if ConfigFile::ensure_exists_at(&path)? {
        println!("Created {}", path.display());
    } else {
        println!("Configuration already exists at {}", path.display());
        println!("Use --force to overwrite it with defaults.");
    }

    Ok(())
}

fn run_show() -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let path = config_file_path();

    println!("Configuration Settings");
    println!("======================");
    if !path.exists() {
        println!("(no file at {}, showing defaults)", path.display());
    }
    println!();

    let location = &config.location;
    println!("[location]");
    println!("  backend             = {}", location.backend);
    println!("  tier                = {}", location.tier);
    println!("  interval_ms         = {}", location.interval_ms);
    println!("  fastest_interval_ms = {}", location.fastest_interval_ms);
    println!("  min_distance_m      = {}", location.min_distance_m);
    println!("  fallback_to_native  = {}", location.fallback_to_native);
    println!();

    let geocoder = &config.geocoder;
    println!("[geocoder]");
    println!("  url          = {}", geocoder.url);
    println!("  timeout_secs = {}", geocoder.timeout_secs);
    println!("  user_agent   = {}", geocoder.user_agent);
    println!();

    println!("[logging]");
    println!("  directory = {}", config.logging.directory.display());
    println!("  file      = {}", config.logging.file);

    Ok(())
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}
