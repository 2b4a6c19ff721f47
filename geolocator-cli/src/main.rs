//! Geolocator CLI - Command-line interface
//!
//! This binary provides a command-line interface to the geolocator library.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::common::{BackendArg, LocationOverrides, TierArg};
use commands::config::ConfigCommands;
use commands::lookup::LookupArgs;
use commands::track::{SettingsScenario, TrackArgs};

#[derive(Parser)]
#[command(name = "geolocator")]
#[command(version, about = "Device position tracking with asynchronous reverse geocoding", long_about = None)]
struct Cli {
    /// Mirror log output to stdout
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a location session on the simulated device
    Track {
        /// Location backend (default: from config)
        #[arg(long, value_enum)]
        backend: Option<BackendArg>,

        /// Accuracy tier (default: from config)
        #[arg(long, value_enum)]
        tier: Option<TierArg>,

        /// Desired update interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Fastest accepted update interval in milliseconds (cloud backend)
        #[arg(long)]
        fastest_interval_ms: Option<u64>,

        /// Minimum distance between updates in meters (native backend)
        #[arg(long)]
        min_distance_m: Option<u32>,

        /// Route as "lat,lon;lat,lon;..." (default: a walk through Porto)
        #[arg(long, allow_hyphen_values = true)]
        route: Option<String>,

        /// Pause between waypoints in milliseconds
        #[arg(long, default_value = "2000")]
        step_ms: u64,

        /// Times to walk the route, 0 to repeat until interrupted
        #[arg(long, default_value = "1")]
        laps: usize,

        /// Deny permission prompts instead of granting them
        #[arg(long)]
        deny: bool,

        /// How the simulated settings check answers (cloud backend)
        #[arg(long, value_enum, default_value = "satisfied")]
        settings: SettingsScenario,

        /// Make the cloud client fail to connect
        #[arg(long)]
        cloud_unavailable: bool,

        /// Do not fall back to the native backend when the cloud client fails
        #[arg(long)]
        no_fallback: bool,

        /// Reverse geocode over HTTP instead of the built-in place table
        #[arg(long)]
        online: bool,
    },

    /// Reverse geocode a single coordinate over HTTP
    Lookup {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Reverse geocoding endpoint (default: from config)
        #[arg(long)]
        url: Option<String>,

        /// Request timeout in seconds (default: from config)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    let result = match cli.command {
        Commands::Track {
            backend,
            tier,
            interval_ms,
            fastest_interval_ms,
            min_distance_m,
            route,
            step_ms,
            laps,
            deny,
            settings,
            cloud_unavailable,
            no_fallback,
            online,
        } => commands::track::run(TrackArgs {
            location: LocationOverrides {
                backend,
                tier,
                interval_ms,
                fastest_interval_ms,
                min_distance_m,
                no_fallback,
            },
            route,
            step_ms,
            laps: (laps > 0).then_some(laps),
            deny,
            settings,
            cloud_unavailable,
            online,
            verbose,
        }),

        Commands::Lookup {
            lat,
            lon,
            url,
            timeout,
        } => commands::lookup::run(LookupArgs {
            lat,
            lon,
            url,
            timeout,
            verbose,
        }),

        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
