//! Lookup command - reverse geocode a single coordinate over HTTP.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use geolocator::geocoder::{
    format_address, GeocodeOutcome, NominatimConfig, NominatimGeocoder, ReverseGeocoder,
    ADDRESS_UNAVAILABLE,
};
use geolocator::location::LocationFix;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the lookup command.
pub struct LookupArgs {
    pub lat: f64,
    pub lon: f64,
    pub url: Option<String>,
    pub timeout: Option<u64>,
    pub verbose: bool,
}

/// Run the lookup command.
pub fn run(args: LookupArgs) -> Result<(), CliError> {
    if !LocationFix::new(args.lat, args.lon).is_valid() {
        return Err(CliError::Config(format!(
            "Coordinates {}, {} are out of range",
            args.lat, args.lon
        )));
    }

    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("lookup");
    let geocoder = &runner.config().geocoder;

    // CLI > config
    let config = NominatimConfig {
        url: args.url.unwrap_or_else(|| geocoder.url.clone()),
        timeout: args
            .timeout
            .map(Duration::from_secs)
            .unwrap_or_else(|| geocoder.timeout()),
        user_agent: geocoder.user_agent.clone(),
    };
    info!(url = %config.url, "Reverse geocoding {}, {}", args.lat, args.lon);

    let service = NominatimGeocoder::new(config).map_err(CliError::Lookup)?;
    let worker = ReverseGeocoder::new(Arc::new(service));

    let runtime = runner.runtime()?;
    let outcome = runtime.block_on(worker.lookup(args.lat, args.lon));

    match outcome {
        GeocodeOutcome::Found(address) => {
            println!("{}", format_address(&address));
            Ok(())
        }
        GeocodeOutcome::NotFound => {
            println!("{}", ADDRESS_UNAVAILABLE);
            Ok(())
        }
        GeocodeOutcome::LookupFailed(e) => Err(CliError::Lookup(e)),
    }
}
