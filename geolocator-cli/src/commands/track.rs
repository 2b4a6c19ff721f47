//! Track command - run a location session on the simulated platform.
//!
//! The simulated device walks a route, answers permission prompts and the
//! settings resolution flow the way the flags say, and every sink callback
//! is printed as it arrives.

use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use tokio_util::sync::CancellationToken;
use tracing::info;

use geolocator::app::{CloudServices, LocationApp, PlatformServices};
use geolocator::config::ConfigFile;
use geolocator::coordinator::{ChannelSink, CoordinatorHandle, ErrorKind, SinkEvent};
use geolocator::geocoder::{GeocodingService, NominatimConfig, NominatimGeocoder};
use geolocator::location::{Address, PermissionScope};
use geolocator::settings::{ResolutionToken, SettingsStatus};
use geolocator::simulation::{
    Route, RouteFeeder, SimulatedGeocoder, SimulatedLocationService, SimulatedPermissions,
};

use super::common::{resolve_app_config, LocationOverrides};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Time allowed for address reports still in flight after the route ends.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// How the simulated settings service answers the first check.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SettingsScenario {
    /// Ambient settings already satisfy the request
    Satisfied,
    /// Resolution needed, and the user accepts it
    Accept,
    /// Resolution needed, and the user declines it
    Decline,
    /// Settings cannot be fixed on this device
    Unavailable,
}

/// Arguments for the track command.
pub struct TrackArgs {
    pub location: LocationOverrides,
    pub route: Option<String>,
    pub step_ms: u64,
    /// `None` walks the route until interrupted.
    pub laps: Option<usize>,
    pub deny: bool,
    pub settings: SettingsScenario,
    pub cloud_unavailable: bool,
    pub online: bool,
    pub verbose: bool,
}

#[derive(Debug, Default)]
struct Tally {
    positions: usize,
    addresses: usize,
    unavailable: usize,
}

/// Run the track command.
pub fn run(args: TrackArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("track");
    let config = runner.config();

    let route = match &args.route {
        Some(text) => text
            .parse::<Route>()
            .map_err(|e| CliError::Config(format!("Invalid --route: {}", e)))?,
        None => Route::porto_walk(),
    };
    let geocoding = geocoding_service(args.online, config)?;

    let runtime = runner.runtime()?;
    runtime.block_on(track(args, config, route, geocoding))
}

async fn track(
    args: TrackArgs,
    config: &ConfigFile,
    route: Route,
    geocoding: Arc<dyn GeocodingService>,
) -> Result<(), CliError> {
    let app_config = resolve_app_config(&args.location, config);

    let location = SimulatedLocationService::new();
    if args.cloud_unavailable {
        location.fail_connections("simulated outage");
    }
    match args.settings {
        SettingsScenario::Satisfied => {}
        SettingsScenario::Accept | SettingsScenario::Decline => {
            location.script_settings([SettingsStatus::ResolutionRequired(ResolutionToken::new(1))]);
        }
        SettingsScenario::Unavailable => {
            location.script_settings([SettingsStatus::Unavailable]);
        }
    }

    let (permissions, mut prompts) = SimulatedPermissions::new();
    let (sink, mut events) = ChannelSink::new();

    let services = PlatformServices {
        permissions: permissions.clone(),
        native: Some(location.clone()),
        cloud: Some(CloudServices {
            location: location.clone(),
            settings: location.clone(),
        }),
        geocoding,
        connectivity: None,
    };

    let app = LocationApp::start(app_config, services, Arc::new(sink)).await?;
    let handle = app.handle();
    let request = app.config().request;

    println!("Geolocator v{}", geolocator::VERSION);
    println!("==================");
    println!();
    println!("Backend:   {}", app.backend());
    println!("Tier:      {}", request.tier());
    println!("Interval:  {} ms", request.interval_millis());
    println!("Waypoints: {}", route.len());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    // Set up signal handler for graceful shutdown
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping...");
        signal.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    app.request_updates()?;

    let feeder = RouteFeeder::new(route)
        .with_interval(Duration::from_millis(args.step_ms))
        .with_laps(args.laps);
    let mut feeder = tokio::spawn(feeder.run(location.clone(), shutdown.child_token()));
    let mut route_done = false;
    let grace = tokio::time::sleep(Duration::from_secs(86_400));
    tokio::pin!(grace);

    let mut tally = Tally::default();
    let mut failure = None;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,

            Some(scope) = prompts.recv() => {
                answer_prompt(&handle, &permissions, scope, args.deny)?;
            }

            Some(event) = events.recv() => {
                if let Some(error) = print_event(&handle, event, args.settings, &mut tally)? {
                    failure = Some(error);
                    break;
                }
            }

            delivered = &mut feeder, if !route_done => {
                route_done = true;
                info!(delivered = ?delivered.ok(), "Route finished");
                grace.as_mut().reset(tokio::time::Instant::now() + DRAIN_GRACE);
            }

            _ = &mut grace, if route_done => break,
        }
    }

    shutdown.cancel();
    app.shutdown().await;

    println!();
    println!("Session Summary");
    println!("───────────────");
    println!("  Positions: {}", tally.positions);
    println!(
        "  Addresses: {} ({} unavailable)",
        tally.addresses, tally.unavailable
    );

    match failure {
        Some(error) => Err(CliError::Tracking(error)),
        None => Ok(()),
    }
}

fn answer_prompt(
    handle: &CoordinatorHandle,
    permissions: &SimulatedPermissions,
    scope: PermissionScope,
    deny: bool,
) -> Result<(), CliError> {
    if deny {
        println!("Permission ({}) requested: denied", scope);
    } else {
        println!("Permission ({}) requested: granted", scope);
        permissions.grant(scope);
    }
    handle.on_permission_result(scope, !deny)?;
    Ok(())
}

/// Print one sink event. Returns the error that ended the session, if any.
fn print_event(
    handle: &CoordinatorHandle,
    event: SinkEvent,
    settings: SettingsScenario,
    tally: &mut Tally,
) -> Result<Option<ErrorKind>, CliError> {
    match event {
        SinkEvent::Position(position) => {
            tally.positions += 1;
            println!(
                "{}  {}",
                position.timestamp().format("%H:%M:%S"),
                position
            );
        }
        SinkEvent::Address(report) => {
            tally.addresses += 1;
            if !report.outcome.is_found() {
                tally.unavailable += 1;
            }
            println!("          {}", report.display());
        }
        SinkEvent::ResolutionRequired(token) => {
            let accepted = settings != SettingsScenario::Decline;
            println!(
                "Location settings need changing: {}",
                if accepted { "accepted" } else { "declined" }
            );
            handle.on_settings_resolution(token, accepted)?;
        }
        SinkEvent::Error(kind) => {
            println!("Error: {}", kind);
            return Ok(Some(kind));
        }
    }
    Ok(None)
}

/// Nominatim when `online`, otherwise a table of known places along the
/// demo route.
fn geocoding_service(
    online: bool,
    config: &ConfigFile,
) -> Result<Arc<dyn GeocodingService>, CliError> {
    if online {
        let nominatim = NominatimGeocoder::new(NominatimConfig {
            url: config.geocoder.url.clone(),
            timeout: config.geocoder.timeout(),
            user_agent: config.geocoder.user_agent.clone(),
        })
        .map_err(CliError::Lookup)?;
        return Ok(Arc::new(nominatim));
    }

    let places = [
        (41.1458, -8.6109, "Praça da Liberdade"),
        (41.1466, -8.6114, "Avenida dos Aliados"),
        (41.1474, -8.6119, "Avenida dos Aliados"),
        (41.1484, -8.6110, "Rua de Sá da Bandeira"),
        (41.1496, -8.6108, "Praça do General Humberto Delgado"),
    ];
    let geocoder = places
        .into_iter()
        .fold(SimulatedGeocoder::new(), |geocoder, (lat, lon, street)| {
            geocoder.with_place(
                lat,
                lon,
                Address {
                    lines: vec![street.to_string()],
                    postal_code: Some("4000-322".to_string()),
                    locality: Some("Porto".to_string()),
                    country: Some("Portugal".to_string()),
                },
            )
        });
    Ok(Arc::new(geocoder))
}
