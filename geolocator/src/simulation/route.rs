//! Scripted movement for the simulated location service.
//!
//! A [`Route`] is a list of waypoints; a [`RouteFeeder`] walks it at a fixed
//! cadence and reports each waypoint as a fix.
//!
//! Routes are written as `lat,lon` pairs separated by `;`:
//!
//! ```
//! use geolocator::simulation::Route;
//!
//! let route: Route = "41.1,-8.6; 41.15,-8.61".parse().unwrap();
//! assert_eq!(route.len(), 2);
//! ```

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::location::SimulatedLocationService;
use crate::location::LocationFix;

/// Default pause between waypoints.
pub const DEFAULT_WAYPOINT_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteParseError {
    #[error("Route has no waypoints")]
    Empty,

    #[error("Waypoint '{0}' is not a 'lat,lon' pair")]
    Malformed(String),

    #[error("Waypoint '{0}' is outside valid coordinates")]
    OutOfRange(String),
}

/// Ordered waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    waypoints: Vec<LocationFix>,
}

impl Route {
    pub fn new(waypoints: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self {
            waypoints: waypoints
                .into_iter()
                .map(|(lat, lon)| LocationFix::new(lat, lon))
                .collect(),
        }
    }

    /// A short walk through central Porto.
    pub fn porto_walk() -> Self {
        Self::new([
            (41.1458, -8.6109),
            (41.1466, -8.6114),
            (41.1474, -8.6119),
            (41.1484, -8.6110),
            (41.1496, -8.6108),
        ])
    }

    pub fn waypoints(&self) -> &[LocationFix] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

impl FromStr for Route {
    type Err = RouteParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut waypoints = Vec::new();
        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (lat, lon) = part
                .split_once(',')
                .ok_or_else(|| RouteParseError::Malformed(part.to_string()))?;
            let lat: f64 = lat
                .trim()
                .parse()
                .map_err(|_| RouteParseError::Malformed(part.to_string()))?;
            let lon: f64 = lon
                .trim()
                .parse()
                .map_err(|_| RouteParseError::Malformed(part.to_string()))?;

            let fix = LocationFix::new(lat, lon);
            if !fix.is_valid() {
                return Err(RouteParseError::OutOfRange(part.to_string()));
            }
            waypoints.push(fix);
        }

        if waypoints.is_empty() {
            return Err(RouteParseError::Empty);
        }
        Ok(Self { waypoints })
    }
}

/// Walks a route, reporting each waypoint to a simulated service.
#[derive(Debug, Clone)]
pub struct RouteFeeder {
    route: Route,
    interval: Duration,
    laps: Option<usize>,
}

impl RouteFeeder {
    /// Walk the route once.
    pub fn new(route: Route) -> Self {
        Self {
            route,
            interval: DEFAULT_WAYPOINT_INTERVAL,
            laps: Some(1),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Walk the route `laps` times, or forever with `None`.
    pub fn with_laps(mut self, laps: Option<usize>) -> Self {
        self.laps = laps;
        self
    }

    /// Report waypoints until the route is done or shutdown is signalled.
    ///
    /// Waypoints reported while nobody is subscribed are lost, as they would
    /// be on a real device. Returns how many fixes reached a listener.
    pub async fn run(self, service: Arc<SimulatedLocationService>, shutdown: CancellationToken) -> usize {
        info!(
            waypoints = self.route.len(),
            interval_ms = self.interval.as_millis() as u64,
            laps = ?self.laps,
            "Route feeder starting"
        );

        let mut delivered = 0;
        let mut lap = 0;
        'laps: while self.laps.map_or(true, |laps| lap < laps) {
            for fix in self.route.waypoints() {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break 'laps,
                    _ = tokio::time::sleep(self.interval) => {}
                }

                if service.emit(*fix) {
                    delivered += 1;
                } else {
                    debug!(latitude = fix.latitude, longitude = fix.longitude, "Waypoint not delivered");
                }
            }
            lap += 1;
        }

        info!(delivered, "Route feeder stopped");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route() {
        let route: Route = "41.1,-8.6; 40.0 , -3.0 ;".parse().unwrap();
        assert_eq!(route.len(), 2);
        assert_eq!(route.waypoints()[1], LocationFix::new(40.0, -3.0));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Route>(), Err(RouteParseError::Empty));
        assert_eq!(
            "41.1".parse::<Route>(),
            Err(RouteParseError::Malformed("41.1".to_string()))
        );
        assert_eq!(
            "95.0,10.0".parse::<Route>(),
            Err(RouteParseError::OutOfRange("95.0,10.0".to_string()))
        );
    }

    #[tokio::test]
    async fn test_feeder_without_listener_delivers_nothing() {
        let service = SimulatedLocationService::new();
        let feeder = RouteFeeder::new(Route::porto_walk()).with_interval(Duration::from_millis(1));

        let delivered = feeder.run(service, CancellationToken::new()).await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_feeder_honours_shutdown() {
        let service = SimulatedLocationService::new();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let feeder = RouteFeeder::new(Route::porto_walk()).with_laps(None);
        assert_eq!(feeder.run(service, shutdown).await, 0);
    }
}
