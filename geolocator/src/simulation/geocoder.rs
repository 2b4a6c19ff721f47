//! Simulated geocoding service and connectivity probe.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;

use crate::geocoder::{Connectivity, GeocodeError, GeocodingService};
use crate::location::Address;

/// Coordinates are matched after rounding to this many decimals.
const MATCH_DECIMALS: i32 = 3;

fn key(latitude: f64, longitude: f64) -> (i64, i64) {
    let scale = 10f64.powi(MATCH_DECIMALS);
    (
        (latitude * scale).round() as i64,
        (longitude * scale).round() as i64,
    )
}

/// In-memory geocoding service.
///
/// Answers from a table of known places, falling back to a default reply.
pub struct SimulatedGeocoder {
    places: Mutex<Vec<((i64, i64), Address)>>,
    fallback: Mutex<Result<Vec<Address>, GeocodeError>>,
    delay: Duration,
    lookups: AtomicUsize,
}

impl SimulatedGeocoder {
    /// Knows no places; every lookup finds nothing.
    pub fn new() -> Self {
        Self {
            places: Mutex::new(Vec::new()),
            fallback: Mutex::new(Ok(Vec::new())),
            delay: Duration::ZERO,
            lookups: AtomicUsize::new(0),
        }
    }

    /// Answer `address` for lookups near the coordinate.
    pub fn with_place(self, latitude: f64, longitude: f64, address: Address) -> Self {
        self.places.lock().push((key(latitude, longitude), address));
        self
    }

    /// Reply used for coordinates not in the table.
    pub fn with_fallback(self, reply: Result<Vec<Address>, GeocodeError>) -> Self {
        *self.fallback.lock() = reply;
        self
    }

    /// Wait this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn answer(&self, latitude: f64, longitude: f64, max_results: usize) -> Result<Vec<Address>, GeocodeError> {
        let wanted = key(latitude, longitude);
        let known: Vec<Address> = self
            .places
            .lock()
            .iter()
            .filter(|(k, _)| *k == wanted)
            .map(|(_, address)| address.clone())
            .take(max_results)
            .collect();
        if !known.is_empty() {
            return Ok(known);
        }
        self.fallback
            .lock()
            .clone()
            .map(|addresses| addresses.into_iter().take(max_results).collect())
    }
}

impl Default for SimulatedGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl GeocodingService for SimulatedGeocoder {
    fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
        max_results: usize,
    ) -> BoxFuture<'_, Result<Vec<Address>, GeocodeError>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let reply = self.answer(latitude, longitude, max_results);
        let delay = self.delay;
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            reply
        }
        .boxed()
    }
}

/// Connectivity probe flipped by hand.
#[derive(Debug)]
pub struct SimulatedConnectivity {
    online: AtomicBool,
}

impl SimulatedConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Connectivity for SimulatedConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
