//! Background reverse geocoding worker.
//!
//! Lookups run on their own tokio tasks so a slow service never holds up
//! position delivery. Finished lookups are sent back as [`AddressReport`]s
//! over a channel; the receiving side decides whether a report still counts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::types::{
    AddressReport, Connectivity, GeocodeError, GeocodeOutcome, GeocodeRequestId,
    GeocodingService, MAX_RESULTS,
};

/// Reverse geocoder over a [`GeocodingService`].
///
/// Cheap to clone; clones share the request id sequence.
#[derive(Clone)]
pub struct ReverseGeocoder {
    service: Arc<dyn GeocodingService>,
    connectivity: Option<Arc<dyn Connectivity>>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for ReverseGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReverseGeocoder")
            .field("connectivity_probe", &self.connectivity.is_some())
            .finish_non_exhaustive()
    }
}

impl ReverseGeocoder {
    pub fn new(service: Arc<dyn GeocodingService>) -> Self {
        Self {
            service,
            connectivity: None,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Skip the service and fail fast while `probe` reports offline.
    pub fn with_connectivity(mut self, probe: Arc<dyn Connectivity>) -> Self {
        self.connectivity = Some(probe);
        self
    }

    /// Look up the address for a coordinate.
    pub async fn lookup(&self, latitude: f64, longitude: f64) -> GeocodeOutcome {
        if let Some(probe) = &self.connectivity {
            if !probe.is_online() {
                debug!(latitude, longitude, "Offline, skipping address lookup");
                return GeocodeOutcome::LookupFailed(GeocodeError::Offline);
            }
        }

        match self.service.reverse(latitude, longitude, MAX_RESULTS).await {
            Ok(addresses) => match addresses.into_iter().next() {
                Some(address) if address.is_usable() => GeocodeOutcome::Found(address),
                Some(_) => {
                    debug!(latitude, longitude, "Address has no usable fields");
                    GeocodeOutcome::NotFound
                }
                None => GeocodeOutcome::NotFound,
            },
            Err(e) => {
                warn!(latitude, longitude, error = %e, "Address lookup failed");
                GeocodeOutcome::LookupFailed(e)
            }
        }
    }

    /// Start a lookup on a background task.
    ///
    /// The report is sent on `reports` when the lookup finishes. If the
    /// receiver is gone by then the report is dropped.
    pub fn submit(
        &self,
        latitude: f64,
        longitude: f64,
        reports: mpsc::UnboundedSender<AddressReport>,
    ) -> GeocodeRequestId {
        let request_id = GeocodeRequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let geocoder = self.clone();

        tokio::spawn(async move {
            let outcome = geocoder.lookup(latitude, longitude).await;
            let report = AddressReport {
                request_id,
                latitude,
                longitude,
                outcome,
            };
            if reports.send(report).is_err() {
                debug!(request = %request_id, "Address report receiver gone, dropping");
            }
        });

        request_id
    }
}
