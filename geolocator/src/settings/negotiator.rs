//! Settings negotiator.
//!
//! Wraps a [`SettingsClient`] so that only the most recent check counts.
//! Every [`SettingsNegotiator::begin`] bumps the current [`NegotiationId`];
//! a completion is acted on only while [`SettingsNegotiator::is_current`]
//! still holds for it.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use super::types::{NegotiationId, SettingsClient, SettingsOutcome, SettingsStatus};
use crate::location::UpdateRequest;

/// Id value meaning "no negotiation in flight".
const NONE: u64 = 0;

/// Sequences settings checks against a [`SettingsClient`].
pub struct SettingsNegotiator {
    client: Arc<dyn SettingsClient>,
    next_id: AtomicU64,
    current: AtomicU64,
}

impl std::fmt::Debug for SettingsNegotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsNegotiator")
            .field("current", &self.current.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl SettingsNegotiator {
    pub fn new(client: Arc<dyn SettingsClient>) -> Self {
        Self {
            client,
            next_id: AtomicU64::new(1),
            current: AtomicU64::new(NONE),
        }
    }

    /// Start a check, superseding any earlier one.
    ///
    /// Returns the id of the new negotiation and a future for its outcome.
    /// The future owns everything it needs so it can be spawned.
    pub fn begin(
        &self,
        request: UpdateRequest,
    ) -> (
        NegotiationId,
        impl Future<Output = SettingsOutcome> + Send + 'static,
    ) {
        let id = NegotiationId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let previous = self.current.swap(id.0, Ordering::SeqCst);
        if previous != NONE {
            debug!(previous, id = %id, "Superseding in-flight settings negotiation");
        }

        let client = Arc::clone(&self.client);
        let check = async move {
            match client.check_settings(&request).await {
                Ok(SettingsStatus::Satisfied) => SettingsOutcome::Satisfied,
                Ok(SettingsStatus::ResolutionRequired(token)) => {
                    SettingsOutcome::Resolvable(token)
                }
                Ok(SettingsStatus::Unavailable) => SettingsOutcome::Unresolvable,
                Err(e) => {
                    warn!(error = %e, "Settings check failed");
                    SettingsOutcome::Unresolvable
                }
            }
        };

        (id, check)
    }

    /// Check a request and wait for the outcome.
    pub async fn check(&self, request: UpdateRequest) -> (NegotiationId, SettingsOutcome) {
        let (id, check) = self.begin(request);
        (id, check.await)
    }

    /// Whether `id` is still the negotiation that counts.
    pub fn is_current(&self, id: NegotiationId) -> bool {
        self.current.load(Ordering::SeqCst) == id.0
    }

    /// Render any in-flight negotiation stale.
    pub fn invalidate(&self) {
        self.current.store(NONE, Ordering::SeqCst);
    }

    /// Whether a negotiation is in flight.
    pub fn in_flight(&self) -> bool {
        self.current.load(Ordering::SeqCst) != NONE
    }

    /// Mark `id` finished if it is still current.
    pub fn complete(&self, id: NegotiationId) -> bool {
        self.current
            .compare_exchange(id.0, NONE, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}
