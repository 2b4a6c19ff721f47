//! Update coordinator daemon.
//!
//! The [`CoordinatorDaemon`] owns the permission gate, the one provider
//! backend and the reverse geocoder, and runs the location state machine on
//! a single task. Commands from handles, backend signals, async completions
//! and geocode reports all arrive on channels and are handled one at a time.
//!
//! # State machine
//!
//! ```text
//!           request_updates
//!   Idle ───────────────────► AwaitingPermission
//!    ▲                           │      │ granted
//!    │ denied                    │      ├──────────── native ──────────┐
//!    ├───────────────────────────┘      │ cloud                        │
//!    │                                  ▼                              ▼
//!    │ unresolvable / declined   NegotiatingSettings ── satisfied ──► Subscribed
//!    ├───────────────────────────────── │  ▲                           │
//!    │                      resolvable  └──┘ accepted, re-check        │
//!    │                                                                 │
//!    └──────────────── disable_updates / provider lost ────────────────┘
//! ```
//!
//! A new request from any state tears the current one down first. Teardown
//! unsubscribes, makes in-flight settings checks and geocode lookups inert,
//! abandons pending prompts and releases the held permission.
//!
//! # Example
//!
//! ```ignore
//! let (daemon, handle) = CoordinatorDaemon::new(gate, backend, geocoder, sink);
//! let shutdown = CancellationToken::new();
//! tokio::spawn(daemon.run(shutdown.clone()));
//!
//! handle.request_updates(UpdateRequest::new(AccuracyTier::High))?;
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::error::ErrorKind;
use super::handle::{Command, CoordinatorHandle};
use super::sink::LocationSink;
use super::state::{CoordinatorStatus, Phase};
use crate::backend::{BackendEvent, BackendSignal, ProviderBackend};
use crate::geocoder::{AddressReport, GeocodeRequestId, ReverseGeocoder};
use crate::location::{PermissionScope, UpdateRequest};
use crate::permission::{PermissionDecision, PermissionGate, PermissionOutcome};
use crate::settings::{NegotiationId, ResolutionToken, SettingsNegotiator, SettingsOutcome};

/// Async completions routed back onto the coordinator task.
#[derive(Debug)]
enum Completion {
    Permission {
        ticket: u64,
        outcome: PermissionOutcome,
    },
    Settings {
        negotiation: NegotiationId,
        outcome: SettingsOutcome,
    },
}

/// The update coordinator.
pub struct CoordinatorDaemon {
    gate: PermissionGate,
    backend: Box<dyn ProviderBackend>,
    negotiator: Option<Arc<SettingsNegotiator>>,
    geocoder: ReverseGeocoder,
    sink: Arc<dyn LocationSink>,

    phase: Phase,
    next_ticket: u64,
    geocodes: HashSet<GeocodeRequestId>,

    status_tx: watch::Sender<CoordinatorStatus>,
    command_rx: mpsc::UnboundedReceiver<Command>,
    signal_tx: mpsc::UnboundedSender<BackendSignal>,
    signal_rx: mpsc::UnboundedReceiver<BackendSignal>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    report_tx: mpsc::UnboundedSender<AddressReport>,
    report_rx: mpsc::UnboundedReceiver<AddressReport>,
}

impl CoordinatorDaemon {
    /// Creates a coordinator bound to `backend`.
    ///
    /// Returns the daemon and a handle for driving it. The daemon does
    /// nothing until [`run`](Self::run) is spawned.
    pub fn new(
        gate: PermissionGate,
        backend: Box<dyn ProviderBackend>,
        geocoder: ReverseGeocoder,
        sink: Arc<dyn LocationSink>,
    ) -> (Self, CoordinatorHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(CoordinatorStatus::idle(backend.kind()));

        let daemon = Self {
            negotiator: backend.settings_negotiator(),
            gate,
            backend,
            geocoder,
            sink,
            phase: Phase::Idle,
            next_ticket: 1,
            geocodes: HashSet::new(),
            status_tx,
            command_rx,
            signal_tx,
            signal_rx,
            completion_tx,
            completion_rx,
            report_tx,
            report_rx,
        };

        (daemon, CoordinatorHandle::new(command_tx, status_rx))
    }

    /// Runs the coordinator until shutdown is signalled or every handle is
    /// dropped. The session is torn down and the backend closed on exit.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(backend = %self.backend.kind(), "Location coordinator starting");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Location coordinator shutting down");
                    break;
                }

                command = self.command_rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => {
                            info!("All coordinator handles dropped");
                            break;
                        }
                    }
                }

                Some(completion) = self.completion_rx.recv() => {
                    self.handle_completion(completion);
                }

                Some(signal) = self.signal_rx.recv() => {
                    self.handle_signal(signal);
                }

                Some(report) = self.report_rx.recv() => {
                    self.handle_report(report);
                }
            }

            self.publish();
        }

        self.teardown(None);
        self.gate.abandon_all();
        self.backend.close();
        self.publish();
        info!("Location coordinator stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::RequestUpdates(request) => self.start_request(request),
            Command::DisableUpdates => {
                if self.phase != Phase::Idle {
                    info!(state = %self.phase.state(), "Disabling location updates");
                }
                self.teardown(None);
            }
            Command::Cancel => {
                if self.phase != Phase::Idle {
                    info!(state = %self.phase.state(), "Cancelling location request");
                }
                self.teardown(None);
            }
            Command::PermissionResult { scope, granted } => {
                self.gate.resolve(scope, granted);
            }
            Command::SettingsResolution { token, accepted } => {
                self.handle_resolution(token, accepted);
            }
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn start_request(&mut self, request: UpdateRequest) {
        let scope = request.required_scope();
        info!(
            tier = %request.tier(),
            %scope,
            interval_ms = request.interval_millis(),
            "Location updates requested"
        );

        // Checked before teardown so a failed request also drops the prompt
        // it would otherwise have kept.
        if let Err(e) = self.backend.ready() {
            self.fail(e.into());
            return;
        }

        // Last request wins. A prompt already showing for the same scope is
        // kept so the user is not asked twice.
        let keep = self.phase.pending_scope().filter(|pending| *pending == scope);
        self.teardown(keep);

        let ticket = self.next_ticket;
        self.next_ticket += 1;

        match self.gate.ensure(scope) {
            PermissionDecision::Granted => self.permission_granted(request, scope),
            PermissionDecision::PendingUserDecision(pending) => {
                self.transition(Phase::AwaitingPermission {
                    request,
                    scope,
                    ticket,
                });
                let completions = self.completion_tx.clone();
                tokio::spawn(async move {
                    let outcome = pending.await;
                    let _ = completions.send(Completion::Permission { ticket, outcome });
                });
            }
        }
    }

    fn permission_granted(&mut self, request: UpdateRequest, scope: PermissionScope) {
        if self.negotiator.is_some() {
            self.negotiate(request, scope);
        } else {
            self.subscribe(request, scope);
        }
    }

    fn negotiate(&mut self, request: UpdateRequest, scope: PermissionScope) {
        let Some(negotiator) = self.negotiator.clone() else {
            self.subscribe(request, scope);
            return;
        };

        let (negotiation, check) = negotiator.begin(request);
        self.transition(Phase::NegotiatingSettings {
            request,
            scope,
            negotiation,
            resolution: None,
        });

        let completions = self.completion_tx.clone();
        tokio::spawn(async move {
            let outcome = check.await;
            let _ = completions.send(Completion::Settings {
                negotiation,
                outcome,
            });
        });
    }

    fn subscribe(&mut self, request: UpdateRequest, scope: PermissionScope) {
        match self
            .backend
            .subscribe(&request, scope, self.signal_tx.clone())
        {
            Ok(subscription) => self.transition(Phase::Subscribed {
                request,
                scope,
                subscription,
            }),
            Err(e) => self.fail(e.into()),
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Permission { ticket, outcome } => {
                let Phase::AwaitingPermission {
                    request,
                    scope,
                    ticket: current,
                } = self.phase
                else {
                    debug!(ticket, ?outcome, "Permission outcome arrived outside prompt, ignoring");
                    return;
                };
                if ticket != current {
                    debug!(ticket, current, ?outcome, "Stale permission outcome, ignoring");
                    return;
                }

                match outcome {
                    PermissionOutcome::Granted => self.permission_granted(request, scope),
                    PermissionOutcome::Denied => self.fail(ErrorKind::PermissionDenied { scope }),
                    PermissionOutcome::Cancelled => {
                        debug!(%scope, "Permission prompt abandoned");
                        self.teardown(None);
                    }
                }
            }
            Completion::Settings {
                negotiation,
                outcome,
            } => self.handle_settings(negotiation, outcome),
        }
    }

    fn handle_settings(&mut self, negotiation: NegotiationId, outcome: SettingsOutcome) {
        let Phase::NegotiatingSettings {
            request,
            scope,
            negotiation: current,
            ..
        } = self.phase
        else {
            debug!(%negotiation, ?outcome, "Settings outcome arrived while not negotiating, ignoring");
            return;
        };

        let still_current = self
            .negotiator
            .as_ref()
            .is_some_and(|negotiator| negotiator.complete(negotiation));
        if negotiation != current || !still_current {
            debug!(%negotiation, %current, ?outcome, "Stale settings outcome, ignoring");
            return;
        }

        match outcome {
            SettingsOutcome::Satisfied => self.subscribe(request, scope),
            SettingsOutcome::Resolvable(token) => {
                info!(%token, "Location settings need user resolution");
                self.phase = Phase::NegotiatingSettings {
                    request,
                    scope,
                    negotiation,
                    resolution: Some(token),
                };
                self.sink.on_resolution_required(token);
            }
            SettingsOutcome::Unresolvable => self.fail(ErrorKind::SettingsUnresolvable),
        }
    }

    fn handle_resolution(&mut self, token: ResolutionToken, accepted: bool) {
        let Phase::NegotiatingSettings {
            request,
            scope,
            resolution: Some(expected),
            ..
        } = self.phase
        else {
            debug!(%token, accepted, "No settings resolution pending, ignoring");
            return;
        };
        if token != expected {
            debug!(%token, %expected, "Resolution for another token, ignoring");
            return;
        }

        if accepted {
            info!(%token, "Settings resolution accepted, checking again");
            self.negotiate(request, scope);
        } else {
            self.fail(ErrorKind::SettingsDeclined);
        }
    }

    fn handle_signal(&mut self, signal: BackendSignal) {
        let live = match self.phase {
            Phase::Subscribed { subscription, .. } => subscription == signal.subscription,
            _ => false,
        };
        if !live {
            trace!(subscription = %signal.subscription, "Signal for inactive subscription, dropping");
            return;
        }

        match signal.event {
            BackendEvent::Position(position) => {
                trace!(%position, "Position received");
                self.sink.on_position(&position);
                let request_id = self.geocoder.submit(
                    position.latitude(),
                    position.longitude(),
                    self.report_tx.clone(),
                );
                self.geocodes.insert(request_id);
            }
            BackendEvent::Lost => self.fail(ErrorKind::ProviderLost),
        }
    }

    fn handle_report(&mut self, report: AddressReport) {
        if !self.geocodes.remove(&report.request_id) {
            debug!(request = %report.request_id, "Geocode report from torn-down session, dropping");
            return;
        }
        trace!(
            request = %report.request_id,
            found = report.outcome.is_found(),
            "Address lookup complete"
        );
        self.sink.on_address(&report);
    }

    /// Report a terminal failure and go back to idle.
    fn fail(&mut self, error: ErrorKind) {
        warn!(state = %self.phase.state(), error = %error, "Location request failed");
        self.teardown(None);
        self.sink.on_error(&error);
    }

    /// Drop everything the current request holds. Safe from any state.
    ///
    /// `keep_prompt` names a pending permission prompt that survives.
    fn teardown(&mut self, keep_prompt: Option<PermissionScope>) {
        self.backend.unsubscribe();

        if let Some(negotiator) = &self.negotiator {
            negotiator.invalidate();
        }

        if let Some(scope) = self.phase.pending_scope() {
            if keep_prompt != Some(scope) {
                self.gate.abandon(scope);
            }
        }

        if !self.geocodes.is_empty() {
            debug!(count = self.geocodes.len(), "Dropping in-flight address lookups");
            self.geocodes.clear();
        }

        self.gate.release();
        self.transition(Phase::Idle);
    }

    fn transition(&mut self, next: Phase) {
        let from = self.phase.state();
        let to = next.state();
        if from != to {
            info!(%from, %to, "Coordinator state change");
        }
        self.phase = next;
    }

    fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            state: self.phase.state(),
            held_scope: self.gate.held(),
            backend: self.backend.kind(),
            request: self.phase.request(),
        }
    }

    fn publish(&self) {
        let status = self.status();
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendKind, CloudBackend, CloudLocationService, NativeBackend};
    use crate::coordinator::{ChannelSink, CoordinatorState, SinkEvent};
    use crate::location::{AccuracyTier, LocationFix};
    use crate::settings::SettingsStatus;
    use crate::simulation::{SimulatedGeocoder, SimulatedLocationService, SimulatedPermissions};

    fn native_daemon(
        location: &Arc<SimulatedLocationService>,
        permissions: &Arc<SimulatedPermissions>,
    ) -> (
        CoordinatorDaemon,
        CoordinatorHandle,
        mpsc::UnboundedReceiver<SinkEvent>,
    ) {
        let (sink, events) = ChannelSink::new();
        let (daemon, handle) = CoordinatorDaemon::new(
            PermissionGate::new(permissions.clone()),
            Box::new(NativeBackend::new(location.clone())),
            ReverseGeocoder::new(Arc::new(SimulatedGeocoder::new())),
            Arc::new(sink),
        );
        (daemon, handle, events)
    }

    #[tokio::test]
    async fn test_initial_status_is_idle() {
        let location = SimulatedLocationService::new();
        let (permissions, _prompts) = SimulatedPermissions::new();
        let (daemon, handle, _events) = native_daemon(&location, &permissions);
        tokio::spawn(daemon.run(CancellationToken::new()));

        let status = handle.status().await.unwrap();
        assert_eq!(status.state, CoordinatorState::Idle);
        assert_eq!(status.backend, BackendKind::Native);
        assert_eq!(status.held_scope, None);
    }

    #[tokio::test]
    async fn test_dropping_handles_stops_daemon() {
        let location = SimulatedLocationService::new();
        let (permissions, _prompts) = SimulatedPermissions::new();
        permissions.grant(PermissionScope::Coarse);
        let (daemon, handle, _events) = native_daemon(&location, &permissions);
        let task = tokio::spawn(daemon.run(CancellationToken::new()));

        handle
            .request_updates(UpdateRequest::new(AccuracyTier::Balanced))
            .unwrap();
        handle
            .wait_for_state(CoordinatorState::Subscribed)
            .await
            .unwrap();
        drop(handle);

        task.await.unwrap();
        assert!(!location.is_subscribed());
    }

    #[tokio::test]
    async fn test_status_reports_active_request() {
        let location = SimulatedLocationService::new();
        let (permissions, _prompts) = SimulatedPermissions::new();
        permissions.grant(PermissionScope::Fine);
        let (daemon, handle, _events) = native_daemon(&location, &permissions);
        tokio::spawn(daemon.run(CancellationToken::new()));

        let request = UpdateRequest::new(AccuracyTier::High).with_interval_millis(1_000);
        handle.request_updates(request).unwrap();
        let status = handle
            .wait_for_state(CoordinatorState::Subscribed)
            .await
            .unwrap();

        assert_eq!(status.request, Some(request));
        assert_eq!(status.held_scope, Some(PermissionScope::Fine));
    }

    #[tokio::test]
    async fn test_new_request_supersedes_negotiation() {
        let location = SimulatedLocationService::new();
        location.connect().await.unwrap();
        location.script_settings([SettingsStatus::ResolutionRequired(ResolutionToken::new(1))]);
        let (permissions, _prompts) = SimulatedPermissions::new();
        permissions.grant(PermissionScope::Fine);
        permissions.grant(PermissionScope::Coarse);

        let (sink, mut events) = ChannelSink::new();
        let (daemon, handle) = CoordinatorDaemon::new(
            PermissionGate::new(permissions.clone()),
            Box::new(CloudBackend::new(location.clone(), location.clone())),
            ReverseGeocoder::new(Arc::new(SimulatedGeocoder::new())),
            Arc::new(sink),
        );
        tokio::spawn(daemon.run(CancellationToken::new()));

        handle
            .request_updates(UpdateRequest::new(AccuracyTier::High))
            .unwrap();
        assert_eq!(
            events.recv().await,
            Some(SinkEvent::ResolutionRequired(ResolutionToken::new(1)))
        );

        handle
            .request_updates(UpdateRequest::new(AccuracyTier::Balanced))
            .unwrap();
        let status = handle
            .wait_for_state(CoordinatorState::Subscribed)
            .await
            .unwrap();
        assert_eq!(status.held_scope, Some(PermissionScope::Coarse));

        // The old resolution is no longer pending.
        handle
            .on_settings_resolution(ResolutionToken::new(1), false)
            .unwrap();
        assert_eq!(
            handle.status().await.unwrap().state,
            CoordinatorState::Subscribed
        );
        assert!(events.try_recv().is_err());
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone, Copy)]
        enum Step {
            Request(AccuracyTier),
            Disable,
            Cancel,
            Answer(PermissionScope, bool),
            Fix,
            Lose,
        }

        fn tier() -> impl Strategy<Value = AccuracyTier> {
            prop_oneof![Just(AccuracyTier::High), Just(AccuracyTier::Balanced)]
        }

        fn scope() -> impl Strategy<Value = PermissionScope> {
            prop_oneof![Just(PermissionScope::Fine), Just(PermissionScope::Coarse)]
        }

        fn step() -> impl Strategy<Value = Step> {
            prop_oneof![
                3 => tier().prop_map(Step::Request),
                1 => Just(Step::Disable),
                1 => Just(Step::Cancel),
                3 => (scope(), any::<bool>()).prop_map(|(s, g)| Step::Answer(s, g)),
                2 => Just(Step::Fix),
                1 => Just(Step::Lose),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn test_status_invariants_hold(steps in prop::collection::vec(step(), 1..24)) {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .unwrap();

                runtime.block_on(async {
                    let location = SimulatedLocationService::new();
                    let (permissions, _prompts) = SimulatedPermissions::new();
                    let (daemon, handle, _events) = native_daemon(&location, &permissions);
                    let shutdown = CancellationToken::new();
                    let task = tokio::spawn(daemon.run(shutdown.clone()));

                    for step in steps {
                        match step {
                            Step::Request(tier) => {
                                handle.request_updates(UpdateRequest::new(tier)).unwrap();
                            }
                            Step::Disable => handle.disable_updates().unwrap(),
                            Step::Cancel => handle.cancel().unwrap(),
                            Step::Answer(scope, granted) => {
                                if granted {
                                    permissions.grant(scope);
                                } else {
                                    permissions.revoke(scope);
                                }
                                handle.on_permission_result(scope, granted).unwrap();
                            }
                            Step::Fix => {
                                location.emit(LocationFix::new(41.1, -8.6));
                            }
                            Step::Lose => {
                                location.lose();
                            }
                        }

                        tokio::task::yield_now().await;
                        let status = handle.status().await.unwrap();

                        match status.state {
                            CoordinatorState::Subscribed => {
                                let request = status.request;
                                prop_assert!(request.is_some());
                                prop_assert_eq!(
                                    status.held_scope,
                                    request.map(|r| r.required_scope())
                                );
                                prop_assert!(location.is_subscribed());
                            }
                            CoordinatorState::Idle => {
                                prop_assert_eq!(status.held_scope, None);
                                prop_assert_eq!(status.request, None);
                                prop_assert!(!location.is_subscribed());
                            }
                            CoordinatorState::AwaitingPermission
                            | CoordinatorState::NegotiatingSettings => {
                                prop_assert!(status.request.is_some());
                                prop_assert!(!location.is_subscribed());
                            }
                        }
                    }

                    shutdown.cancel();
                    task.await.unwrap();
                    prop_assert!(!location.is_subscribed());
                    Ok(())
                })?;
            }
        }
    }
}
