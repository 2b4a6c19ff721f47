//! Permission gate.
//!
//! Tracks the single permission scope held by a coordinator and turns the
//! platform's prompt/result callback pair into an awaitable outcome.
//!
//! ```text
//! ensure(scope) ──► held? ──────────────► Granted
//!                   platform granted? ──► Granted (now held)
//!                   prompt pending? ────► PendingUserDecision (attached)
//!                   otherwise ──────────► prompt + PendingUserDecision
//!
//! resolve(scope, granted) ──► wakes every waiter attached to that prompt
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::location::PermissionScope;

/// Platform side of runtime permissions.
///
/// Implemented by whatever owns the OS permission dialog. `prompt` is a
/// fire-and-forget side effect; the answer comes back later through
/// [`PermissionGate::resolve`].
pub trait PermissionPlatform: Send + Sync {
    /// Whether the OS currently reports the scope as granted.
    fn is_granted(&self, scope: PermissionScope) -> bool;

    /// Show the permission prompt for a scope.
    fn prompt(&self, scope: PermissionScope);

    /// Called after the gate stops holding a scope.
    fn on_release(&self, _scope: PermissionScope) {}
}

/// Final answer for a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied,
    /// The pending prompt was abandoned before the user answered.
    Cancelled,
}

/// Immediate result of [`PermissionGate::ensure`].
#[derive(Debug)]
pub enum PermissionDecision {
    /// The scope is held; nothing to wait for.
    Granted,
    /// A prompt is showing; await the handle for the answer.
    PendingUserDecision(PendingPermission),
}

/// Awaitable answer to an outstanding permission prompt.
#[derive(Debug)]
pub struct PendingPermission {
    scope: PermissionScope,
    rx: oneshot::Receiver<PermissionOutcome>,
}

impl PendingPermission {
    pub fn scope(&self) -> PermissionScope {
        self.scope
    }
}

impl Future for PendingPermission {
    type Output = PermissionOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.unwrap_or(PermissionOutcome::Cancelled))
    }
}

#[derive(Default)]
struct GateInner {
    held: Option<PermissionScope>,
    pending: HashMap<PermissionScope, Vec<oneshot::Sender<PermissionOutcome>>>,
}

/// Tracks and acquires the single held permission scope.
pub struct PermissionGate {
    platform: Arc<dyn PermissionPlatform>,
    inner: Mutex<GateInner>,
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PermissionGate")
            .field("held", &inner.held)
            .field("pending", &inner.pending.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl PermissionGate {
    pub fn new(platform: Arc<dyn PermissionPlatform>) -> Self {
        Self {
            platform,
            inner: Mutex::new(GateInner::default()),
        }
    }

    /// Make sure `scope` is held, prompting the user when it is not.
    ///
    /// At most one prompt is outstanding per scope. A second call while the
    /// prompt is showing attaches to it instead of prompting again.
    pub fn ensure(&self, scope: PermissionScope) -> PermissionDecision {
        let mut inner = self.inner.lock();

        if inner.held == Some(scope) {
            return PermissionDecision::Granted;
        }

        if self.platform.is_granted(scope) {
            self.hold(&mut inner, scope);
            return PermissionDecision::Granted;
        }

        let (tx, rx) = oneshot::channel();
        let waiters = inner.pending.entry(scope).or_default();
        let first = waiters.is_empty();
        waiters.push(tx);
        drop(inner);

        if first {
            info!(%scope, "Requesting location permission");
            self.platform.prompt(scope);
        } else {
            debug!(%scope, "Permission prompt already showing, attaching");
        }

        PermissionDecision::PendingUserDecision(PendingPermission { scope, rx })
    }

    /// Deliver the user's answer for a prompted scope.
    ///
    /// Returns `false` when no prompt for the scope was pending, in which
    /// case the answer is ignored.
    pub fn resolve(&self, scope: PermissionScope, granted: bool) -> bool {
        let mut inner = self.inner.lock();
        let Some(waiters) = inner.pending.remove(&scope) else {
            debug!(%scope, granted, "Permission result with no pending prompt, ignoring");
            return false;
        };

        let outcome = if granted {
            self.hold(&mut inner, scope);
            PermissionOutcome::Granted
        } else {
            info!(%scope, "Location permission denied");
            PermissionOutcome::Denied
        };
        drop(inner);

        for waiter in waiters {
            let _ = waiter.send(outcome);
        }
        true
    }

    /// Drop a pending prompt. Attached waiters resolve to `Cancelled`.
    pub fn abandon(&self, scope: PermissionScope) {
        if self.inner.lock().pending.remove(&scope).is_some() {
            debug!(%scope, "Abandoned pending permission prompt");
        }
    }

    /// Drop every pending prompt.
    pub fn abandon_all(&self) {
        let mut inner = self.inner.lock();
        if !inner.pending.is_empty() {
            debug!(count = inner.pending.len(), "Abandoned pending permission prompts");
            inner.pending.clear();
        }
    }

    /// Stop holding the current scope. Always succeeds.
    ///
    /// Returns the scope that was held, if any.
    pub fn release(&self) -> Option<PermissionScope> {
        let released = self.inner.lock().held.take();
        if let Some(scope) = released {
            debug!(%scope, "Released location permission");
            self.platform.on_release(scope);
        }
        released
    }

    /// Scope currently held.
    pub fn held(&self) -> Option<PermissionScope> {
        self.inner.lock().held
    }

    /// Whether a prompt for `scope` is outstanding.
    pub fn is_pending(&self, scope: PermissionScope) -> bool {
        self.inner.lock().pending.contains_key(&scope)
    }

    fn hold(&self, inner: &mut GateInner, scope: PermissionScope) {
        if let Some(previous) = inner.held.take() {
            if previous != scope {
                debug!(%previous, %scope, "Releasing previous scope before holding new one");
                self.platform.on_release(previous);
            }
        }
        inner.held = Some(scope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Prompt(PermissionScope),
        Release(PermissionScope),
    }

    #[derive(Default)]
    struct RecordingPlatform {
        granted: Mutex<HashSet<PermissionScope>>,
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingPlatform {
        fn granting(scope: PermissionScope) -> Self {
            let platform = Self::default();
            platform.granted.lock().insert(scope);
            platform
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }
    }

    impl PermissionPlatform for RecordingPlatform {
        fn is_granted(&self, scope: PermissionScope) -> bool {
            self.granted.lock().contains(&scope)
        }

        fn prompt(&self, scope: PermissionScope) {
            self.calls.lock().push(Call::Prompt(scope));
        }

        fn on_release(&self, scope: PermissionScope) {
            self.calls.lock().push(Call::Release(scope));
        }
    }

    fn gate_with(platform: &Arc<RecordingPlatform>) -> PermissionGate {
        PermissionGate::new(Arc::clone(platform) as Arc<dyn PermissionPlatform>)
    }

    #[test]
    fn test_already_granted_completes_immediately() {
        let platform = Arc::new(RecordingPlatform::granting(PermissionScope::Fine));
        let gate = gate_with(&platform);

        assert!(matches!(
            gate.ensure(PermissionScope::Fine),
            PermissionDecision::Granted
        ));
        assert_eq!(gate.held(), Some(PermissionScope::Fine));
        assert!(platform.calls().is_empty(), "No prompt expected");
    }

    #[tokio::test]
    async fn test_prompt_then_grant() {
        let platform = Arc::new(RecordingPlatform::default());
        let gate = gate_with(&platform);

        let PermissionDecision::PendingUserDecision(pending) = gate.ensure(PermissionScope::Coarse)
        else {
            panic!("Expected pending decision");
        };
        assert_eq!(pending.scope(), PermissionScope::Coarse);
        assert_eq!(platform.calls(), vec![Call::Prompt(PermissionScope::Coarse)]);
        assert!(gate.held().is_none());

        assert!(gate.resolve(PermissionScope::Coarse, true));
        assert_eq!(pending.await, PermissionOutcome::Granted);
        assert_eq!(gate.held(), Some(PermissionScope::Coarse));
    }

    #[tokio::test]
    async fn test_prompt_then_deny() {
        let platform = Arc::new(RecordingPlatform::default());
        let gate = gate_with(&platform);

        let PermissionDecision::PendingUserDecision(pending) = gate.ensure(PermissionScope::Fine)
        else {
            panic!("Expected pending decision");
        };

        gate.resolve(PermissionScope::Fine, false);
        assert_eq!(pending.await, PermissionOutcome::Denied);
        assert!(gate.held().is_none());
    }

    #[tokio::test]
    async fn test_second_ensure_attaches_without_duplicate_prompt() {
        let platform = Arc::new(RecordingPlatform::default());
        let gate = gate_with(&platform);

        let first = gate.ensure(PermissionScope::Fine);
        let second = gate.ensure(PermissionScope::Fine);
        assert_eq!(platform.calls(), vec![Call::Prompt(PermissionScope::Fine)]);

        gate.resolve(PermissionScope::Fine, true);

        for decision in [first, second] {
            let PermissionDecision::PendingUserDecision(pending) = decision else {
                panic!("Expected pending decision");
            };
            assert_eq!(pending.await, PermissionOutcome::Granted);
        }
    }

    #[test]
    fn test_resolve_without_pending_is_ignored() {
        let platform = Arc::new(RecordingPlatform::default());
        let gate = gate_with(&platform);

        assert!(!gate.resolve(PermissionScope::Fine, true));
        assert!(gate.held().is_none());
    }

    #[tokio::test]
    async fn test_abandon_cancels_waiters() {
        let platform = Arc::new(RecordingPlatform::default());
        let gate = gate_with(&platform);

        let PermissionDecision::PendingUserDecision(pending) = gate.ensure(PermissionScope::Fine)
        else {
            panic!("Expected pending decision");
        };
        gate.abandon(PermissionScope::Fine);

        assert_eq!(pending.await, PermissionOutcome::Cancelled);
        assert!(!gate.is_pending(PermissionScope::Fine));
        assert!(!gate.resolve(PermissionScope::Fine, true));
        assert!(gate.held().is_none());
    }

    #[tokio::test]
    async fn test_abandon_all_cancels_every_scope() {
        let platform = Arc::new(RecordingPlatform::default());
        let gate = gate_with(&platform);

        let fine = gate.ensure(PermissionScope::Fine);
        let coarse = gate.ensure(PermissionScope::Coarse);
        gate.abandon_all();

        for decision in [fine, coarse] {
            let PermissionDecision::PendingUserDecision(pending) = decision else {
                panic!("Expected pending decision");
            };
            assert_eq!(pending.await, PermissionOutcome::Cancelled);
        }
        assert!(!gate.resolve(PermissionScope::Coarse, true));
        assert!(gate.held().is_none());
    }

    #[test]
    fn test_release_is_idempotent() {
        let platform = Arc::new(RecordingPlatform::granting(PermissionScope::Fine));
        let gate = gate_with(&platform);
        gate.ensure(PermissionScope::Fine);

        assert_eq!(gate.release(), Some(PermissionScope::Fine));
        assert_eq!(gate.release(), None);
        assert_eq!(platform.calls(), vec![Call::Release(PermissionScope::Fine)]);
    }

    #[test]
    fn test_new_scope_releases_old_one_first() {
        let platform = Arc::new(RecordingPlatform::default());
        platform.granted.lock().insert(PermissionScope::Fine);
        platform.granted.lock().insert(PermissionScope::Coarse);
        let gate = gate_with(&platform);

        gate.ensure(PermissionScope::Fine);
        gate.ensure(PermissionScope::Coarse);

        assert_eq!(gate.held(), Some(PermissionScope::Coarse));
        assert_eq!(platform.calls(), vec![Call::Release(PermissionScope::Fine)]);
    }
}
