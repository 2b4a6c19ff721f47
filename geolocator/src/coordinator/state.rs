//! Coordinator states.

use std::fmt;

use crate::backend::{BackendKind, SubscriptionId};
use crate::location::{PermissionScope, UpdateRequest};
use crate::settings::{NegotiationId, ResolutionToken};

/// Observable coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordinatorState {
    /// No subscription and nothing pending.
    Idle,
    /// Waiting for the user to answer a permission prompt.
    AwaitingPermission,
    /// Checking ambient settings, or waiting for the user to resolve them.
    NegotiatingSettings,
    /// A backend subscription is live.
    Subscribed,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoordinatorState::Idle => "idle",
            CoordinatorState::AwaitingPermission => "awaiting_permission",
            CoordinatorState::NegotiatingSettings => "negotiating_settings",
            CoordinatorState::Subscribed => "subscribed",
        };
        f.write_str(name)
    }
}

/// Snapshot published after every event the coordinator handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorStatus {
    pub state: CoordinatorState,
    pub held_scope: Option<PermissionScope>,
    pub backend: BackendKind,
    /// Request being served; `None` while idle.
    pub request: Option<UpdateRequest>,
}

impl CoordinatorStatus {
    pub(crate) fn idle(backend: BackendKind) -> Self {
        Self {
            state: CoordinatorState::Idle,
            held_scope: None,
            backend,
            request: None,
        }
    }
}

/// Internal state, carrying what each state needs to recognize its own
/// completions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Phase {
    Idle,
    AwaitingPermission {
        request: UpdateRequest,
        scope: PermissionScope,
        ticket: u64,
    },
    NegotiatingSettings {
        request: UpdateRequest,
        scope: PermissionScope,
        negotiation: NegotiationId,
        resolution: Option<ResolutionToken>,
    },
    Subscribed {
        request: UpdateRequest,
        scope: PermissionScope,
        subscription: SubscriptionId,
    },
}

impl Phase {
    pub(crate) fn state(&self) -> CoordinatorState {
        match self {
            Phase::Idle => CoordinatorState::Idle,
            Phase::AwaitingPermission { .. } => CoordinatorState::AwaitingPermission,
            Phase::NegotiatingSettings { .. } => CoordinatorState::NegotiatingSettings,
            Phase::Subscribed { .. } => CoordinatorState::Subscribed,
        }
    }

    pub(crate) fn request(&self) -> Option<UpdateRequest> {
        match self {
            Phase::Idle => None,
            Phase::AwaitingPermission { request, .. }
            | Phase::NegotiatingSettings { request, .. }
            | Phase::Subscribed { request, .. } => Some(*request),
        }
    }

    /// Scope of the prompt this phase is waiting on.
    pub(crate) fn pending_scope(&self) -> Option<PermissionScope> {
        match self {
            Phase::AwaitingPermission { scope, .. } => Some(*scope),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::AccuracyTier;

    #[test]
    fn test_phase_maps_to_state() {
        let request = UpdateRequest::new(AccuracyTier::High);
        let phase = Phase::AwaitingPermission {
            request,
            scope: PermissionScope::Fine,
            ticket: 3,
        };

        assert_eq!(phase.state(), CoordinatorState::AwaitingPermission);
        assert_eq!(phase.request(), Some(request));
        assert_eq!(phase.pending_scope(), Some(PermissionScope::Fine));
        assert_eq!(Phase::Idle.request(), None);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(CoordinatorState::NegotiatingSettings.to_string(), "negotiating_settings");
    }
}
