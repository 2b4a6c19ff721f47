//! Handle for driving a running coordinator.

use tokio::sync::{mpsc, oneshot, watch};

use super::error::CoordinatorError;
use super::state::{CoordinatorState, CoordinatorStatus};
use crate::location::{PermissionScope, UpdateRequest};
use crate::settings::ResolutionToken;

/// Inbound events for the coordinator task.
#[derive(Debug)]
pub(crate) enum Command {
    RequestUpdates(UpdateRequest),
    DisableUpdates,
    Cancel,
    PermissionResult {
        scope: PermissionScope,
        granted: bool,
    },
    SettingsResolution {
        token: ResolutionToken,
        accepted: bool,
    },
    Status(oneshot::Sender<CoordinatorStatus>),
}

/// Cloneable handle to a [`CoordinatorDaemon`](super::CoordinatorDaemon).
///
/// Every call is queued onto the coordinator task, so calls from several
/// handles are applied in the order they were made.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<CoordinatorStatus>,
}

impl CoordinatorHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<Command>,
        status: watch::Receiver<CoordinatorStatus>,
    ) -> Self {
        Self { commands, status }
    }

    /// Start delivering updates for `request`, replacing whatever is active.
    pub fn request_updates(&self, request: UpdateRequest) -> Result<(), CoordinatorError> {
        self.send(Command::RequestUpdates(request))
    }

    /// Stop updates and release the permission. No-op when idle.
    pub fn disable_updates(&self) -> Result<(), CoordinatorError> {
        self.send(Command::DisableUpdates)
    }

    /// Abandon whatever is pending and go back to idle.
    pub fn cancel(&self) -> Result<(), CoordinatorError> {
        self.send(Command::Cancel)
    }

    /// Deliver the user's answer to a permission prompt.
    pub fn on_permission_result(
        &self,
        scope: PermissionScope,
        granted: bool,
    ) -> Result<(), CoordinatorError> {
        self.send(Command::PermissionResult { scope, granted })
    }

    /// Deliver the user's answer to a settings resolution flow.
    pub fn on_settings_resolution(
        &self,
        token: ResolutionToken,
        accepted: bool,
    ) -> Result<(), CoordinatorError> {
        self.send(Command::SettingsResolution { token, accepted })
    }

    /// Current status, observed after every earlier call on this handle has
    /// been applied.
    pub async fn status(&self) -> Result<CoordinatorStatus, CoordinatorError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Status(tx))?;
        rx.await.map_err(|_| CoordinatorError::Closed)
    }

    /// Most recently published state.
    pub fn state(&self) -> CoordinatorState {
        self.status.borrow().state
    }

    /// Receiver that sees every published status.
    pub fn watch_status(&self) -> watch::Receiver<CoordinatorStatus> {
        self.status.clone()
    }

    /// Wait until the coordinator publishes `state`.
    pub async fn wait_for_state(
        &self,
        state: CoordinatorState,
    ) -> Result<CoordinatorStatus, CoordinatorError> {
        let mut rx = self.status.clone();
        let status = rx
            .wait_for(|status| status.state == state)
            .await
            .map_err(|_| CoordinatorError::Closed)?;
        Ok(*status)
    }

    /// Whether the coordinator task is still accepting commands.
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    fn send(&self, command: Command) -> Result<(), CoordinatorError> {
        self.commands
            .send(command)
            .map_err(|_| CoordinatorError::Closed)
    }
}
