//! Simulated permission platform.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::location::PermissionScope;
use crate::permission::PermissionPlatform;

/// Calls the gate made on the platform, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionCall {
    Prompt(PermissionScope),
    Release(PermissionScope),
}

/// In-memory permission platform.
///
/// Prompts are published on a channel so a driver (test or CLI) can answer
/// them through the coordinator handle. Granting a scope here is what the OS
/// would remember after the user said yes.
pub struct SimulatedPermissions {
    granted: Mutex<HashSet<PermissionScope>>,
    calls: Mutex<Vec<PermissionCall>>,
    prompts: mpsc::UnboundedSender<PermissionScope>,
}

impl SimulatedPermissions {
    /// Returns the platform and the receiver of prompt requests.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PermissionScope>) {
        let (prompts, rx) = mpsc::unbounded_channel();
        let platform = Arc::new(Self {
            granted: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            prompts,
        });
        (platform, rx)
    }

    /// Mark a scope as granted at the OS level.
    pub fn grant(&self, scope: PermissionScope) {
        self.granted.lock().insert(scope);
    }

    pub fn revoke(&self, scope: PermissionScope) {
        self.granted.lock().remove(&scope);
    }

    pub fn calls(&self) -> Vec<PermissionCall> {
        self.calls.lock().clone()
    }

    pub fn prompt_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, PermissionCall::Prompt(_)))
            .count()
    }
}

impl PermissionPlatform for SimulatedPermissions {
    fn is_granted(&self, scope: PermissionScope) -> bool {
        self.granted.lock().contains(&scope)
    }

    fn prompt(&self, scope: PermissionScope) {
        self.calls.lock().push(PermissionCall::Prompt(scope));
        let _ = self.prompts.send(scope);
    }

    fn on_release(&self, scope: PermissionScope) {
        self.calls.lock().push(PermissionCall::Release(scope));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_is_published_and_recorded() {
        let (platform, mut prompts) = SimulatedPermissions::new();

        platform.prompt(PermissionScope::Fine);
        platform.on_release(PermissionScope::Coarse);

        assert_eq!(prompts.try_recv().unwrap(), PermissionScope::Fine);
        assert_eq!(
            platform.calls(),
            vec![
                PermissionCall::Prompt(PermissionScope::Fine),
                PermissionCall::Release(PermissionScope::Coarse)
            ]
        );
        assert_eq!(platform.prompt_count(), 1);
    }

    #[test]
    fn test_grant_and_revoke() {
        let (platform, _prompts) = SimulatedPermissions::new();

        platform.grant(PermissionScope::Coarse);
        assert!(platform.is_granted(PermissionScope::Coarse));
        assert!(!platform.is_granted(PermissionScope::Fine));

        platform.revoke(PermissionScope::Coarse);
        assert!(!platform.is_granted(PermissionScope::Coarse));
    }
}
