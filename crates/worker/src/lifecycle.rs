//! Worker lifecycle state machine.

use std::fmt;

use pwacache_core::Error;
use serde::Serialize;

/// Lifecycle state of one worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Built but not yet installing.
    #[default]
    Parsed,
    Installing,
    /// Precache complete, waiting to take control.
    Installed,
    Activating,
    /// Controlling requests.
    Activated,
    /// Failed install or replaced by a newer version. Terminal.
    Redundant,
}

/// Something that happened to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Install,
    Installed,
    InstallFailed,
    Activate,
    Activated,
    Replaced,
}

impl LifecycleEvent {
    fn name(self) -> &'static str {
        match self {
            LifecycleEvent::Install => "install",
            LifecycleEvent::Installed => "finish install",
            LifecycleEvent::InstallFailed => "fail install",
            LifecycleEvent::Activate => "activate",
            LifecycleEvent::Activated => "finish activation",
            LifecycleEvent::Replaced => "replace",
        }
    }
}

impl LifecycleState {
    /// State after `event`, or `InvalidState` if the event is not allowed here.
    pub fn next(self, event: LifecycleEvent) -> Result<Self, Error> {
        use LifecycleEvent as E;
        use LifecycleState as S;

        match (self, event) {
            (S::Parsed, E::Install) => Ok(S::Installing),
            (S::Installing, E::Installed) => Ok(S::Installed),
            (S::Installing, E::InstallFailed) => Ok(S::Redundant),
            (S::Installed, E::Activate) => Ok(S::Activating),
            (S::Activating, E::Activated) => Ok(S::Activated),
            (state, E::Replaced) if state != S::Redundant => Ok(S::Redundant),
            (state, event) => Err(Error::InvalidState { action: event.name().to_string(), state: state.to_string() }),
        }
    }

    pub fn can_intercept_fetch(self) -> bool {
        matches!(self, LifecycleState::Activated)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Parsed => "parsed",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Activated => "activated",
            LifecycleState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut state = LifecycleState::default();
        for event in [LifecycleEvent::Install, LifecycleEvent::Installed, LifecycleEvent::Activate, LifecycleEvent::Activated] {
            state = state.next(event).unwrap();
        }
        assert_eq!(state, LifecycleState::Activated);
        assert!(state.can_intercept_fetch());
    }

    #[test]
    fn test_failed_install_is_terminal() {
        let state = LifecycleState::Installing.next(LifecycleEvent::InstallFailed).unwrap();
        assert_eq!(state, LifecycleState::Redundant);
        assert!(state.next(LifecycleEvent::Install).is_err());
        assert!(state.next(LifecycleEvent::Replaced).is_err());
    }

    #[test]
    fn test_cannot_skip_install() {
        let err = LifecycleState::Parsed.next(LifecycleEvent::Activate).unwrap_err();
        assert_eq!(err.to_string(), "INVALID_STATE: cannot activate while parsed");
    }

    #[test]
    fn test_replaced_from_any_live_state() {
        for state in [LifecycleState::Installed, LifecycleState::Activated, LifecycleState::Installing] {
            assert_eq!(state.next(LifecycleEvent::Replaced).unwrap(), LifecycleState::Redundant);
        }
    }

    #[test]
    fn test_only_activated_intercepts() {
        for state in [LifecycleState::Parsed, LifecycleState::Installed, LifecycleState::Activating, LifecycleState::Redundant] {
            assert!(!state.can_intercept_fetch(), "{state}");
        }
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LifecycleState::Activated).unwrap(), "\"activated\"");
    }
}
