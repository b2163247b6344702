//! Worker lifecycle states.
//!
//! ```text
//! Uninstalled -> Installing -> Installed -> Activating -> Active
//!                    |  ^          |
//!                    v  +----------+
//!                Redundant
//! ```
//!
//! `Installed -> Installing` is a re-install of the same generation, which is
//! idempotent. A failed install ends in `Redundant`, which is terminal.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    #[default]
    Uninstalled,
    Installing,
    Installed,
    Activating,
    Active,
    Redundant,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninstalled => "uninstalled",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Active => "active",
            Self::Redundant => "redundant",
        }
    }

    /// Whether fetch interception is enabled in this state.
    pub fn intercepts_fetches(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn can_transition_to(&self, to: WorkerState) -> bool {
        use WorkerState::*;

        matches!(
            (*self, to),
            (Uninstalled, Installing)
                | (Installed, Installing)
                | (Installing, Installed)
                | (Installing, Redundant)
                | (Installed, Activating)
                | (Activating, Active)
        )
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_lifecycle() {
        let path = [
            WorkerState::Uninstalled,
            WorkerState::Installing,
            WorkerState::Installed,
            WorkerState::Activating,
            WorkerState::Active,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_reinstall_allowed() {
        assert!(WorkerState::Installed.can_transition_to(WorkerState::Installing));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!WorkerState::Uninstalled.can_transition_to(WorkerState::Activating));
        assert!(!WorkerState::Installing.can_transition_to(WorkerState::Installing));
        assert!(!WorkerState::Active.can_transition_to(WorkerState::Installing));
        assert!(!WorkerState::Active.can_transition_to(WorkerState::Activating));
        assert!(!WorkerState::Redundant.can_transition_to(WorkerState::Installing));
        assert!(!WorkerState::Installed.can_transition_to(WorkerState::Redundant));
    }

    #[test]
    fn test_only_active_intercepts() {
        assert!(WorkerState::Active.intercepts_fetches());
        assert!(!WorkerState::Installed.intercepts_fetches());
        assert!(!WorkerState::Activating.intercepts_fetches());
    }

    #[test]
    fn test_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&WorkerState::Active).unwrap(), "\"active\"");
    }
}
