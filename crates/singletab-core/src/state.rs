//! Tab coordinator lifecycle
//!
//! ```text
//! Uninitialized
//!   ↓ create (window present)
//! Registering
//!   ↓ presence registered
//! Active
//!   ↓ cleanup / unload
//! TornDown
//! ```
//!
//! Without a window the coordinator never leaves `Uninitialized`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Nothing registered yet, or no environment to register in
    Uninitialized,
    /// Strategy chosen, presence being announced
    Registering,
    /// Presence announced, listening for other contexts
    Active,
    /// Presence withdrawn, listeners detached
    TornDown,
}

impl LifecycleState {
    /// Check if transition to another state is valid
    pub fn can_transition_to(&self, target: LifecycleState) -> bool {
        matches!(
            (self, target),
            (LifecycleState::Uninitialized, LifecycleState::Registering)
                | (LifecycleState::Registering, LifecycleState::Active)
                // Registration failed because the window is already gone
                | (LifecycleState::Registering, LifecycleState::TornDown)
                | (LifecycleState::Active, LifecycleState::TornDown)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Registering => "registering",
            LifecycleState::Active => "active",
            LifecycleState::TornDown => "torn_down",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(LifecycleState::Uninitialized.can_transition_to(LifecycleState::Registering));
        assert!(LifecycleState::Registering.can_transition_to(LifecycleState::Active));
        assert!(LifecycleState::Registering.can_transition_to(LifecycleState::TornDown));
        assert!(LifecycleState::Active.can_transition_to(LifecycleState::TornDown));
    }

    #[test]
    fn test_invalid_transitions() {
        // No way back once torn down
        assert!(!LifecycleState::TornDown.can_transition_to(LifecycleState::Active));
        assert!(!LifecycleState::TornDown.can_transition_to(LifecycleState::TornDown));
        // Nothing to tear down before registering
        assert!(!LifecycleState::Uninitialized.can_transition_to(LifecycleState::TornDown));
        assert!(!LifecycleState::Active.can_transition_to(LifecycleState::Registering));
    }
}
