//! Component lifecycle states and transitions
//!
//! Every registered component moves through:
//! Uninitialized -> Initializing -> Initialized -> Starting -> Running -> Stopping -> Stopped
//!
//! `Error` is entered when a callback fails. A stopped component may be
//! started again.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a component in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    /// Registered, init callback not yet run
    #[default]
    Uninitialized,
    /// Init callback in flight
    Initializing,
    /// Init callback completed
    Initialized,
    /// Start callback in flight
    Starting,
    /// Start callback completed
    Running,
    /// Stop callback in flight
    Stopping,
    /// Stop callback completed; may be started again
    Stopped,
    /// A callback failed; see the entry's last error
    Error,
}

impl LifecycleState {
    pub const ALL: [LifecycleState; 8] = [
        LifecycleState::Uninitialized,
        LifecycleState::Initializing,
        LifecycleState::Initialized,
        LifecycleState::Starting,
        LifecycleState::Running,
        LifecycleState::Stopping,
        LifecycleState::Stopped,
        LifecycleState::Error,
    ];

    /// Check if a state transition is valid
    pub fn can_transition_to(&self, next: LifecycleState) -> bool {
        use LifecycleState::*;

        match (self, next) {
            // From Uninitialized
            (Uninitialized, Initializing) => true,

            // From Initializing
            (Initializing, Initialized) => true,
            (Initializing, Error) => true,
            (Initializing, Stopping) => true,

            // From Initialized
            (Initialized, Starting) => true,
            (Initialized, Stopping) => true,

            // From Starting
            (Starting, Running) => true,
            (Starting, Error) => true,
            (Starting, Stopping) => true,

            // From Running
            (Running, Stopping) => true,

            // From Stopping
            (Stopping, Stopped) => true,
            (Stopping, Error) => true,

            // From Stopped (restart, or a failed destroy callback)
            (Stopped, Starting) => true,
            (Stopped, Error) => true,

            // From Error
            (Error, Stopping) => true,

            _ => false,
        }
    }

    /// True while a callback for this component is being awaited
    pub fn is_transitional(&self) -> bool {
        matches!(
            self,
            LifecycleState::Initializing | LifecycleState::Starting | LifecycleState::Stopping
        )
    }

    /// Initialized or running, the states a healthy component rests in
    pub fn is_operational(&self) -> bool {
        matches!(self, LifecycleState::Initialized | LifecycleState::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "UNINITIALIZED",
            LifecycleState::Initializing => "INITIALIZING",
            LifecycleState::Initialized => "INITIALIZED",
            LifecycleState::Starting => "STARTING",
            LifecycleState::Running => "RUNNING",
            LifecycleState::Stopping => "STOPPING",
            LifecycleState::Stopped => "STOPPED",
            LifecycleState::Error => "ERROR",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle step the registry can drive a component through
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleOperation {
    Initialize,
    Start,
    Stop,
    Destroy,
}

impl LifecycleOperation {
    /// State held while this operation's callback is awaited
    pub fn in_progress_state(&self) -> Option<LifecycleState> {
        match self {
            LifecycleOperation::Initialize => Some(LifecycleState::Initializing),
            LifecycleOperation::Start => Some(LifecycleState::Starting),
            LifecycleOperation::Stop => Some(LifecycleState::Stopping),
            LifecycleOperation::Destroy => None,
        }
    }

    /// State reached when the callback completes
    pub fn completed_state(&self) -> Option<LifecycleState> {
        match self {
            LifecycleOperation::Initialize => Some(LifecycleState::Initialized),
            LifecycleOperation::Start => Some(LifecycleState::Running),
            LifecycleOperation::Stop => Some(LifecycleState::Stopped),
            LifecycleOperation::Destroy => None,
        }
    }

    /// Decide what this operation does to a component currently in `state`.
    ///
    /// Dependency checks for `Initialize` are not covered here; they need the
    /// rest of the registry.
    pub fn admit(&self, state: LifecycleState) -> Admission {
        use LifecycleState::*;

        match (self, state) {
            (LifecycleOperation::Initialize, Uninitialized) => Admission::Proceed,
            (LifecycleOperation::Initialize, _) => Admission::AlreadySatisfied,

            (LifecycleOperation::Start, Running) => Admission::AlreadySatisfied,
            (LifecycleOperation::Start, Initialized | Stopped) => Admission::Proceed,
            (LifecycleOperation::Start, _) => Admission::Rejected,

            (LifecycleOperation::Stop, Uninitialized | Stopped | Stopping) => {
                Admission::AlreadySatisfied
            }
            (LifecycleOperation::Stop, _) => Admission::Proceed,

            (LifecycleOperation::Destroy, Stopped) => Admission::Proceed,
            (LifecycleOperation::Destroy, _) => Admission::AlreadySatisfied,
        }
    }
}

impl fmt::Display for LifecycleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            LifecycleOperation::Initialize => "initialize",
            LifecycleOperation::Start => "start",
            LifecycleOperation::Stop => "stop",
            LifecycleOperation::Destroy => "destroy",
        };
        f.write_str(verb)
    }
}

/// Verdict of [`LifecycleOperation::admit`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Run the callback
    Proceed,
    /// Nothing to do; report success without side effects
    AlreadySatisfied,
    /// The component is in a state this operation cannot start from
    Rejected,
}

/// Result of a single-component lifecycle call that did not fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The callback ran and the component reached this state
    Completed(LifecycleState),
    /// Idempotent no-op; the component was left in this state
    Skipped(LifecycleState),
}

impl Outcome {
    pub fn state(&self) -> LifecycleState {
        match self {
            Outcome::Completed(state) | Outcome::Skipped(state) => *state,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }
}

/// Events emitted during lifecycle transitions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Component was registered
    Registered { name: String },
    /// Component state changed
    StateChanged {
        name: String,
        old_state: LifecycleState,
        new_state: LifecycleState,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        use LifecycleState::*;

        let happy_path = [
            Uninitialized,
            Initializing,
            Initialized,
            Starting,
            Running,
            Stopping,
            Stopped,
            Starting,
        ];
        for pair in happy_path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be valid",
                pair[0],
                pair[1]
            );
        }

        assert!(Initializing.can_transition_to(Error));
        assert!(Starting.can_transition_to(Error));
        assert!(Stopping.can_transition_to(Error));
        assert!(Error.can_transition_to(Stopping));
    }

    #[test]
    fn test_invalid_transitions() {
        use LifecycleState::*;

        assert!(!Uninitialized.can_transition_to(Running));
        assert!(!Uninitialized.can_transition_to(Starting));
        assert!(!Error.can_transition_to(Starting));
        assert!(!Error.can_transition_to(Initializing));
        assert!(!Running.can_transition_to(Initializing));
        assert!(!Stopped.can_transition_to(Running));

        for state in LifecycleState::ALL {
            assert!(!state.can_transition_to(state), "{} -> itself", state);
        }
    }

    #[test]
    fn test_every_admitted_operation_has_a_legal_edge() {
        let operations = [
            LifecycleOperation::Initialize,
            LifecycleOperation::Start,
            LifecycleOperation::Stop,
        ];

        for operation in operations {
            for state in LifecycleState::ALL {
                if operation.admit(state) != Admission::Proceed {
                    continue;
                }
                let in_progress = operation.in_progress_state().unwrap();
                let completed = operation.completed_state().unwrap();
                assert!(state.can_transition_to(in_progress), "{operation} from {state}");
                assert!(in_progress.can_transition_to(completed));
                assert!(in_progress.can_transition_to(LifecycleState::Error));
            }
        }
    }

    #[test]
    fn test_admission_rules() {
        use LifecycleState::*;

        assert_eq!(LifecycleOperation::Initialize.admit(Uninitialized), Admission::Proceed);
        assert_eq!(
            LifecycleOperation::Initialize.admit(Initialized),
            Admission::AlreadySatisfied
        );
        assert_eq!(LifecycleOperation::Initialize.admit(Error), Admission::AlreadySatisfied);

        assert_eq!(LifecycleOperation::Start.admit(Initialized), Admission::Proceed);
        assert_eq!(LifecycleOperation::Start.admit(Stopped), Admission::Proceed);
        assert_eq!(LifecycleOperation::Start.admit(Running), Admission::AlreadySatisfied);
        assert_eq!(LifecycleOperation::Start.admit(Uninitialized), Admission::Rejected);
        assert_eq!(LifecycleOperation::Start.admit(Error), Admission::Rejected);

        assert_eq!(LifecycleOperation::Stop.admit(Uninitialized), Admission::AlreadySatisfied);
        assert_eq!(LifecycleOperation::Stop.admit(Stopping), Admission::AlreadySatisfied);
        assert_eq!(LifecycleOperation::Stop.admit(Stopped), Admission::AlreadySatisfied);
        assert_eq!(LifecycleOperation::Stop.admit(Running), Admission::Proceed);
        assert_eq!(LifecycleOperation::Stop.admit(Error), Admission::Proceed);

        assert_eq!(LifecycleOperation::Destroy.admit(Stopped), Admission::Proceed);
        assert_eq!(LifecycleOperation::Destroy.admit(Running), Admission::AlreadySatisfied);
    }

    #[test]
    fn test_lifecycle_state_default() {
        assert_eq!(LifecycleState::default(), LifecycleState::Uninitialized);
    }

    #[test]
    fn test_state_serializes_as_upper_case() {
        let json = serde_json::to_string(&LifecycleState::Running).unwrap();
        assert_eq!(json, "\"RUNNING\"");

        let parsed: LifecycleState = serde_json::from_str("\"STOPPED\"").unwrap();
        assert_eq!(parsed, LifecycleState::Stopped);
    }

    #[test]
    fn test_outcome_accessors() {
        let done = Outcome::Completed(LifecycleState::Running);
        assert!(!done.is_skipped());
        assert_eq!(done.state(), LifecycleState::Running);

        let skipped = Outcome::Skipped(LifecycleState::Stopping);
        assert!(skipped.is_skipped());
        assert_eq!(skipped.state(), LifecycleState::Stopping);
    }
}
