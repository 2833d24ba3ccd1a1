//! Error types used by the statevisor engine and runtime.
//!
//! This module defines two main error enums:
//!
//! - [`StateError`]: faults raised while entering, exiting or transitioning states.
//! - [`RuntimeError`]: errors raised by the [`Runtime`](crate::Runtime) driving a root machine.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging.
//!
//! Cancellation is **not** an error: a cancelled activity simply returns `Ok(())`
//! once its subtree has been unwound.

use std::time::Duration;
use thiserror::Error;

/// Boxed error produced by client-supplied callbacks (actions, do-activities).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Faults produced by the state hierarchy.
///
/// State tags and events are carried as their `Debug` rendering so the error
/// type stays independent of the client's tag and event types.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StateError {
    /// Strict publish of an event that no inbox subscribed to.
    #[error("unknown event {event}: no subscriber registered")]
    UnknownEvent {
        /// The published event.
        event: String,
    },

    /// A transition named a destination that is not a sub-state of the machine.
    #[error("machine {machine} has no sub-state {state}")]
    UnknownState {
        /// The machine performing the transition.
        machine: String,
        /// The requested destination.
        state: String,
    },

    /// Machine configuration rejected at construction.
    #[error("invalid machine {machine}: {reason}")]
    InvalidMachine {
        /// The machine being built.
        machine: String,
        /// What is wrong with it.
        reason: String,
    },

    /// `enter()` on a state that is already entered.
    #[error("state {state} is already active")]
    AlreadyActive {
        /// The state.
        state: String,
    },

    /// `start_activity()` while a previous activity is still running.
    #[error("state {state} already runs an activity")]
    ActivityRunning {
        /// The state.
        state: String,
    },

    /// The machine inbox is leased by another supervising loop.
    #[error("inbox of machine {machine} is already leased")]
    InboxBusy {
        /// The machine.
        machine: String,
    },

    /// A transition action failed after the source state was exited.
    #[error("action {from} -> {to} failed: {source}")]
    ActionFailed {
        /// The already-exited source state.
        from: String,
        /// The destination that was not entered.
        to: String,
        /// The action's error.
        #[source]
        source: BoxError,
    },

    /// A do-activity returned an error.
    #[error("activity of {state} failed: {source}")]
    ActivityFailed {
        /// The state owning the activity.
        state: String,
        /// The activity's error.
        #[source]
        source: BoxError,
    },

    /// A do-activity or supervising loop panicked.
    #[error("activity of {state} panicked: {info}")]
    ActivityPanicked {
        /// The state owning the activity.
        state: String,
        /// Panic message, if any.
        info: String,
    },
}

impl StateError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use statevisor::StateError;
    ///
    /// let err = StateError::UnknownEvent { event: "Ping".into() };
    /// assert_eq!(err.as_label(), "state_unknown_event");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StateError::UnknownEvent { .. } => "state_unknown_event",
            StateError::UnknownState { .. } => "state_unknown_state",
            StateError::InvalidMachine { .. } => "state_invalid_machine",
            StateError::AlreadyActive { .. } => "state_already_active",
            StateError::ActivityRunning { .. } => "state_activity_running",
            StateError::InboxBusy { .. } => "state_inbox_busy",
            StateError::ActionFailed { .. } => "state_action_failed",
            StateError::ActivityFailed { .. } => "state_activity_failed",
            StateError::ActivityPanicked { .. } => "state_activity_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }

    pub(crate) fn invalid(machine: impl std::fmt::Debug, reason: impl Into<String>) -> Self {
        StateError::InvalidMachine {
            machine: format!("{machine:?}"),
            reason: reason.into(),
        }
    }
}

/// # Errors produced by the runtime driving a root machine.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The root handed to the runtime is not a composite state.
    #[error("root state {root} is not a machine")]
    RootNotComposite {
        /// The root's tag.
        root: String,
    },

    /// Shutdown grace period was exceeded; the hierarchy did not unwind in time.
    #[error("shutdown timeout {grace:?} exceeded; still active: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// States still registered as active when the grace period ran out.
        stuck: Vec<String>,
    },

    /// OS signal handlers could not be installed.
    #[error("failed to listen for shutdown signals: {0}")]
    Signal(#[from] std::io::Error),

    /// A fault reported by the hierarchy.
    #[error(transparent)]
    State(#[from] StateError),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use statevisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::RootNotComposite { .. } => "runtime_root_not_composite",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signal(_) => "runtime_signal",
            RuntimeError::State(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; still active={stuck:?}")
            }
            other => other.to_string(),
        }
    }
}
