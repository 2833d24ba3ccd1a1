//! # Lifecycle records emitted by states and machines.
//!
//! The [`LifecycleKind`] enum classifies what happened:
//! - **Registry changes**: a state finished entry or finished exit
//! - **Machine bookkeeping**: a sub-transition, a history update, a completion
//! - **Faults**: a transition or activity failed
//!
//! The [`Lifecycle`] struct carries the state concerned plus optional source,
//! target and reason fields, depending on the kind.
//!
//! ## Ordering guarantees
//! Each record has a globally unique sequence number (`seq`) that increases
//! monotonically. Records are emitted synchronously at the lifecycle point
//! they describe, so within one hierarchy `seq` order is the order in which
//! the engine performed the steps.
//!
//! ## Example
//! ```rust
//! use statevisor::{Lifecycle, LifecycleKind};
//!
//! let rec = Lifecycle::new(LifecycleKind::Transitioned, "Root")
//!     .with_from("Idle")
//!     .with_target("Busy");
//!
//! assert_eq!(rec.kind, LifecycleKind::Transitioned);
//! assert_eq!(rec.target, Some("Busy"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for lifecycle ordering.
static LIFECYCLE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleKind {
    /// A state completed its entry and is now active.
    ///
    /// Sets:
    /// - `state`: the entered state
    Entered,

    /// A state completed its exit (activity unwound, exit behavior run).
    ///
    /// Sets:
    /// - `state`: the exited state
    Exited,

    /// A machine replaced its active sub-state.
    ///
    /// Sets:
    /// - `state`: the machine
    /// - `from`: the sub-state left (`None` when the machine was just entered)
    /// - `target`: the sub-state entered
    Transitioned,

    /// A history-enabled machine remembered (or cleared) its resume point on exit.
    ///
    /// Sets:
    /// - `state`: the machine
    /// - `target`: the remembered sub-state, `None` when cleared
    HistoryRecorded,

    /// A machine entered its final sub-state and published its completion event.
    ///
    /// Sets:
    /// - `state`: the machine
    /// - `target`: the final sub-state
    Completed,

    /// A transition or activity failed; the machine parks in a partial configuration.
    ///
    /// Sets:
    /// - `state`: the faulted machine or state
    /// - `reason`: the error message
    Faulted,
}

/// Lifecycle record with optional metadata.
#[derive(Debug, Clone)]
pub struct Lifecycle<S> {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Record classification.
    pub kind: LifecycleKind,
    /// State or machine the record is about.
    pub state: S,
    /// Sub-state left by a transition.
    pub from: Option<S>,
    /// Sub-state entered, remembered or completed.
    pub target: Option<S>,
    /// Human-readable reason (faults).
    pub reason: Option<Arc<str>>,
}

impl<S> Lifecycle<S> {
    /// Creates a record of the given kind with current timestamp and next sequence number.
    pub fn new(kind: LifecycleKind, state: S) -> Self {
        Self {
            seq: LIFECYCLE_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            state,
            from: None,
            target: None,
            reason: None,
        }
    }

    /// Attaches the sub-state left by a transition.
    #[inline]
    pub fn with_from(mut self, from: S) -> Self {
        self.from = Some(from);
        self
    }

    /// Attaches the sub-state entered or remembered.
    #[inline]
    pub fn with_target(mut self, target: S) -> Self {
        self.target = Some(target);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn is_entered(&self) -> bool {
        matches!(self.kind, LifecycleKind::Entered)
    }

    #[inline]
    pub fn is_exited(&self) -> bool {
        matches!(self.kind, LifecycleKind::Exited)
    }
}
