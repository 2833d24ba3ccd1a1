//! # State: one node of the hierarchy.
//!
//! A [`State`] is constructed once by its owning machine (or by the
//! application, for the root) and lives as long as the hierarchy; only its
//! entered flag and its running activity change over time.
//!
//! ## Lifecycle
//! ```text
//! inactive ──enter()──► active ──start_activity()──► active(running)
//!    ▲                                                     │
//!    └───────────── exit(): cancel + wait ◄────────────────┘
//!                   on_exit, Exited
//! ```
//!
//! ## Rules
//! - `enter()` runs entry behavior, then registers the state (`Entered`).
//! - `exit()` cancels the activity and **waits** for it: for a machine this
//!   unwinds its active sub-state recursively. Only then does it run exit
//!   behavior and deregister the state (`Exited`).
//! - Final states never run an activity.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::{BoxError, StateError};
use crate::events::Event;
use crate::machine::{self, Machine};
use crate::observers::{Lifecycle, LifecycleKind};
use crate::states::activity::Activity;
use crate::states::{Behavior, Context, Inert, StateTag};

enum Kind<S: StateTag, E: Event> {
    Simple,
    Final,
    Composite(Machine<S, E>),
}

/// A node of the state hierarchy: a simple, final or composite state.
pub struct State<S: StateTag, E: Event> {
    tag: S,
    kind: Kind<S, E>,
    behavior: Arc<dyn Behavior<S, E>>,
    entered: AtomicBool,
    activity: Mutex<Option<Activity>>,
}

impl<S: StateTag, E: Event> State<S, E> {
    fn with_kind(tag: S, kind: Kind<S, E>, behavior: Arc<dyn Behavior<S, E>>) -> Arc<Self> {
        Arc::new(Self {
            tag,
            kind,
            behavior,
            entered: AtomicBool::new(false),
            activity: Mutex::new(None),
        })
    }

    /// Creates a simple (leaf) state with default behavior.
    pub fn simple(tag: S) -> Arc<Self> {
        Self::simple_with(tag, Inert)
    }

    /// Creates a simple (leaf) state with the given behavior.
    pub fn simple_with(tag: S, behavior: impl Behavior<S, E>) -> Arc<Self> {
        Self::with_kind(tag, Kind::Simple, Arc::new(behavior))
    }

    /// Creates a final state with default behavior.
    pub fn final_state(tag: S) -> Arc<Self> {
        Self::final_with(tag, Inert)
    }

    /// Creates a final state with the given behavior.
    pub fn final_with(tag: S, behavior: impl Behavior<S, E>) -> Arc<Self> {
        Self::with_kind(tag, Kind::Final, Arc::new(behavior))
    }

    pub(crate) fn composite(
        tag: S,
        machine: Machine<S, E>,
        behavior: Arc<dyn Behavior<S, E>>,
    ) -> Arc<Self> {
        Self::with_kind(tag, Kind::Composite(machine), behavior)
    }

    #[inline]
    pub fn tag(&self) -> S {
        self.tag
    }

    #[inline]
    pub fn is_final(&self) -> bool {
        matches!(self.kind, Kind::Final)
    }

    #[inline]
    pub fn is_composite(&self) -> bool {
        matches!(self.kind, Kind::Composite(_))
    }

    /// Returns `true` between the end of `enter()` and the end of `exit()`.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }

    /// Returns `true` while a do-activity (or supervising loop) is running.
    pub fn is_running(&self) -> bool {
        self.activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|a| !a.is_finished())
    }

    /// Returns the machine if this is a composite state.
    pub fn as_machine(&self) -> Option<&Machine<S, E>> {
        match &self.kind {
            Kind::Composite(machine) => Some(machine),
            _ => None,
        }
    }

    pub fn behavior(&self) -> &dyn Behavior<S, E> {
        self.behavior.as_ref()
    }

    /// Evaluates this state's default guard.
    pub fn guard(&self) -> bool {
        self.behavior.guard()
    }

    /// Runs this state's default action.
    pub fn action(&self, ctx: &Context<S, E>) -> Result<(), BoxError> {
        self.behavior.action(ctx)
    }

    /// Enters the state: entry behavior, then registration.
    ///
    /// A machine first discards events queued while it was inactive
    /// (see [`Config::drain_on_entry`](crate::Config::drain_on_entry)).
    pub fn enter(&self, ctx: &Context<S, E>) -> Result<(), StateError> {
        if self.is_active() {
            return Err(StateError::AlreadyActive {
                state: self.label(),
            });
        }

        if let Kind::Composite(machine) = &self.kind {
            if ctx.config().drain_on_entry {
                let dropped = machine.inbox().drain();
                if dropped > 0 {
                    tracing::trace!(state = ?self.tag, dropped, "stale events discarded");
                }
            }
        }

        self.behavior.on_enter(ctx);
        self.entered.store(true, Ordering::Release);
        ctx.notify(Lifecycle::new(LifecycleKind::Entered, self.tag));
        Ok(())
    }

    /// Spawns the do-activity: the supervising loop for a machine, [`Behavior::run`] otherwise.
    ///
    /// Does nothing for a final state.
    pub fn start_activity(self: &Arc<Self>, ctx: &Context<S, E>) -> Result<(), StateError> {
        if self.is_final() {
            return Ok(());
        }

        let mut slot = self.activity.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|a| !a.is_finished()) {
            return Err(StateError::ActivityRunning {
                state: self.label(),
            });
        }

        let scope = ctx.child();
        let token = scope.token().clone();
        let join = match &self.kind {
            Kind::Composite(_) => tokio::spawn(machine::supervise(Arc::clone(self), scope)),
            Kind::Simple | Kind::Final => {
                let behavior = Arc::clone(&self.behavior);
                let state = self.label();
                tokio::spawn(async move {
                    behavior
                        .run(scope)
                        .await
                        .map_err(|source| StateError::ActivityFailed { state, source })
                })
            }
        };

        *slot = Some(Activity::new(token, join));
        Ok(())
    }

    /// Exits the state: unwinds the activity, runs exit behavior, deregisters.
    ///
    /// Exiting an inactive state does nothing. An error (or panic) of the
    /// unwound activity is returned after the exit itself has completed.
    pub async fn exit(&self, ctx: &Context<S, E>) -> Result<(), StateError> {
        if !self.is_active() {
            return Ok(());
        }

        let unwound = self.stop_activity().await;

        self.behavior.on_exit(ctx);
        self.entered.store(false, Ordering::Release);
        ctx.notify(Lifecycle::new(LifecycleKind::Exited, self.tag));
        unwound
    }

    /// Cancels the running activity, if any, and waits for it to return.
    pub async fn stop_activity(&self) -> Result<(), StateError> {
        let activity = self
            .activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match activity {
            Some(activity) => activity.cancel_and_wait(&self.label()).await,
            None => Ok(()),
        }
    }

    /// Like [`stop_activity`](Self::stop_activity), but gives up after `grace`.
    ///
    /// Returns `None` on timeout. The cancelled activity then stays in its
    /// slot: the state still reports running and a new start is rejected.
    pub(crate) async fn stop_activity_within(
        &self,
        grace: Duration,
    ) -> Option<Result<(), StateError>> {
        let taken = self
            .activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut activity) = taken else {
            return Some(Ok(()));
        };

        let label = self.label();
        activity.cancel();
        let waited = tokio::time::timeout(grace, activity.wait(&label)).await;
        match waited {
            Ok(unwound) => Some(unwound),
            Err(_elapsed) => {
                *self.activity.lock().unwrap_or_else(PoisonError::into_inner) = Some(activity);
                None
            }
        }
    }

    pub(crate) fn label(&self) -> String {
        format!("{:?}", self.tag)
    }
}

impl<S: StateTag, E: Event> std::fmt::Debug for State<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            Kind::Simple => "simple",
            Kind::Final => "final",
            Kind::Composite(_) => "composite",
        };
        f.debug_struct("State")
            .field("tag", &self.tag)
            .field("kind", &kind)
            .field("active", &self.is_active())
            .finish()
    }
}
