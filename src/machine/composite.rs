//! # Machine: the configuration and cursor of a composite state.
//!
//! A [`Machine`] is fixed at construction by [`MachineBuilder`]; only its
//! cursor (`active` sub-state and recorded `history`) changes while running.
//!
//! ## Rules
//! - `active` always names a sub-state; it is reset to `initial` whenever the
//!   machine unwinds.
//! - With history enabled, unwinding records `active`, unless it is the final
//!   state, in which case the recorded history is cleared.
//! - Entering the final state publishes the completion event exactly once,
//!   unless the machine is being exited at that point.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::StateError;
use crate::events::{Event, Inbox};
use crate::machine::table::{ActionFn, TransitionTable};
use crate::machine::{transition_to, MachineBuilder};
use crate::observers::{Lifecycle, LifecycleKind};
use crate::states::{Context, State, StateTag};

/// Chooses the entry sub-state when no history applies; receives `initial`.
pub type EntrySelector<S> = Box<dyn Fn(S) -> S + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct Cursor<S> {
    active: S,
    history: Option<S>,
}

/// Composite-state configuration: sub-states, transition table and inbox.
pub struct Machine<S: StateTag, E: Event> {
    initial: S,
    final_state: Option<S>,
    history: bool,
    completion: Option<E>,
    entry: Option<EntrySelector<S>>,
    subscriptions: Vec<E>,
    states: HashMap<S, Arc<State<S, E>>>,
    table: TransitionTable<S, E>,
    inbox: Inbox<E>,
    cursor: Mutex<Cursor<S>>,
}

impl<S: StateTag, E: Event> Machine<S, E> {
    /// Starts building the composite state `tag`.
    pub fn builder(tag: S) -> MachineBuilder<S, E> {
        MachineBuilder::new(tag)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        initial: S,
        final_state: Option<S>,
        history: bool,
        completion: Option<E>,
        entry: Option<EntrySelector<S>>,
        subscriptions: Vec<E>,
        states: HashMap<S, Arc<State<S, E>>>,
        table: TransitionTable<S, E>,
    ) -> Self {
        Self {
            initial,
            final_state,
            history,
            completion,
            entry,
            subscriptions,
            states,
            table,
            inbox: Inbox::new(),
            cursor: Mutex::new(Cursor {
                active: initial,
                history: None,
            }),
        }
    }

    #[inline]
    pub fn initial(&self) -> S {
        self.initial
    }

    #[inline]
    pub fn final_state(&self) -> Option<S> {
        self.final_state
    }

    /// Returns `true` if the machine resumes at its last sub-state.
    #[inline]
    pub fn has_history(&self) -> bool {
        self.history
    }

    #[inline]
    pub fn completion(&self) -> Option<E> {
        self.completion
    }

    /// Events this machine asked the bus to deliver to its inbox.
    pub fn subscriptions(&self) -> &[E] {
        &self.subscriptions
    }

    /// Returns the sub-state tagged `tag`.
    pub fn sub_state(&self, tag: S) -> Option<&Arc<State<S, E>>> {
        self.states.get(&tag)
    }

    /// Iterates over every sub-state, in no particular order.
    pub fn sub_states(&self) -> impl Iterator<Item = &Arc<State<S, E>>> {
        self.states.values()
    }

    pub fn table(&self) -> &TransitionTable<S, E> {
        &self.table
    }

    pub fn inbox(&self) -> &Inbox<E> {
        &self.inbox
    }

    /// Returns the current sub-state tag.
    ///
    /// While the machine is not running this is `initial`.
    pub fn active(&self) -> S {
        self.cursor().active
    }

    /// Returns the recorded history, if any.
    pub fn history(&self) -> Option<S> {
        self.cursor().history
    }

    /// Destination of the next entry: history, else the entry selector, else `initial`.
    pub fn entry_destination(&self) -> S {
        if self.history {
            if let Some(resume) = self.cursor().history {
                return resume;
            }
        }
        match &self.entry {
            Some(select) => select(self.initial),
            None => self.initial,
        }
    }

    /// Moves the machine from its current sub-state to `target`.
    ///
    /// `current` is `None` only for the entry transition of an activation.
    pub(crate) async fn transition(
        &self,
        owner: &State<S, E>,
        current: Option<&Arc<State<S, E>>>,
        target: S,
        action: Option<&ActionFn<'_, S, E>>,
        ctx: &Context<S, E>,
    ) -> Result<(), StateError> {
        let destination = self
            .states
            .get(&target)
            .ok_or_else(|| StateError::UnknownState {
                machine: owner.label(),
                state: format!("{target:?}"),
            })?;

        let moved = transition_to(current, destination, action, ctx).await;
        if destination.is_active() {
            self.set_active(target);
        }
        if moved?.is_none() {
            tracing::trace!(machine = ?owner.tag(), to = ?target, "transition abandoned on cancel");
            return Ok(());
        }

        let mut record = Lifecycle::new(LifecycleKind::Transitioned, owner.tag()).with_target(target);
        if let Some(current) = current {
            record = record.with_from(current.tag());
        }
        ctx.notify(record);

        // No completion once the parent has started exiting this machine.
        if self.final_state == Some(target) && !ctx.is_cancelled() {
            if let Some(event) = self.completion {
                let delivered = ctx.publish(event);
                tracing::debug!(machine = ?owner.tag(), ?event, delivered, "completion published");
            }
            ctx.notify(Lifecycle::new(LifecycleKind::Completed, owner.tag()).with_target(target));
        }
        Ok(())
    }

    /// Handles one inbox event: selects a row for the active sub-state and takes it.
    ///
    /// Events without a matching row (or whose guards all fail) are ignored.
    pub(crate) async fn dispatch(
        &self,
        owner: &State<S, E>,
        event: E,
        ctx: &Context<S, E>,
    ) -> Result<(), StateError> {
        let source = self.active();
        let Some(row) = self.table.select(source, event, || owner.guard()) else {
            tracing::trace!(machine = ?owner.tag(), state = ?source, ?event, "event ignored");
            return Ok(());
        };

        let current = self.states.get(&source).cloned();
        let fallback = |ctx: &Context<S, E>| owner.action(ctx);
        let action: &ActionFn<'_, S, E> = match row.action_ref() {
            Some(action) => action,
            None => &fallback,
        };

        tracing::trace!(machine = ?owner.tag(), from = ?source, to = ?row.target(), ?event, "transition");
        self.transition(owner, current.as_ref(), row.target(), Some(action), ctx)
            .await
    }

    /// Records history, exits the active sub-state and resets the cursor.
    pub(crate) async fn unwind(&self, owner: &State<S, E>, ctx: &Context<S, E>) -> Result<(), StateError> {
        let active = self.active();

        if self.history {
            let recorded = (self.final_state != Some(active)).then_some(active);
            self.cursor_mut().history = recorded;
            let mut record = Lifecycle::new(LifecycleKind::HistoryRecorded, owner.tag());
            if let Some(recorded) = recorded {
                record = record.with_target(recorded);
            }
            ctx.notify(record);
        }

        let exited = match self.states.get(&active) {
            Some(state) => state.exit(ctx).await,
            None => Ok(()),
        };
        self.set_active(self.initial);
        exited
    }

    fn set_active(&self, active: S) {
        self.cursor_mut().active = active;
    }

    fn cursor(&self) -> Cursor<S> {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cursor_mut(&self) -> std::sync::MutexGuard<'_, Cursor<S>> {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: StateTag, E: Event> std::fmt::Debug for Machine<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cursor = self.cursor();
        f.debug_struct("Machine")
            .field("initial", &self.initial)
            .field("final_state", &self.final_state)
            .field("history", &self.history)
            .field("active", &cursor.active)
            .field("recorded", &cursor.history)
            .field("states", &self.states.len())
            .finish_non_exhaustive()
    }
}
