//! # Builder for composite states.
//!
//! [`MachineBuilder`] collects the configuration of one machine and turns it
//! into a composite [`State`] ready to be nested in a parent or handed to the
//! [`RuntimeBuilder`](crate::RuntimeBuilder) as the root.
//!
//! ## Validation
//! `build()` fails with [`StateError::InvalidMachine`] when:
//! - no initial state was named, or it is not a sub-state, or it is final;
//! - the final state is not a sub-state, or not built as a final state;
//! - two sub-states share a tag;
//! - a completion event is declared without a final state.
//!
//! Transition rows are not checked.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{BoxError, StateError};
use crate::events::Event;
use crate::machine::composite::{EntrySelector, Machine};
use crate::machine::table::{Transition, TransitionTable};
use crate::states::{Behavior, Context, Inert, State, StateTag};

/// Collects the configuration of one machine.
///
/// # Example
/// ```
/// use statevisor::{Machine, State};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Door { Root, Closed, Open }
///
/// let root = Machine::<Door, u8>::builder(Door::Root)
///     .initial(Door::Closed)
///     .state(State::simple(Door::Closed))
///     .state(State::simple(Door::Open))
///     .on(Door::Closed, 1, Door::Open)
///     .on(Door::Open, 0, Door::Closed)
///     .subscribe([0, 1])
///     .build()
///     .unwrap();
/// assert!(root.is_composite());
/// ```
pub struct MachineBuilder<S: StateTag, E: Event> {
    tag: S,
    initial: Option<S>,
    final_state: Option<S>,
    history: bool,
    completion: Option<E>,
    entry: Option<EntrySelector<S>>,
    subscriptions: Vec<E>,
    states: Vec<Arc<State<S, E>>>,
    table: TransitionTable<S, E>,
    behavior: Arc<dyn Behavior<S, E>>,
}

impl<S: StateTag, E: Event> MachineBuilder<S, E> {
    pub fn new(tag: S) -> Self {
        Self {
            tag,
            initial: None,
            final_state: None,
            history: false,
            completion: None,
            entry: None,
            subscriptions: Vec::new(),
            states: Vec::new(),
            table: TransitionTable::new(),
            behavior: Arc::new(Inert),
        }
    }

    /// Names the default entry sub-state.
    pub fn initial(mut self, tag: S) -> Self {
        self.initial = Some(tag);
        self
    }

    /// Names the final sub-state (which must be built with [`State::final_state`]).
    pub fn final_state(mut self, tag: S) -> Self {
        self.final_state = Some(tag);
        self
    }

    /// Enables resuming at the last exited sub-state.
    pub fn history(mut self, enabled: bool) -> Self {
        self.history = enabled;
        self
    }

    /// Event published each time the final sub-state is entered.
    pub fn completes_with(mut self, event: E) -> Self {
        self.completion = Some(event);
        self
    }

    /// Overrides the entry sub-state on entries that do not resume from history.
    ///
    /// The selector receives `initial` and returns the sub-state to enter.
    pub fn entry_with(mut self, select: impl Fn(S) -> S + Send + Sync + 'static) -> Self {
        self.entry = Some(Box::new(select));
        self
    }

    /// Adds events to deliver to this machine's inbox.
    pub fn subscribe(mut self, events: impl IntoIterator<Item = E>) -> Self {
        self.subscriptions.extend(events);
        self
    }

    /// Adds a sub-state.
    pub fn state(mut self, state: Arc<State<S, E>>) -> Self {
        self.states.push(state);
        self
    }

    /// Adds a transition row.
    pub fn transition(mut self, row: Transition<S, E>) -> Self {
        self.table.insert(row);
        self
    }

    /// Adds a row that defers guard and action to this machine's behavior.
    pub fn on(self, source: S, event: E, target: S) -> Self {
        self.transition(Transition::new(source, event, target))
    }

    /// Adds an unguarded row taken when a sub-machine publishes `event`.
    pub fn on_completion(self, source: S, event: E, target: S) -> Self {
        self.transition(Transition::completion(source, event, target))
    }

    /// Sets the machine's own behavior (entry, exit, default guard and action).
    pub fn behavior(mut self, behavior: impl Behavior<S, E>) -> Self {
        self.behavior = Arc::new(behavior);
        self
    }

    /// Sets the default action of rows without one, keeping the rest of the behavior.
    ///
    /// Shorthand for a machine whose only custom behavior is its action.
    pub fn action(
        self,
        action: impl Fn(&Context<S, E>) -> Result<(), BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.behavior(crate::states::Hooks::new().action(action))
    }

    /// Validates the configuration and returns the composite state.
    pub fn build(self) -> Result<Arc<State<S, E>>, StateError> {
        let tag = self.tag;
        let initial = self
            .initial
            .ok_or_else(|| StateError::invalid(tag, "no initial state"))?;

        let mut states = HashMap::with_capacity(self.states.len());
        for state in self.states {
            let sub = state.tag();
            if states.insert(sub, state).is_some() {
                return Err(StateError::invalid(tag, format!("duplicate sub-state {sub:?}")));
            }
        }

        match states.get(&initial) {
            None => {
                return Err(StateError::invalid(
                    tag,
                    format!("initial state {initial:?} is not a sub-state"),
                ))
            }
            Some(state) if state.is_final() => {
                return Err(StateError::invalid(
                    tag,
                    format!("initial state {initial:?} is a final state"),
                ))
            }
            Some(_) => {}
        }

        if let Some(done) = self.final_state {
            match states.get(&done) {
                None => {
                    return Err(StateError::invalid(
                        tag,
                        format!("final state {done:?} is not a sub-state"),
                    ))
                }
                Some(state) if !state.is_final() => {
                    return Err(StateError::invalid(
                        tag,
                        format!("{done:?} is not built as a final state"),
                    ))
                }
                Some(_) => {}
            }
        } else if self.completion.is_some() {
            return Err(StateError::invalid(
                tag,
                "completion event declared without a final state",
            ));
        }

        let machine = Machine::new(
            initial,
            self.final_state,
            self.history,
            self.completion,
            self.entry,
            self.subscriptions,
            states,
            self.table,
        );
        Ok(State::composite(tag, machine, self.behavior))
    }
}

impl<S: StateTag, E: Event> std::fmt::Debug for MachineBuilder<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MachineBuilder")
            .field("tag", &self.tag)
            .field("initial", &self.initial)
            .field("final_state", &self.final_state)
            .field("states", &self.states.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(err: StateError) -> String {
        match err {
            StateError::InvalidMachine { reason, .. } => reason,
            other => panic!("unexpected error: {other}"),
        }
    }

    fn base() -> MachineBuilder<&'static str, u8> {
        Machine::builder("M")
            .state(State::simple("Idle"))
            .state(State::final_state("Done"))
    }

    #[test]
    fn test_valid_machine_builds() {
        let m = base()
            .initial("Idle")
            .final_state("Done")
            .completes_with(7)
            .history(true)
            .subscribe([1, 2])
            .on("Idle", 1, "Done")
            .build()
            .unwrap();

        let machine = m.as_machine().unwrap();
        assert_eq!(m.tag(), "M");
        assert_eq!(machine.initial(), "Idle");
        assert_eq!(machine.active(), "Idle");
        assert_eq!(machine.final_state(), Some("Done"));
        assert_eq!(machine.completion(), Some(7));
        assert!(machine.has_history());
        assert_eq!(machine.subscriptions(), &[1, 2]);
        assert_eq!(machine.table().len(), 1);
        assert_eq!(machine.sub_states().count(), 2);
    }

    #[test]
    fn test_missing_initial_is_rejected() {
        let err = base().build().unwrap_err();
        assert_eq!(reason(err), "no initial state");
    }

    #[test]
    fn test_initial_must_be_a_sub_state() {
        let err = base().initial("Nowhere").build().unwrap_err();
        assert_eq!(reason(err), "initial state \"Nowhere\" is not a sub-state");
    }

    #[test]
    fn test_initial_must_not_be_final() {
        let err = base().initial("Done").build().unwrap_err();
        assert_eq!(reason(err), "initial state \"Done\" is a final state");
    }

    #[test]
    fn test_final_must_be_built_final() {
        let err = base().initial("Idle").final_state("Idle").build().unwrap_err();
        assert_eq!(reason(err), "\"Idle\" is not built as a final state");
    }

    #[test]
    fn test_duplicate_sub_state_is_rejected() {
        let err = base()
            .initial("Idle")
            .state(State::simple("Idle"))
            .build()
            .unwrap_err();
        assert_eq!(reason(err), "duplicate sub-state \"Idle\"");
    }

    #[test]
    fn test_completion_requires_final_state() {
        let err = base().initial("Idle").completes_with(3).build().unwrap_err();
        assert_eq!(reason(err), "completion event declared without a final state");
    }

    #[test]
    fn test_entry_selector_applies_without_history() {
        let m = base()
            .state(State::simple("Other"))
            .initial("Idle")
            .entry_with(|_| "Other")
            .build()
            .unwrap();
        assert_eq!(m.as_machine().unwrap().entry_destination(), "Other");
    }
}
