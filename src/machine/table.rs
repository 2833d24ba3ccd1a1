//! # Transition table of one machine.
//!
//! Rows are keyed by `(source, event)`; several rows may share a key and are
//! evaluated in insertion order. The first row whose guard passes is taken.
//!
//! ## Rules
//! - A row without its own guard defers to the owning machine's
//!   [`Behavior::guard`](crate::Behavior::guard).
//! - A row without its own action runs the owning machine's
//!   [`Behavior::action`](crate::Behavior::action).
//! - Completion rows (triggered by a sub-machine's completion event) are
//!   never guarded.
//! - Rows are not validated: an unknown target surfaces as
//!   [`StateError::UnknownState`](crate::StateError::UnknownState) when taken.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::BoxError;
use crate::events::Event;
use crate::states::{Context, StateTag};

/// Guard predicate of a single row.
pub type Guard = Arc<dyn Fn() -> bool + Send + Sync>;

/// Unsized action callable, as run by the transition protocol.
///
/// `'a` bounds what the callable may borrow; rows store `'static` actions.
pub type ActionFn<'a, S, E> = dyn Fn(&Context<S, E>) -> Result<(), BoxError> + Send + Sync + 'a;

/// Shared action of a single row.
pub type Action<S, E> = Arc<ActionFn<'static, S, E>>;

/// One row: `source --event [guard] / action--> target`.
///
/// # Example
/// ```
/// use statevisor::Transition;
///
/// let row = Transition::<&'static str, u8>::new("Idle", 1, "Busy")
///     .with_guard(|| true)
///     .with_action(|_ctx| Ok(()));
/// assert_eq!(row.target(), "Busy");
/// assert!(!row.is_completion());
/// ```
pub struct Transition<S, E> {
    source: S,
    event: E,
    target: S,
    guard: Option<Guard>,
    action: Option<Action<S, E>>,
    completion: bool,
}

impl<S: StateTag, E: Event> Transition<S, E> {
    /// Creates a row that defers guard and action to the owning machine.
    pub fn new(source: S, event: E, target: S) -> Self {
        Self {
            source,
            event,
            target,
            guard: None,
            action: None,
            completion: false,
        }
    }

    /// Creates an unguarded row triggered by a sub-machine's completion event.
    pub fn completion(source: S, event: E, target: S) -> Self {
        Self {
            completion: true,
            ..Self::new(source, event, target)
        }
    }

    pub fn with_guard(mut self, guard: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.guard = Some(Arc::new(guard));
        self
    }

    pub fn with_action(
        mut self,
        action: impl Fn(&Context<S, E>) -> Result<(), BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.action = Some(Arc::new(action));
        self
    }

    #[inline]
    pub fn source(&self) -> S {
        self.source
    }

    #[inline]
    pub fn event(&self) -> E {
        self.event
    }

    #[inline]
    pub fn target(&self) -> S {
        self.target
    }

    #[inline]
    pub fn is_completion(&self) -> bool {
        self.completion
    }

    /// Evaluates the row's guard, or `fallback` when the row has none.
    pub fn permits(&self, fallback: impl FnOnce() -> bool) -> bool {
        if self.completion {
            return true;
        }
        match &self.guard {
            Some(guard) => guard(),
            None => fallback(),
        }
    }

    pub(crate) fn action_ref(&self) -> Option<&ActionFn<'static, S, E>> {
        self.action.as_deref()
    }
}

impl<S: std::fmt::Debug, E: std::fmt::Debug> std::fmt::Debug for Transition<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("source", &self.source)
            .field("event", &self.event)
            .field("target", &self.target)
            .field("guarded", &self.guard.is_some())
            .field("completion", &self.completion)
            .finish()
    }
}

/// Rows of one machine keyed by `(source, event)`.
pub struct TransitionTable<S, E> {
    rows: HashMap<(S, E), Vec<Transition<S, E>>>,
}

impl<S: StateTag, E: Event> TransitionTable<S, E> {
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }

    /// Appends a row after the rows already registered for its key.
    pub fn insert(&mut self, row: Transition<S, E>) {
        self.rows
            .entry((row.source, row.event))
            .or_default()
            .push(row);
    }

    /// Returns the first row for `(source, event)` whose guard passes.
    ///
    /// `fallback` is the guard used by rows without one of their own; it is
    /// evaluated at most once per unguarded row.
    pub fn select(&self, source: S, event: E, fallback: impl Fn() -> bool) -> Option<&Transition<S, E>> {
        self.rows
            .get(&(source, event))?
            .iter()
            .find(|row| row.permits(&fallback))
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<S: StateTag, E: Event> Default for TransitionTable<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E> std::fmt::Debug for TransitionTable<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionTable")
            .field("keys", &self.rows.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_first_passing_row_wins() {
        let mut table = TransitionTable::<&'static str, u8>::new();
        table.insert(Transition::new("Idle", 1, "Left").with_guard(|| false));
        table.insert(Transition::new("Idle", 1, "Right"));
        table.insert(Transition::new("Idle", 1, "Never"));

        let row = table.select("Idle", 1, || true).unwrap();
        assert_eq!(row.target(), "Right");
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_unguarded_rows_use_fallback() {
        let mut table = TransitionTable::<&'static str, u8>::new();
        table.insert(Transition::new("Idle", 1, "Busy"));

        assert!(table.select("Idle", 1, || false).is_none());
        assert!(table.select("Idle", 1, || true).is_some());
    }

    #[test]
    fn test_completion_rows_ignore_guards() {
        let mut table = TransitionTable::<&'static str, u8>::new();
        table.insert(Transition::completion("Working", 9, "Done").with_guard(|| false));

        let row = table.select("Working", 9, || false).unwrap();
        assert!(row.is_completion());
        assert_eq!(row.target(), "Done");
    }

    #[test]
    fn test_unknown_key_selects_nothing() {
        let mut table = TransitionTable::<&'static str, u8>::new();
        table.insert(Transition::new("Idle", 1, "Busy"));

        assert!(table.select("Idle", 2, || true).is_none());
        assert!(table.select("Busy", 1, || true).is_none());
    }

    #[test]
    fn test_row_guard_is_live() {
        let open = Arc::new(AtomicBool::new(false));
        let flag = open.clone();
        let row = Transition::<&'static str, u8>::new("Closed", 0, "Open")
            .with_guard(move || flag.load(Ordering::SeqCst));

        assert!(!row.permits(|| true));
        open.store(true, Ordering::SeqCst);
        assert!(row.permits(|| false));
    }
}
