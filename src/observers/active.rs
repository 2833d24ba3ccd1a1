//! # Active-state registry.
//!
//! [`ActiveStates`] maintains the set of states whose entry has completed and
//! whose exit has not. It is updated from [`LifecycleKind::Entered`] and
//! [`LifecycleKind::Exited`] records and is meant for introspection and tests;
//! the engine never consults it for control decisions.
//!
//! ## Architecture
//! ```text
//! State::enter() ──► Entered ──┐
//!                              ├──► ObserverSet ──► ActiveStates (HashSet<S>)
//! State::exit()  ──► Exited  ──┘                         │
//!                                                   snapshot()
//!                                                        ▼
//!                                            tests / Runtime::stop (stuck states)
//! ```
//!
//! ## Rules
//! - Updates are synchronous, so a snapshot taken between two suspension
//!   points is always self-consistent.
//! - Other record kinds are ignored.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};

use super::lifecycle::{Lifecycle, LifecycleKind};
use super::observer::Observe;

/// Thread-safe registry of currently entered states.
pub struct ActiveStates<S> {
    active: RwLock<HashSet<S>>,
}

impl<S> ActiveStates<S>
where
    S: Copy + Eq + Hash + Debug,
{
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            active: RwLock::new(HashSet::new()),
        }
    }

    /// Returns a copy of the current registry.
    pub fn snapshot(&self) -> HashSet<S> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns sorted debug names of the active states.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|s| format!("{s:?}"))
            .collect();
        names.sort_unstable();
        names
    }

    /// Returns `true` if `state` is currently entered.
    pub fn contains(&self, state: &S) -> bool {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(state)
    }

    pub fn len(&self) -> usize {
        self.active.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S> Default for ActiveStates<S>
where
    S: Copy + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Observe<S> for ActiveStates<S>
where
    S: Copy + Eq + Hash + Debug + Send + Sync + 'static,
{
    fn on_lifecycle(&self, record: &Lifecycle<S>) {
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        match record.kind {
            LifecycleKind::Entered => {
                active.insert(record.state);
            }
            LifecycleKind::Exited => {
                active.remove(&record.state);
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "active-states"
    }
}
