//! # In-memory lifecycle journal.
//!
//! [`Journal`] keeps every record it observes, in arrival order. Useful for
//! asserting ordering properties (for example that a whole branch exits
//! before the next one is entered).

use std::sync::{Mutex, PoisonError};

use super::lifecycle::{Lifecycle, LifecycleKind};
use super::observer::Observe;

/// Observer that records every lifecycle record.
pub struct Journal<S> {
    records: Mutex<Vec<Lifecycle<S>>>,
}

impl<S: Clone> Journal<S> {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of every record seen so far.
    pub fn records(&self) -> Vec<Lifecycle<S>> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns `(kind, state)` pairs for the given kinds, in arrival order.
    pub fn steps(&self, kinds: &[LifecycleKind]) -> Vec<(LifecycleKind, S)> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| kinds.contains(&r.kind))
            .map(|r| (r.kind, r.state.clone()))
            .collect()
    }

    /// Forgets every record.
    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Clone> Default for Journal<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Observe<S> for Journal<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn on_lifecycle(&self, record: &Lifecycle<S>) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }

    fn name(&self) -> &'static str {
        "journal"
    }
}
