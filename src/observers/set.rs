//! # Synchronous lifecycle fan-out.
//!
//! Provides [`ObserverSet`], which hands each [`Lifecycle`] record to every
//! registered [`Observe`] implementation in registration order.
//!
//! ## Rules
//! - **Synchronous**: `emit()` returns after every observer has seen the record.
//! - **Isolation**: a panicking observer is caught with `catch_unwind` and
//!   logged; the remaining observers still receive the record.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state
//! inconsistent if an observer panics while holding a lock.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::lifecycle::Lifecycle;
use super::observer::Observe;

/// Fan-out coordinator for lifecycle observers.
pub struct ObserverSet<S> {
    observers: Vec<Arc<dyn Observe<S>>>,
}

impl<S: 'static> ObserverSet<S> {
    /// Creates a set from the given observers.
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn Observe<S>>>) -> Self {
        Self { observers }
    }

    /// Delivers `record` to every observer.
    pub fn emit(&self, record: &Lifecycle<S>) {
        for observer in &self.observers {
            let delivered =
                panic::catch_unwind(AssertUnwindSafe(|| observer.on_lifecycle(record)));

            if let Err(panic_err) = delivered {
                let info = if let Some(msg) = panic_err.downcast_ref::<&'static str>() {
                    (*msg).to_string()
                } else if let Some(msg) = panic_err.downcast_ref::<String>() {
                    msg.clone()
                } else {
                    "unknown panic".to_string()
                };
                tracing::error!(observer = observer.name(), %info, "observer panicked");
            }
        }
    }

    /// Returns the number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Returns `true` if no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl<S: 'static> Default for ObserverSet<S> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observers::{Journal, LifecycleKind};

    struct Explodes;

    impl Observe<u8> for Explodes {
        fn on_lifecycle(&self, _record: &Lifecycle<u8>) {
            panic!("observer failure");
        }

        fn name(&self) -> &'static str {
            "explodes"
        }
    }

    #[test]
    fn test_panicking_observer_does_not_starve_others() {
        let journal = Arc::new(Journal::<u8>::new());
        let observers: Vec<Arc<dyn Observe<u8>>> = vec![Arc::new(Explodes), journal.clone()];
        let set = ObserverSet::new(observers);

        set.emit(&Lifecycle::new(LifecycleKind::Entered, 1u8));

        assert_eq!(set.len(), 2);
        assert_eq!(journal.len(), 1);
    }
}
