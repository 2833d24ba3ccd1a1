//! # Lifecycle observer trait.
//!
//! Provides [`Observe`], the extension point for watching a hierarchy enter,
//! exit and transition. The engine passes every [`Lifecycle`] record through
//! the [`ObserverSet`](crate::ObserverSet) carried by the
//! [`Context`](crate::Context), so several independent hierarchies can run
//! side by side with their own observers.
//!
//! ## Rules
//! - Called **synchronously** at the lifecycle point, from the task that
//!   performs the step; keep it short and never block.
//! - Records for one hierarchy arrive in engine order (see `Lifecycle::seq`).
//! - Panics are caught and logged; other observers still see the record.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use statevisor::{Lifecycle, LifecycleKind, Observe};
//!
//! #[derive(Default)]
//! struct EntryCounter(AtomicUsize);
//!
//! impl<S> Observe<S> for EntryCounter {
//!     fn on_lifecycle(&self, rec: &Lifecycle<S>) {
//!         if rec.kind == LifecycleKind::Entered {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "entry-counter" }
//! }
//! ```

use super::lifecycle::Lifecycle;

/// Observer of state lifecycle records.
pub trait Observe<S>: Send + Sync + 'static {
    /// Processes a single record.
    fn on_lifecycle(&self, record: &Lifecycle<S>);

    /// Returns the observer name used in logs.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
