//! # LogWriter: lifecycle printer
//!
//! A minimal observer that forwards every [`Lifecycle`] record to `tracing`.
//! Use it for demos or while debugging a transition table.
//!
//! ## Example output
//! ```text
//! DEBUG statevisor: [entered] state=AA
//! DEBUG statevisor: [transitioned] machine=A from=None to=AA
//! DEBUG statevisor: [exited] state=AA
//! INFO  statevisor: [completed] machine=A final=AF
//! ERROR statevisor: [faulted] state=B reason="action BA -> BB failed: boom"
//! ```

use std::fmt::Debug;

use super::lifecycle::{Lifecycle, LifecycleKind};
use super::observer::Observe;

/// Lifecycle writer observer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<S> Observe<S> for LogWriter
where
    S: Debug + Send + Sync + 'static,
{
    fn on_lifecycle(&self, e: &Lifecycle<S>) {
        match e.kind {
            LifecycleKind::Entered => {
                tracing::debug!(seq = e.seq, "[entered] state={:?}", e.state);
            }
            LifecycleKind::Exited => {
                tracing::debug!(seq = e.seq, "[exited] state={:?}", e.state);
            }
            LifecycleKind::Transitioned => {
                tracing::debug!(
                    seq = e.seq,
                    "[transitioned] machine={:?} from={:?} to={:?}",
                    e.state,
                    e.from,
                    e.target
                );
            }
            LifecycleKind::HistoryRecorded => {
                tracing::debug!(seq = e.seq, "[history] machine={:?} resume={:?}", e.state, e.target);
            }
            LifecycleKind::Completed => {
                tracing::info!(seq = e.seq, "[completed] machine={:?} final={:?}", e.state, e.target);
            }
            LifecycleKind::Faulted => {
                tracing::error!(
                    seq = e.seq,
                    "[faulted] state={:?} reason={:?}",
                    e.state,
                    e.reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
