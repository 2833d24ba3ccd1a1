//! # Runtime configuration.
//!
//! Provides [`Config`] centralized settings for a [`Runtime`](crate::Runtime)
//! and the hierarchy it drives.
//!
//! ## Sentinel values
//! - `grace = 0s` → `stop()` waits for the hierarchy to unwind without a deadline

use std::time::Duration;

use crate::events::UnknownEventPolicy;

/// Global configuration for one state hierarchy.
///
/// ## Field semantics
/// - `grace`: Maximum wait for the hierarchy to unwind on `stop()` (`0s` = no limit)
/// - `unknown_events`: How `publish` reports events that have no subscriber
/// - `drain_on_entry`: Whether a machine discards stale inbox events when entered
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for the root to unwind when stopping.
    ///
    /// When `stop()` is called:
    /// - The root activity is cancelled via its `CancellationToken`
    /// - The runtime waits up to `grace` for every nested state to exit
    /// - If the wait times out, returns `RuntimeError::GraceExceeded`
    pub grace: Duration,

    /// Reporting of events published with no subscriber.
    ///
    /// Publishing such an event is always a no-op; this only picks the log level.
    pub unknown_events: UnknownEventPolicy,

    /// Discard events queued in a machine's inbox while it was inactive.
    ///
    /// Machines stay subscribed while inactive, so without draining a
    /// re-entered machine would replay events published before its entry.
    pub drain_on_entry: bool,
}

impl Config {
    /// Returns the shutdown grace period as an `Option`.
    ///
    /// - `None` → wait until the hierarchy has unwound
    /// - `Some(d)` → give up after `d`
    #[inline]
    pub fn grace_limit(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 0s` (wait for the whole hierarchy to unwind)
    /// - `unknown_events = UnknownEventPolicy::Ignore`
    /// - `drain_on_entry = true`
    fn default() -> Self {
        Self {
            grace: Duration::ZERO,
            unknown_events: UnknownEventPolicy::default(),
            drain_on_entry: true,
        }
    }
}
