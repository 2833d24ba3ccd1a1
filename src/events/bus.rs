//! # Event bus for fanning client events out to machine inboxes.
//!
//! [`Bus`] maps each event identifier to the set of [`Inbox`]es that asked
//! to receive it. Publishing is decoupled from the hierarchy: an event reaches
//! every subscribed machine, wherever it sits and whether or not it is active.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                         Subscribers (one inbox per machine):
//!   driver        ──┐                     ┌──► [inbox Root] ──► Root loop
//!   final state   ──┼──► Bus ─ routes[e] ─┼──► [inbox A]    ──► A loop
//!   entry hooks   ──┘                     └──► [inbox B]    ──► B loop
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: delivery uses unbounded channels; a slow
//!   consumer never blocks the publisher (and never applies backpressure).
//! - **Idempotent subscription** per (event, inbox) pair; no unsubscribe.
//! - **Unknown events**: `publish` of an event nobody subscribed to is a
//!   no-op (logged per [`UnknownEventPolicy`]); `try_publish` reports it.
//! - **Injectable**: one bus per hierarchy; no process-wide registry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;

use super::event::Event;
use super::inbox::{Inbox, InboxId};
use crate::error::StateError;

/// How [`Bus::publish`] reports events that have no subscriber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownEventPolicy {
    /// Drop silently (trace-level log only).
    #[default]
    Ignore,
    /// Drop and emit a `warn` log; useful to catch typos in transition tables.
    Warn,
}

struct Route<E> {
    inbox: InboxId,
    tx: mpsc::UnboundedSender<E>,
}

/// Subscriber registry and publisher for client events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`).
/// - **Unordered fan-out**: no ordering is defined across subscribers.
pub struct Bus<E> {
    routes: Arc<RwLock<HashMap<E, Vec<Route<E>>>>>,
    unknown: UnknownEventPolicy,
}

impl<E: Event> Bus<E> {
    /// Creates an empty bus.
    pub fn new(unknown: UnknownEventPolicy) -> Self {
        Self {
            routes: Arc::new(RwLock::new(HashMap::new())),
            unknown,
        }
    }

    /// Registers `inbox` to receive every event in `events`.
    ///
    /// Subscribing the same inbox to the same event twice has no extra effect.
    pub fn subscribe_to(&self, events: impl IntoIterator<Item = E>, inbox: &Inbox<E>) {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        for event in events {
            let entry = routes.entry(event).or_default();
            if entry.iter().any(|r| r.inbox == inbox.id()) {
                continue;
            }
            entry.push(Route {
                inbox: inbox.id(),
                tx: inbox.sender(),
            });
        }
    }

    /// Delivers `event` to every subscribed inbox and returns how many it reached.
    ///
    /// An event with no subscriber is dropped and `0` is returned.
    pub fn publish(&self, event: E) -> usize {
        let delivered = {
            let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
            routes
                .get(&event)
                .map(|targets| targets.iter().filter(|r| r.tx.send(event).is_ok()).count())
        };

        match delivered {
            Some(delivered) => {
                tracing::trace!(?event, delivered, "event published");
                delivered
            }
            None => {
                self.report_unknown(event);
                0
            }
        }
    }

    /// Like [`publish`](Self::publish), but fails with
    /// [`StateError::UnknownEvent`] when nobody ever subscribed to `event`.
    pub fn try_publish(&self, event: E) -> Result<usize, StateError> {
        if self.subscribers(event) == 0 {
            return Err(StateError::UnknownEvent {
                event: format!("{event:?}"),
            });
        }
        Ok(self.publish(event))
    }

    /// Returns the number of inboxes subscribed to `event`.
    pub fn subscribers(&self, event: E) -> usize {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event)
            .map_or(0, Vec::len)
    }

    fn report_unknown(&self, event: E) {
        match self.unknown {
            UnknownEventPolicy::Ignore => {
                tracing::trace!(?event, "event has no subscriber; dropped");
            }
            UnknownEventPolicy::Warn => {
                tracing::warn!(?event, "event has no subscriber; dropped");
            }
        }
    }
}

impl<E: Event> Default for Bus<E> {
    fn default() -> Self {
        Self::new(UnknownEventPolicy::default())
    }
}

impl<E> Clone for Bus<E> {
    fn clone(&self) -> Self {
        Self {
            routes: Arc::clone(&self.routes),
            unknown: self.unknown,
        }
    }
}

impl<E> std::fmt::Debug for Bus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("unknown", &self.unknown)
            .finish_non_exhaustive()
    }
}
