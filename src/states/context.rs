//! # Cancellation context passed down the hierarchy.
//!
//! A [`Context`] travels with every `enter` / `exit` / activity call. It
//! bundles the hierarchy's [`Bus`], its [`ObserverSet`], the runtime
//! [`Config`] and a [`CancellationToken`].
//!
//! ## Rules
//! - Every activity runs with a **child token** of the context that started
//!   it, so cancelling a machine reaches its whole subtree.
//! - Observers are notified synchronously through [`Context::notify`].

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::Config;
use crate::events::{Bus, Event};
use crate::observers::{Lifecycle, ObserverSet};
use crate::states::StateTag;

/// Shared handles for one state hierarchy plus the current cancellation scope.
pub struct Context<S, E> {
    bus: Bus<E>,
    observers: Arc<ObserverSet<S>>,
    cfg: Arc<Config>,
    token: CancellationToken,
}

impl<S: StateTag, E: Event> Context<S, E> {
    /// Creates a root context with a fresh cancellation token.
    pub fn new(bus: Bus<E>, observers: Arc<ObserverSet<S>>, cfg: Config) -> Self {
        Self {
            bus,
            observers,
            cfg: Arc::new(cfg),
            token: CancellationToken::new(),
        }
    }

    /// Returns the hierarchy's event bus.
    #[inline]
    pub fn bus(&self) -> &Bus<E> {
        &self.bus
    }

    /// Publishes `event` on the hierarchy's bus.
    #[inline]
    pub fn publish(&self, event: E) -> usize {
        self.bus.publish(event)
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Returns the cancellation token of the current scope.
    #[inline]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the current scope is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Hands `record` to every observer.
    pub fn notify(&self, record: Lifecycle<S>) {
        self.observers.emit(&record);
    }

    /// Derives a nested scope whose token is cancelled with this one.
    pub(crate) fn child(&self) -> Self {
        Self {
            bus: self.bus.clone(),
            observers: Arc::clone(&self.observers),
            cfg: Arc::clone(&self.cfg),
            token: self.token.child_token(),
        }
    }
}

impl<S, E> Clone for Context<S, E> {
    fn clone(&self) -> Self {
        Self {
            bus: self.bus.clone(),
            observers: Arc::clone(&self.observers),
            cfg: Arc::clone(&self.cfg),
            token: self.token.clone(),
        }
    }
}

impl<S, E> std::fmt::Debug for Context<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("cfg", &self.cfg)
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_scope_follows_parent_cancellation() {
        let ctx: Context<u8, u8> =
            Context::new(Bus::default(), Arc::new(ObserverSet::default()), Config::default());
        let child = ctx.child();
        let sibling = ctx.child();

        child.token().cancel();
        assert!(child.is_cancelled());
        assert!(!ctx.is_cancelled());
        assert!(!sibling.is_cancelled());

        ctx.token().cancel();
        assert!(sibling.is_cancelled());
    }
}
