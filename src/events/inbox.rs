//! # Per-machine event inbox.
//!
//! Every machine owns one [`Inbox`]: an unbounded FIFO queue filled by the
//! [`Bus`](crate::Bus) and read only by that machine's supervising loop.
//!
//! ## Rules
//! - **Unbounded**: insertion never blocks, a backlog can grow without bound.
//! - **FIFO** per publisher call; no ordering across different inboxes.
//! - **Leased**: the supervising loop takes the receiving end for the whole
//!   activation and hands it back when it returns (even on panic).
//! - **Identity**: each inbox carries a process-unique [`InboxId`] so that
//!   repeated subscriptions are de-duplicated.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;

use super::event::Event;

/// Global counter for inbox identities.
static INBOX_SEQ: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of an [`Inbox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InboxId(u64);

/// Unbounded event queue private to one machine.
pub struct Inbox<E> {
    id: InboxId,
    tx: mpsc::UnboundedSender<E>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<E>>>,
}

impl<E: Event> Inbox<E> {
    /// Creates an empty inbox with a fresh identity.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            id: InboxId(INBOX_SEQ.fetch_add(1, AtomicOrdering::Relaxed)),
            tx,
            rx: Mutex::new(Some(rx)),
        }
    }

    /// Returns the identity used to de-duplicate subscriptions.
    #[inline]
    pub fn id(&self) -> InboxId {
        self.id
    }

    /// Returns `true` while a supervising loop holds the receiving end.
    pub fn is_leased(&self) -> bool {
        self.rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Discards every pending event and returns how many were dropped.
    ///
    /// Does nothing while the inbox is leased.
    pub fn drain(&self) -> usize {
        let mut slot = self.rx.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(rx) = slot.as_mut() else {
            return 0;
        };
        let mut dropped = 0;
        while rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }

    pub(crate) fn sender(&self) -> mpsc::UnboundedSender<E> {
        self.tx.clone()
    }

    /// Takes the receiving end until the returned lease is dropped.
    pub(crate) fn lease(&self) -> Option<InboxLease<'_, E>> {
        let rx = self
            .rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        Some(InboxLease {
            inbox: self,
            rx: Some(rx),
        })
    }
}

impl<E: Event> Default for Inbox<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Inbox<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inbox").field("id", &self.id).finish()
    }
}

/// Exclusive read access to an [`Inbox`], returned on drop.
pub(crate) struct InboxLease<'a, E> {
    inbox: &'a Inbox<E>,
    rx: Option<mpsc::UnboundedReceiver<E>>,
}

impl<E> InboxLease<'_, E> {
    /// Waits for the next event.
    ///
    /// Returns `None` only if every sender is gone, which cannot happen while
    /// the inbox itself is alive.
    pub(crate) async fn recv(&mut self) -> Option<E> {
        match self.rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }
}

impl<E> Drop for InboxLease<'_, E> {
    fn drop(&mut self) {
        if let Some(rx) = self.rx.take() {
            *self.inbox.rx.lock().unwrap_or_else(PoisonError::into_inner) = Some(rx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a: Inbox<u8> = Inbox::new();
        let b: Inbox<u8> = Inbox::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_drain_discards_pending_events() {
        let inbox: Inbox<u8> = Inbox::new();
        let tx = inbox.sender();
        tx.send(1).unwrap();
        tx.send(2).unwrap();

        assert_eq!(inbox.drain(), 2);
        assert_eq!(inbox.drain(), 0);
    }

    #[tokio::test]
    async fn test_lease_is_exclusive_and_returned_on_drop() {
        let inbox: Inbox<u8> = Inbox::new();
        inbox.sender().send(7).unwrap();

        {
            let mut lease = inbox.lease().expect("first lease");
            assert!(inbox.is_leased());
            assert!(inbox.lease().is_none());
            assert_eq!(inbox.drain(), 0);
            assert_eq!(lease.recv().await, Some(7));
        }

        assert!(!inbox.is_leased());
        assert!(inbox.lease().is_some());
    }
}
