//! Client events: identifiers, private inboxes and the fan-out bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! deliver events to every machine that subscribed to them, regardless of
//! where that machine sits in the hierarchy.
//!
//! ## Contents
//! - [`Event`] marker trait for event identifiers
//! - [`Inbox`] unbounded FIFO queue owned by one machine
//! - [`Bus`] subscriber map with `subscribe_to` / `publish`
//!
//! ## Quick reference
//! - **Publishers**: client drivers, entry/exit behaviors, machines entering
//!   their final state (completion events).
//! - **Consumers**: every machine's supervising loop, reading its own inbox.

mod bus;
mod event;
mod inbox;

pub use bus::{Bus, UnknownEventPolicy};
pub use event::Event;
pub use inbox::{Inbox, InboxId};

pub(crate) use inbox::InboxLease;
