//! # Event identifiers.
//!
//! An event is an opaque, equality-comparable token with no payload; its
//! identity is the only information it carries. Any `Copy` enum with the usual
//! derives qualifies through the blanket implementation.
//!
//! ## Example
//! ```rust
//! use statevisor::Event;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Signal {
//!     Start,
//!     Stop,
//! }
//!
//! fn accepts<E: Event>(_: E) {}
//! accepts(Signal::Start);
//! ```

use std::fmt::Debug;
use std::hash::Hash;

/// Marker trait for event identifiers delivered through the [`Bus`](crate::Bus).
pub trait Event: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Event for T where T: Copy + Eq + Hash + Debug + Send + Sync + 'static {}
