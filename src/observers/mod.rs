//! # Lifecycle observers for the statevisor engine.
//!
//! This module provides the [`Observe`] trait and built-in implementations
//! for watching states enter, exit and transition.
//!
//! ## Architecture
//! ```text
//! Record flow:
//!   State::enter / State::exit / Machine transitions
//!        │
//!        └──► Context::notify(Lifecycle) ──► ObserverSet::emit(&Lifecycle)
//!                                                  │
//!                           ┌──────────────┬───────┴──────┬──────────────┐
//!                           ▼              ▼              ▼              ▼
//!                      ActiveStates     Journal       LogWriter       Custom
//! ```
//!
//! ## Observer types
//! - **Stateful observers** - maintain state derived from records (`ActiveStates`, `Journal`)
//! - **Passive observers** - react to records (logging, metrics)

mod active;
mod journal;
mod lifecycle;
#[cfg(feature = "logging")]
mod log;
mod observer;
mod set;

pub use active::ActiveStates;
pub use journal::Journal;
pub use lifecycle::{Lifecycle, LifecycleKind};
#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use observer::Observe;
pub use set::ObserverSet;
