//! # statevisor
//!
//! **Statevisor** is a hierarchical state-machine (statechart) runtime for tokio.
//!
//! Composite states are *machines*: each one supervises its sub-states from
//! its own task, reads client events from a private inbox and walks a
//! transition table. Entering a composite state starts its supervising loop;
//! exiting it cancels the loop and waits until the whole subtree has unwound.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     publish(EV) ──► Bus ─ routes[EV] ─┬──► [inbox Root] ─┐
//!                                       ├──► [inbox A]    ─┼─┐
//!                                       └──► [inbox B]    ─┼─┼─┐
//!                                                          ▼ ▼ ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runtime                                                          │
//! │  - Context (Bus, ObserverSet, Config, root CancellationToken)     │
//! │  - ActiveStates (registry of entered states)                      │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        ▼ start(): spawn supervise(Root)
//!     ┌──────────────┐  transition_to  ┌──────────────┐
//!     │  Root loop   │ ──────────────► │   A loop     │  (child token)
//!     │ table[(s,e)] │                 │ table[(s,e)] │ ──► AA / AB / AF
//!     └──────────────┘                 └──────────────┘
//!            │ every enter / exit / transition
//!            ▼
//!     ObserverSet ──► ActiveStates, Journal, LogWriter, custom observers
//! ```
//!
//! ### Transition
//! ```text
//! event ──► table.select(active, event) ──► first row whose guard passes
//!   └─► current.exit()       cancel activity + wait (subtree unwound), on_exit, Exited
//!   └─► action(ctx)          row action, else the machine's Behavior::action
//!   └─► destination.enter()  drain inbox (machines), on_enter, Entered
//!   └─► start_activity()     supervising loop / Behavior::run (skipped for final states)
//!   └─► final reached?       publish completion event once, Completed
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                         |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Events**        | Fan client events out to every subscribed machine.            | [`Bus`], [`Inbox`], [`Event`]              |
//! | **States**        | Entry/exit behavior, guards, actions and do-activities.      | [`State`], [`Behavior`], [`Hooks`]         |
//! | **Machines**      | Composite states with history and completion events.          | [`Machine`], [`MachineBuilder`]            |
//! | **Transitions**   | Guarded rows and the exit / action / enter protocol.          | [`Transition`], [`transition_to`]          |
//! | **Observers**     | Watch the lifecycle; query the active-state registry.         | [`Observe`], [`ActiveStates`], [`Journal`] |
//! | **Runtime**       | Start, publish, stop within a grace period.                   | [`Runtime`], [`RuntimeBuilder`], [`Config`]|
//! | **Errors**        | Typed errors with stable labels.                              | [`StateError`], [`RuntimeError`]           |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] observer backed by `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use statevisor::{Config, Machine, Observe, Runtime, State};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Light { Root, Off, On, Dim, Bright }
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Switch { Toggle, Turn }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let on = Machine::builder(Light::On)
//!         .initial(Light::Dim)
//!         .history(true)
//!         .state(State::simple(Light::Dim))
//!         .state(State::simple(Light::Bright))
//!         .on(Light::Dim, Switch::Turn, Light::Bright)
//!         .on(Light::Bright, Switch::Turn, Light::Dim)
//!         .subscribe([Switch::Turn])
//!         .build()?;
//!
//!     let root = Machine::builder(Light::Root)
//!         .initial(Light::Off)
//!         .state(State::simple(Light::Off))
//!         .state(on)
//!         .on(Light::Off, Switch::Toggle, Light::On)
//!         .on(Light::On, Switch::Toggle, Light::Off)
//!         .subscribe([Switch::Toggle])
//!         .build()?;
//!
//!     #[cfg(feature = "logging")]
//!     let observers: Vec<Arc<dyn Observe<Light>>> = vec![Arc::new(statevisor::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let observers: Vec<Arc<dyn Observe<Light>>> = Vec::new();
//!
//!     let runtime = Runtime::builder(Config::default())
//!         .with_observers(observers)
//!         .build(root)?;
//!
//!     runtime.start()?;
//!     runtime.publish(Switch::Toggle);
//!     runtime.stop().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod machine;
mod observers;
mod states;

// ---- Public re-exports ----

pub use core::{Config, Runtime, RuntimeBuilder};
pub use error::{BoxError, RuntimeError, StateError};
pub use events::{Bus, Event, Inbox, InboxId, UnknownEventPolicy};
pub use machine::{
    transition_to, Action, ActionFn, EntrySelector, Guard, Machine, MachineBuilder, Transition,
    TransitionTable,
};
pub use observers::{ActiveStates, Journal, Lifecycle, LifecycleKind, Observe, ObserverSet};
pub use states::{Behavior, Context, Hooks, Inert, State, StateTag};

// Optional: expose a simple built-in logger observer.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::LogWriter;
