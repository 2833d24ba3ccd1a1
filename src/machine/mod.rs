//! Composite states: configuration, transition table and supervising loop.
//!
//! ## Contents
//! - [`MachineBuilder`] collects and validates a machine's configuration
//! - [`Machine`] fixed configuration plus the `active` / `history` cursor
//! - [`TransitionTable`] and [`Transition`] rows keyed by `(source, event)`
//! - [`transition_to`] the exit / action / enter / start protocol
//!
//! The supervising loop that feeds inbox events into the table is an
//! internal detail started by [`State::start_activity`](crate::State::start_activity).

mod builder;
mod composite;
mod manage;
mod table;
mod transition;

pub use builder::MachineBuilder;
pub use composite::{EntrySelector, Machine};
pub use table::{Action, ActionFn, Guard, Transition, TransitionTable};
pub use transition::transition_to;

pub(crate) use manage::supervise;
