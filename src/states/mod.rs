//! States: identities, behaviors and the lifecycle of one hierarchy node.
//!
//! ## Contents
//! - [`StateTag`] marker trait for state identities
//! - [`Behavior`] entry/exit/guard/action/do-activity capability set
//!   ([`Inert`] and [`Hooks`] are ready-made implementations)
//! - [`State`] the hierarchy node with `enter` / `start_activity` / `exit`
//! - [`Context`] the cancellation scope handed down the hierarchy
//!
//! ```text
//! State ──enter()──► [active] ──start_activity()──► Activity (task + token)
//!   ▲                                                   │
//!   └────────────── exit(): cancel + wait ◄─────────────┘
//! ```

mod activity;
mod behavior;
mod context;
mod state;
mod tag;

pub use behavior::{Behavior, Hooks, Inert};
pub use context::Context;
pub use state::State;
pub use tag::StateTag;
