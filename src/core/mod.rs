//! Runtime core: configuration, construction and lifecycle of a hierarchy.
//!
//! The public API from this module is [`Runtime`] (built with
//! [`RuntimeBuilder`]) and its [`Config`].
//!
//! Internal modules:
//! - `builder`: validates the root, creates the bus and wires subscriptions;
//! - `runtime`: starts the root's supervising loop and stops it within the grace period;
//! - `shutdown`: cross-platform shutdown signal handling.

mod builder;
mod config;
mod runtime;
mod shutdown;

pub use builder::RuntimeBuilder;
pub use config::Config;
pub use runtime::Runtime;
