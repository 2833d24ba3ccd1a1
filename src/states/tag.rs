//! # State identities.
//!
//! Each hierarchy names its states with one tag type, usually a field-less
//! enum with one variant per concrete state. Tags key the transition tables
//! and the active-state registry.

use std::fmt::Debug;
use std::hash::Hash;

/// Marker trait for state identities.
///
/// # Example
/// ```rust
/// use statevisor::StateTag;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Door {
///     Closed,
///     Open,
/// }
///
/// fn accepts<S: StateTag>(_: S) {}
/// accepts(Door::Open);
/// ```
pub trait StateTag: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> StateTag for T where T: Copy + Eq + Hash + Debug + Send + Sync + 'static {}
