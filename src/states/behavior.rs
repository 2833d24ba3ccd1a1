//! # State behavior: the capability set of a concrete state.
//!
//! This module defines the [`Behavior`] trait (entry, exit, guard, action and
//! an async, cancelable do-activity) and two ready-made implementations:
//! [`Inert`] (all defaults) and the closure-backed [`Hooks`].
//!
//! A do-activity receives a [`Context`] and should return once
//! [`Context::cancelled`] completes so that exiting its state is prompt.

use async_trait::async_trait;

use crate::error::BoxError;
use crate::events::Event;
use crate::states::{Context, StateTag};

/// # Entry/exit behavior, guard, action and do-activity of a state.
///
/// Every method has a default, so a plain leaf state can use [`Inert`].
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use statevisor::{Behavior, Context};
///
/// #[derive(Default)]
/// struct CountEntries(AtomicUsize);
///
/// impl Behavior<&'static str, u8> for CountEntries {
///     fn on_enter(&self, _ctx: &Context<&'static str, u8>) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
#[async_trait]
pub trait Behavior<S: StateTag, E: Event>: Send + Sync + 'static {
    /// Entry behavior; runs before the state is registered as active.
    fn on_enter(&self, _ctx: &Context<S, E>) {}

    /// Exit behavior; runs after the do-activity has fully unwound.
    fn on_exit(&self, _ctx: &Context<S, E>) {}

    /// Guard consulted by rows of this machine's table that carry no guard of their own.
    fn guard(&self) -> bool {
        true
    }

    /// Action run by rows of this machine's table that carry no action of their own.
    fn action(&self, _ctx: &Context<S, E>) -> Result<(), BoxError> {
        Ok(())
    }

    /// Do-activity of a simple state, run while the state is active.
    ///
    /// Defaults to parking until the state is exited.
    async fn run(&self, ctx: Context<S, E>) -> Result<(), BoxError> {
        ctx.cancelled().await;
        Ok(())
    }
}

/// Behavior that keeps every default.
#[derive(Debug, Default, Clone, Copy)]
pub struct Inert;

impl<S: StateTag, E: Event> Behavior<S, E> for Inert {}

type HookFn<S, E> = Box<dyn Fn(&Context<S, E>) + Send + Sync>;
type GuardFn = Box<dyn Fn() -> bool + Send + Sync>;
type ActionHook<S, E> = Box<dyn Fn(&Context<S, E>) -> Result<(), BoxError> + Send + Sync>;

/// Closure-backed behavior.
///
/// Shared state between hooks (and with the rest of the hierarchy) is passed
/// in explicitly, typically as an `Arc<...>` captured by the closures.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use statevisor::{Hooks, State};
///
/// let entries = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&entries);
/// let idle = State::<&'static str, u8>::simple_with(
///     "Idle",
///     Hooks::new().on_enter(move |_ctx| {
///         counter.fetch_add(1, Ordering::Relaxed);
///     }),
/// );
/// assert_eq!(idle.tag(), "Idle");
/// ```
pub struct Hooks<S, E> {
    enter: Option<HookFn<S, E>>,
    exit: Option<HookFn<S, E>>,
    guard: Option<GuardFn>,
    action: Option<ActionHook<S, E>>,
}

impl<S: StateTag, E: Event> Hooks<S, E> {
    /// Creates hooks that do nothing.
    pub fn new() -> Self {
        Self {
            enter: None,
            exit: None,
            guard: None,
            action: None,
        }
    }

    /// Sets the entry behavior.
    pub fn on_enter(mut self, f: impl Fn(&Context<S, E>) + Send + Sync + 'static) -> Self {
        self.enter = Some(Box::new(f));
        self
    }

    /// Sets the exit behavior.
    pub fn on_exit(mut self, f: impl Fn(&Context<S, E>) + Send + Sync + 'static) -> Self {
        self.exit = Some(Box::new(f));
        self
    }

    /// Sets the default guard for rows without one of their own.
    pub fn guard(mut self, f: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.guard = Some(Box::new(f));
        self
    }

    /// Sets the default action for rows without one of their own.
    pub fn action(
        mut self,
        f: impl Fn(&Context<S, E>) -> Result<(), BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.action = Some(Box::new(f));
        self
    }
}

impl<S: StateTag, E: Event> Default for Hooks<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateTag, E: Event> Behavior<S, E> for Hooks<S, E> {
    fn on_enter(&self, ctx: &Context<S, E>) {
        if let Some(f) = &self.enter {
            f(ctx);
        }
    }

    fn on_exit(&self, ctx: &Context<S, E>) {
        if let Some(f) = &self.exit {
            f(ctx);
        }
    }

    fn guard(&self) -> bool {
        self.guard.as_ref().map_or(true, |f| f())
    }

    fn action(&self, ctx: &Context<S, E>) -> Result<(), BoxError> {
        match &self.action {
            Some(f) => f(ctx),
            None => Ok(()),
        }
    }
}
