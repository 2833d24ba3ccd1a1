//! # Supervising loop of a machine.
//!
//! [`supervise`] is the do-activity of every composite state. It owns the
//! machine's inbox for one activation and drives the transition table.
//!
//! ## Flow
//! ```text
//! supervise(node, ctx)
//!   ├─► lease inbox (InboxBusy if already leased)
//!   ├─► manage():
//!   │     transition(None → entry destination)
//!   │     loop {
//!   │       select! (biased) {
//!   │         ctx.cancelled()  → return Ok
//!   │         inbox.recv()     → dispatch(event)?
//!   │       }
//!   │     }
//!   ├─► on fault: log, Faulted, park until cancelled
//!   └─► unwind(): record history, exit active sub-state, reset cursor
//! ```
//!
//! ## Rules
//! - Cancellation is checked before the next event.
//! - A fault never tears the partial configuration down by itself; the
//!   parent's exit (or the runtime stopping) does, and then observes the error.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::StateError;
use crate::events::{Event, InboxLease};
use crate::machine::Machine;
use crate::observers::{Lifecycle, LifecycleKind};
use crate::states::{Context, State, StateTag};

/// Boxed supervising loop, as spawned by [`State::start_activity`].
pub(crate) type Supervision = Pin<Box<dyn Future<Output = Result<(), StateError>> + Send>>;

/// Runs the machine of `node` until `ctx` is cancelled.
pub(crate) fn supervise<S: StateTag, E: Event>(
    node: Arc<State<S, E>>,
    ctx: Context<S, E>,
) -> Supervision {
    Box::pin(async move {
        let Some(machine) = node.as_machine() else {
            return Ok(());
        };
        let Some(mut inbox) = machine.inbox().lease() else {
            return Err(StateError::InboxBusy {
                machine: node.label(),
            });
        };

        tracing::debug!(machine = ?node.tag(), "machine started");
        let managed = manage(&node, machine, &mut inbox, &ctx).await;

        if let Err(err) = &managed {
            tracing::error!(
                machine = ?node.tag(),
                label = err.as_label(),
                error = %err,
                "machine faulted; parked until exit"
            );
            ctx.notify(Lifecycle::new(LifecycleKind::Faulted, node.tag()).with_reason(err.to_string()));
            ctx.cancelled().await;
        }

        let unwound = machine.unwind(&node, &ctx).await;
        drop(inbox);
        tracing::debug!(machine = ?node.tag(), "machine stopped");
        managed.and(unwound)
    })
}

async fn manage<S: StateTag, E: Event>(
    node: &State<S, E>,
    machine: &Machine<S, E>,
    inbox: &mut InboxLease<'_, E>,
    ctx: &Context<S, E>,
) -> Result<(), StateError> {
    let destination = machine.entry_destination();
    machine.transition(node, None, destination, None, ctx).await?;

    loop {
        tokio::select! {
            biased;

            _ = ctx.cancelled() => return Ok(()),

            next = inbox.recv() => match next {
                Some(event) => machine.dispatch(node, event, ctx).await?,
                None => {
                    ctx.cancelled().await;
                    return Ok(());
                }
            },
        }
    }
}
