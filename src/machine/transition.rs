//! # Transition protocol.
//!
//! ```text
//! current.exit()          cancel + wait: the whole subtree is unwound
//!      │
//!      ▼
//! action(ctx)             runs with nothing of the machine entered
//!      │
//!      ▼
//! destination.enter()     entry behavior, registered as active
//!      │
//!      ▼
//! start_activity()        skipped for final states
//! ```
//!
//! Each step only runs if the previous one succeeded; the first error is
//! returned as is. A scope cancelled while the source was unwinding stops
//! the sequence there: the destination is not entered.

use std::sync::Arc;

use crate::error::StateError;
use crate::events::Event;
use crate::machine::table::ActionFn;
use crate::states::{Context, State, StateTag};

/// Runs the exit / action / enter / start sequence and returns the entered state.
///
/// `current` is `None` when the enclosing machine has nothing entered yet.
/// Returns `Ok(None)` when `ctx` was cancelled before the destination could be entered.
pub async fn transition_to<S: StateTag, E: Event>(
    current: Option<&Arc<State<S, E>>>,
    destination: &Arc<State<S, E>>,
    action: Option<&ActionFn<'_, S, E>>,
    ctx: &Context<S, E>,
) -> Result<Option<Arc<State<S, E>>>, StateError> {
    if let Some(current) = current {
        current.exit(ctx).await?;
    }
    if ctx.is_cancelled() {
        return Ok(None);
    }

    if let Some(action) = action {
        action(ctx).map_err(|source| StateError::ActionFailed {
            from: current.map_or_else(|| "<none>".to_string(), |s| format!("{:?}", s.tag())),
            to: format!("{:?}", destination.tag()),
            source,
        })?;
    }

    destination.enter(ctx)?;
    destination.start_activity(ctx)?;
    Ok(Some(Arc::clone(destination)))
}
