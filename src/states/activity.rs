//! # Handle to a running do-activity.
//!
//! An [`Activity`] pairs the spawned task with the token that cancels it.
//! It is owned exclusively by its [`State`](crate::State); only the state's
//! exit (or the runtime stopping the root) cancels it.
//!
//! ## Rules
//! - `cancel_and_wait` cancels, then waits until the task has returned, so a
//!   machine's whole subtree is unwound when it completes.
//! - Cancelling an activity that already finished is a no-op; its result is
//!   still reported.
//! - A panic inside the task is reported as [`StateError::ActivityPanicked`].
//! - A wait that is given up on leaves the handle usable: it can be put back
//!   and waited on again.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::StateError;

pub(crate) struct Activity {
    token: CancellationToken,
    join: JoinHandle<Result<(), StateError>>,
}

impl Activity {
    pub(crate) fn new(token: CancellationToken, join: JoinHandle<Result<(), StateError>>) -> Self {
        Self { token, join }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancels the task and waits for it to acknowledge.
    pub(crate) async fn cancel_and_wait(mut self, state: &str) -> Result<(), StateError> {
        self.cancel();
        self.wait(state).await
    }

    /// Waits for the task to return.
    ///
    /// Must not be called again once it has completed.
    pub(crate) async fn wait(&mut self, state: &str) -> Result<(), StateError> {
        match (&mut self.join).await {
            Ok(result) => result,
            Err(join_err) if join_err.is_panic() => {
                let panic_err = join_err.into_panic();
                let info = if let Some(msg) = panic_err.downcast_ref::<&'static str>() {
                    (*msg).to_string()
                } else if let Some(msg) = panic_err.downcast_ref::<String>() {
                    msg.clone()
                } else {
                    "unknown panic".to_string()
                };
                Err(StateError::ActivityPanicked {
                    state: state.to_string(),
                    info,
                })
            }
            Err(_aborted) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_waits_for_acknowledgement() {
        let token = CancellationToken::new();
        let child = token.clone();
        let join = tokio::spawn(async move {
            child.cancelled().await;
            tokio::task::yield_now().await;
            Ok(())
        });

        let activity = Activity::new(token, join);
        assert!(!activity.is_finished());
        assert!(activity.cancel_and_wait("Leaf").await.is_ok());
    }

    #[tokio::test]
    async fn test_finished_activity_reports_its_result() {
        let join = tokio::spawn(async {
            Err(StateError::ActivityRunning {
                state: "Leaf".into(),
            })
        });
        tokio::task::yield_now().await;

        let err = Activity::new(CancellationToken::new(), join)
            .cancel_and_wait("Leaf")
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "state_activity_running");
    }

    #[tokio::test]
    async fn test_panic_is_reported() {
        let join = tokio::spawn(async {
            if true {
                panic!("do-activity blew up");
            }
            Ok(())
        });

        let err = Activity::new(CancellationToken::new(), join)
            .cancel_and_wait("Leaf")
            .await
            .unwrap_err();
        match err {
            StateError::ActivityPanicked { state, info } => {
                assert_eq!(state, "Leaf");
                assert_eq!(info, "do-activity blew up");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
