//! # Runtime: drives a root machine and tears it down gracefully.
//!
//! The [`Runtime`] owns the hierarchy's [`Context`] (bus, observers, config,
//! root cancellation token), the root composite state and the built-in
//! [`ActiveStates`] registry.
//!
//! ## Key responsibilities
//! - spawn the root's supervising loop (`start`)
//! - forward client events to the bus (`publish`)
//! - cancel the hierarchy and wait for it to unwind, bounded by [`Config::grace`] (`stop`)
//! - handle OS termination signals (`run_until_signal`)
//!
//! ## High-level architecture
//! ```text
//! RuntimeBuilder::build(root)
//!   ├─► Bus::new(cfg.unknown_events)
//!   ├─► wire(): every machine's subscriptions → its inbox
//!   └─► ObserverSet [ActiveStates, user observers...]
//!
//! start():
//!   root.start_activity(ctx) ──► child token ──► supervise(root)
//!                                                 └─► enters initial path
//!                                                     (sub-machines spawn their own loops)
//!
//! stop():
//!   root.stop_activity_within(grace) = cancel + wait
//!     ├─ unwound within grace → Ok / fault reported by the hierarchy
//!     └─ timeout              → GraceExceeded { stuck: ActiveStates::names() },
//!                               activity kept: still running, start() rejected
//! ```
//!
//! - The root is supervised but never entered: the registry lists its descendants.
//! - Dropping the runtime cancels the whole hierarchy without waiting.
//!
//! ## Example
//! ```rust
//! use statevisor::{Config, Machine, Runtime, State};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Door { Root, Closed, Open }
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Push { Open, Close }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let root = Machine::builder(Door::Root)
//!         .initial(Door::Closed)
//!         .state(State::simple(Door::Closed))
//!         .state(State::simple(Door::Open))
//!         .on(Door::Closed, Push::Open, Door::Open)
//!         .on(Door::Open, Push::Close, Door::Closed)
//!         .subscribe([Push::Open, Push::Close])
//!         .build()?;
//!
//!     let runtime = Runtime::builder(Config::default()).build(root)?;
//!     runtime.start()?;
//!     runtime.publish(Push::Open);
//!     runtime.stop().await?;
//!     assert!(runtime.active_states().is_empty());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use crate::core::{shutdown, Config, RuntimeBuilder};
use crate::error::RuntimeError;
use crate::events::{Bus, Event};
use crate::observers::ActiveStates;
use crate::states::{Context, State, StateTag};

/// Drives one state hierarchy.
pub struct Runtime<S: StateTag, E: Event> {
    ctx: Context<S, E>,
    root: Arc<State<S, E>>,
    active: Arc<ActiveStates<S>>,
}

impl<S: StateTag, E: Event> Runtime<S, E> {
    /// Starts building a runtime with the given configuration.
    pub fn builder(cfg: Config) -> RuntimeBuilder<S, E> {
        RuntimeBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        ctx: Context<S, E>,
        root: Arc<State<S, E>>,
        active: Arc<ActiveStates<S>>,
    ) -> Self {
        Self { ctx, root, active }
    }

    /// Spawns the root's supervising loop.
    ///
    /// Must be called from within a tokio runtime. Starting twice without
    /// stopping fails with [`StateError::ActivityRunning`](crate::StateError::ActivityRunning).
    pub fn start(&self) -> Result<(), RuntimeError> {
        self.root.start_activity(&self.ctx)?;
        tracing::info!(root = ?self.root.tag(), "runtime started");
        Ok(())
    }

    /// Cancels the hierarchy and waits until it has fully unwound.
    ///
    /// Returns the first fault the hierarchy reported, if any, or
    /// [`RuntimeError::GraceExceeded`] when [`Config::grace`] elapses first.
    /// In that case the hierarchy keeps unwinding: the runtime still reports
    /// running until it has, and calling `stop` again waits for the rest.
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        let unwound = match self.ctx.config().grace_limit() {
            None => self.root.stop_activity().await,
            Some(grace) => match self.root.stop_activity_within(grace).await {
                Some(unwound) => unwound,
                None => {
                    let stuck = self.active.names();
                    tracing::warn!(?grace, ?stuck, "grace exceeded while stopping");
                    return Err(RuntimeError::GraceExceeded { grace, stuck });
                }
            },
        };

        match &unwound {
            Ok(()) => tracing::info!(root = ?self.root.tag(), "runtime stopped"),
            Err(err) => tracing::warn!(
                root = ?self.root.tag(),
                label = err.as_label(),
                error = %err,
                "runtime stopped with fault"
            ),
        }
        unwound.map_err(RuntimeError::from)
    }

    /// Starts, waits for a termination signal, then stops.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        self.start()?;
        if let Err(err) = shutdown::wait_for_shutdown_signal().await {
            if let Err(stop_err) = self.stop().await {
                tracing::warn!(
                    label = stop_err.as_label(),
                    error = %stop_err,
                    "stop after failed signal registration reported a fault"
                );
            }
            return Err(RuntimeError::Signal(err));
        }
        self.stop().await
    }

    /// Publishes a client event on the hierarchy's bus.
    #[inline]
    pub fn publish(&self, event: E) -> usize {
        self.ctx.publish(event)
    }

    #[inline]
    pub fn bus(&self) -> &Bus<E> {
        self.ctx.bus()
    }

    /// Returns the root context (cancelled when the runtime is dropped).
    pub fn context(&self) -> &Context<S, E> {
        &self.ctx
    }

    /// Returns the registry of currently entered states.
    pub fn active_states(&self) -> &Arc<ActiveStates<S>> {
        &self.active
    }

    #[inline]
    pub fn root(&self) -> &Arc<State<S, E>> {
        &self.root
    }

    /// Returns `true` while the root's supervising loop runs.
    pub fn is_running(&self) -> bool {
        self.root.is_running()
    }
}

impl<S: StateTag, E: Event> Drop for Runtime<S, E> {
    fn drop(&mut self) {
        self.ctx.token().cancel();
    }
}

impl<S: StateTag, E: Event> std::fmt::Debug for Runtime<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("root", &self.root)
            .field("active", &self.active.names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::machine::{Machine, Transition};
    use crate::observers::{Journal, LifecycleKind};
    use crate::states::Behavior;
    use std::collections::HashSet;
    use std::time::Duration;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum T {
        Root,
        Left,
        LA,
        LB,
        LDone,
        Right,
        Stubborn,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Ev {
        Go,
        Back,
        Next,
        Finish,
        LeftDone,
        Stray,
        Leave,
        XDone,
    }

    fn left(history: bool) -> Arc<State<T, Ev>> {
        Machine::builder(T::Left)
            .initial(T::LA)
            .final_state(T::LDone)
            .history(history)
            .completes_with(Ev::LeftDone)
            .state(State::simple(T::LA))
            .state(State::simple(T::LB))
            .state(State::final_state(T::LDone))
            .on(T::LA, Ev::Next, T::LB)
            .on(T::LB, Ev::Finish, T::LDone)
            .subscribe([Ev::Next, Ev::Finish])
            .build()
            .unwrap()
    }

    fn root_with(left: Arc<State<T, Ev>>, back: Transition<T, Ev>) -> Arc<State<T, Ev>> {
        Machine::builder(T::Root)
            .initial(T::Left)
            .state(left)
            .state(State::simple(T::Right))
            .on(T::Left, Ev::Go, T::Right)
            .on_completion(T::Left, Ev::LeftDone, T::Right)
            .transition(back)
            .subscribe([Ev::Go, Ev::Back, Ev::LeftDone])
            .build()
            .unwrap()
    }

    fn runtime(history: bool, journal: Option<Arc<Journal<T>>>) -> Runtime<T, Ev> {
        let root = root_with(left(history), Transition::new(T::Right, Ev::Back, T::Left));
        let mut builder = Runtime::builder(Config::default());
        if let Some(journal) = journal {
            builder = builder.with_observer(journal);
        }
        builder.build(root).unwrap()
    }

    fn set(states: &[T]) -> HashSet<T> {
        states.iter().copied().collect()
    }

    async fn eventually(cond: impl Fn() -> bool) -> bool {
        for _ in 0..200 {
            if cond() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        cond()
    }

    async fn settles(rt: &Runtime<T, Ev>, expected: &[T]) {
        let expected = set(expected);
        eventually(|| rt.active_states().snapshot() == expected).await;
        assert_eq!(rt.active_states().snapshot(), expected);
    }

    #[tokio::test]
    async fn test_start_enters_initial_path() {
        let rt = runtime(false, None);
        rt.start().unwrap();
        settles(&rt, &[T::Left, T::LA]).await;
        assert!(rt.is_running());
        assert!(!rt.root().is_active());
        rt.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_no_history_reenters_initial() {
        let rt = runtime(false, None);
        rt.start().unwrap();
        settles(&rt, &[T::Left, T::LA]).await;

        rt.publish(Ev::Next);
        settles(&rt, &[T::Left, T::LB]).await;
        rt.publish(Ev::Go);
        settles(&rt, &[T::Right]).await;
        rt.publish(Ev::Back);
        settles(&rt, &[T::Left, T::LA]).await;
        rt.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_history_resumes_last_sub_state() {
        let rt = runtime(true, None);
        rt.start().unwrap();
        settles(&rt, &[T::Left, T::LA]).await;

        rt.publish(Ev::Next);
        settles(&rt, &[T::Left, T::LB]).await;
        rt.publish(Ev::Go);
        settles(&rt, &[T::Right]).await;
        assert_eq!(rt.root().as_machine().unwrap().active(), T::Right);

        rt.publish(Ev::Back);
        settles(&rt, &[T::Left, T::LB]).await;
        rt.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_final_state_completes_once_and_clears_history() {
        let journal = Arc::new(Journal::new());
        let rt = runtime(true, Some(journal.clone()));
        rt.start().unwrap();
        settles(&rt, &[T::Left, T::LA]).await;

        rt.publish(Ev::Next);
        settles(&rt, &[T::Left, T::LB]).await;
        rt.publish(Ev::Finish);
        settles(&rt, &[T::Right]).await;

        let completed: Vec<_> = journal
            .records()
            .into_iter()
            .filter(|r| r.kind == LifecycleKind::Completed)
            .map(|r| r.state)
            .collect();
        assert_eq!(completed, vec![T::Left]);

        rt.publish(Ev::Back);
        settles(&rt, &[T::Left, T::LA]).await;
        rt.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_exit_unwinds_subtree_before_entering_destination() {
        let journal = Arc::new(Journal::new());
        let rt = runtime(false, Some(journal.clone()));
        rt.start().unwrap();
        settles(&rt, &[T::Left, T::LA]).await;

        rt.publish(Ev::Go);
        settles(&rt, &[T::Right]).await;

        let steps = journal.steps(&[LifecycleKind::Entered, LifecycleKind::Exited]);
        let at = |step: (LifecycleKind, T)| steps.iter().position(|s| *s == step).unwrap();
        assert!(at((LifecycleKind::Exited, T::LA)) < at((LifecycleKind::Exited, T::Left)));
        assert!(at((LifecycleKind::Exited, T::Left)) < at((LifecycleKind::Entered, T::Right)));
        rt.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_event_is_ignored() {
        let rt = runtime(false, None);
        rt.start().unwrap();
        settles(&rt, &[T::Left, T::LA]).await;

        assert_eq!(rt.publish(Ev::Stray), 0);
        assert!(rt.bus().try_publish(Ev::Stray).is_err());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(rt.active_states().snapshot(), set(&[T::Left, T::LA]));
        rt.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_empties_registry() {
        let rt = runtime(true, None);
        rt.start().unwrap();
        settles(&rt, &[T::Left, T::LA]).await;

        rt.stop().await.unwrap();
        assert!(rt.active_states().is_empty());
        assert!(!rt.is_running());
        assert_eq!(rt.root().as_machine().unwrap().active(), T::Left);
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let rt = runtime(false, None);
        rt.start().unwrap();
        settles(&rt, &[T::Left, T::LA]).await;
        rt.stop().await.unwrap();

        rt.start().unwrap();
        settles(&rt, &[T::Left, T::LA]).await;
        rt.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let rt = runtime(false, None);
        rt.start().unwrap();
        let err = rt.start().unwrap_err();
        assert_eq!(err.as_label(), "state_activity_running");
        rt.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_action_failure_faults_machine() {
        let journal = Arc::new(Journal::new());
        let back = Transition::new(T::Right, Ev::Back, T::Left)
            .with_action(|_| -> Result<(), BoxError> { Err("door jammed".into()) });
        let root = root_with(left(false), back);
        let rt = Runtime::builder(Config::default())
            .with_observer(journal.clone())
            .build(root)
            .unwrap();
        rt.start().unwrap();
        settles(&rt, &[T::Left, T::LA]).await;

        rt.publish(Ev::Go);
        settles(&rt, &[T::Right]).await;
        rt.publish(Ev::Back);
        assert!(eventually(|| !journal.steps(&[LifecycleKind::Faulted]).is_empty()).await);
        assert!(rt.active_states().is_empty());

        let faulted = journal.steps(&[LifecycleKind::Faulted]);
        assert_eq!(faulted, vec![(LifecycleKind::Faulted, T::Root)]);

        let err = rt.stop().await.unwrap_err();
        assert_eq!(err.as_label(), "state_action_failed");
        assert!(rt.active_states().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_target_faults_machine() {
        let back = Transition::new(T::Right, Ev::Back, T::Stubborn);
        let root = root_with(left(false), back);
        let rt = Runtime::builder(Config::default()).build(root).unwrap();
        rt.start().unwrap();
        settles(&rt, &[T::Left, T::LA]).await;

        rt.publish(Ev::Go);
        settles(&rt, &[T::Right]).await;
        rt.publish(Ev::Back);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(rt.active_states().snapshot(), set(&[T::Right]));

        let err = rt.stop().await.unwrap_err();
        assert_eq!(err.as_label(), "state_unknown_state");
        assert!(rt.active_states().is_empty());
    }

    #[test]
    fn test_root_must_be_composite() {
        let err = Runtime::<T, Ev>::builder(Config::default())
            .build(State::simple(T::Right))
            .unwrap_err();
        assert_eq!(err.as_label(), "runtime_root_not_composite");
    }

    struct IgnoresCancel;

    #[async_trait::async_trait]
    impl Behavior<T, Ev> for IgnoresCancel {
        async fn run(&self, _ctx: Context<T, Ev>) -> Result<(), BoxError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_grace_exceeded_reports_stuck_states() {
        let root = Machine::builder(T::Root)
            .initial(T::Stubborn)
            .state(State::simple_with(T::Stubborn, IgnoresCancel))
            .build()
            .unwrap();
        let cfg = Config {
            grace: Duration::from_millis(30),
            ..Config::default()
        };
        let rt = Runtime::builder(cfg).build(root).unwrap();
        rt.start().unwrap();
        settles(&rt, &[T::Stubborn]).await;

        match rt.stop().await.unwrap_err() {
            RuntimeError::GraceExceeded { grace, stuck } => {
                assert_eq!(grace, Duration::from_millis(30));
                assert_eq!(stuck, vec!["Stubborn".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(rt.is_running());
        assert_eq!(rt.start().unwrap_err().as_label(), "state_activity_running");
    }

    struct SlowToCancel(Duration);

    #[async_trait::async_trait]
    impl<S: StateTag, E: Event> Behavior<S, E> for SlowToCancel {
        async fn run(&self, ctx: Context<S, E>) -> Result<(), BoxError> {
            ctx.cancelled().await;
            tokio::time::sleep(self.0).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stop_after_grace_exceeded_waits_for_the_rest() {
        let root = Machine::builder(T::Root)
            .initial(T::Stubborn)
            .state(State::simple_with(T::Stubborn, SlowToCancel(Duration::from_millis(100))))
            .build()
            .unwrap();
        let cfg = Config {
            grace: Duration::from_millis(20),
            ..Config::default()
        };
        let rt = Runtime::builder(cfg).build(root).unwrap();
        rt.start().unwrap();
        settles(&rt, &[T::Stubborn]).await;

        let err = rt.stop().await.unwrap_err();
        assert_eq!(err.as_label(), "runtime_grace_exceeded");
        assert!(rt.is_running());
        assert_eq!(rt.active_states().names(), vec!["Stubborn".to_string()]);

        assert!(eventually(|| !rt.is_running()).await);
        rt.stop().await.unwrap();
        assert!(rt.active_states().is_empty());

        rt.start().unwrap();
        settles(&rt, &[T::Stubborn]).await;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum N {
        Root,
        X,
        XA,
        XF,
        Y,
        Z,
    }

    #[tokio::test]
    async fn test_exited_machine_abandons_its_pending_transition() {
        let x = Machine::builder(N::X)
            .initial(N::XA)
            .final_state(N::XF)
            .completes_with(Ev::XDone)
            .state(State::simple_with(N::XA, SlowToCancel(Duration::from_millis(50))))
            .state(State::final_state(N::XF))
            .on(N::XA, Ev::Go, N::XF)
            .subscribe([Ev::Go])
            .build()
            .unwrap();
        let root = Machine::builder(N::Root)
            .initial(N::X)
            .state(x)
            .state(State::simple(N::Y))
            .state(State::simple(N::Z))
            .on(N::X, Ev::Leave, N::Y)
            .on(N::Y, Ev::XDone, N::Z)
            .subscribe([Ev::Leave, Ev::XDone])
            .build()
            .unwrap();
        let journal = Arc::new(Journal::new());
        let rt = Runtime::builder(Config::default())
            .with_observer(journal.clone())
            .build(root)
            .unwrap();
        rt.start().unwrap();
        let at = |expected: &[N]| {
            let expected: HashSet<N> = expected.iter().copied().collect();
            let active = Arc::clone(rt.active_states());
            move || active.snapshot() == expected
        };
        assert!(eventually(at(&[N::X, N::XA])).await);

        // X is still unwinding XA when Root leaves it.
        rt.publish(Ev::Go);
        tokio::time::sleep(Duration::from_millis(10)).await;
        rt.publish(Ev::Leave);

        assert!(eventually(at(&[N::Y])).await);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(at(&[N::Y])());

        let steps = journal.steps(&[LifecycleKind::Entered, LifecycleKind::Completed]);
        assert!(!steps.contains(&(LifecycleKind::Entered, N::XF)));
        assert!(!steps.iter().any(|(kind, _)| *kind == LifecycleKind::Completed));
        rt.stop().await.unwrap();
    }
}
