//! # Demo: two_regions
//!
//! Drives a root machine with two composite regions through a scripted
//! sequence of events and prints the active states after each step.
//!
//! Demonstrates how to:
//! - Build nested machines with [`Machine::builder`].
//! - Resume a region from history (`B`) and special-case an entry (`A`).
//! - Chain regions through completion events published by final states.
//! - Watch the lifecycle through [`LogWriter`] and [`ActiveStates`](statevisor::ActiveStates).
//!
//! ## Flow
//! ```text
//! Root ── A (Aa, Ab, Af) ──Ev0 / AFinished──► B (Ba, Bb, Bf, history)
//!      ◄──────────────── Ev1 / BFinished ────
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example two_regions --features logging
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use statevisor::{Config, Hooks, LogWriter, Machine, Observe, Runtime, State, StateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Sm {
    Root,
    A,
    Aa,
    Ab,
    Af,
    B,
    Ba,
    Bb,
    Bf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Ev {
    Ev0,
    Ev1,
    Ev2,
    Ev3,
    Ev4,
    AFinished,
    BFinished,
}

fn build() -> Result<Arc<State<Sm, Ev>>, StateError> {
    // Entries into Aa; A resumes at Ab once Aa has been visited.
    let visits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&visits);

    let a = Machine::builder(Sm::A)
        .initial(Sm::Aa)
        .final_state(Sm::Af)
        .completes_with(Ev::AFinished)
        .entry_with(move |initial| {
            if visits.load(Ordering::SeqCst) == 0 {
                initial
            } else {
                Sm::Ab
            }
        })
        .state(State::simple_with(
            Sm::Aa,
            Hooks::new().on_enter(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        ))
        .state(State::simple(Sm::Ab))
        .state(State::final_state(Sm::Af))
        .on(Sm::Aa, Ev::Ev1, Sm::Ab)
        .on(Sm::Ab, Ev::Ev1, Sm::Af)
        .on(Sm::Ab, Ev::Ev2, Sm::Aa)
        .subscribe([Ev::Ev1, Ev::Ev2])
        .build()?;

    let b = Machine::builder(Sm::B)
        .initial(Sm::Ba)
        .final_state(Sm::Bf)
        .completes_with(Ev::BFinished)
        .history(true)
        .state(State::simple(Sm::Ba))
        .state(State::simple(Sm::Bb))
        .state(State::final_state(Sm::Bf))
        .on(Sm::Ba, Ev::Ev3, Sm::Bb)
        .on(Sm::Ba, Ev::Ev4, Sm::Bf)
        .on(Sm::Bb, Ev::Ev3, Sm::Bf)
        .subscribe([Ev::Ev3, Ev::Ev4])
        .build()?;

    Machine::builder(Sm::Root)
        .initial(Sm::A)
        .state(a)
        .state(b)
        .on(Sm::A, Ev::Ev0, Sm::B)
        .on_completion(Sm::A, Ev::AFinished, Sm::B)
        .on(Sm::B, Ev::Ev1, Sm::A)
        .on_completion(Sm::B, Ev::BFinished, Sm::A)
        .subscribe([Ev::Ev0, Ev::Ev1, Ev::AFinished, Ev::BFinished])
        .build()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 1. Runtime with a bounded shutdown
    let cfg = Config {
        grace: Duration::from_secs(2),
        ..Config::default()
    };
    let observers: Vec<Arc<dyn Observe<Sm>>> = vec![Arc::new(LogWriter::new())];
    let rt = Runtime::builder(cfg).with_observers(observers).build(build()?)?;

    // 2. Enter the initial path
    rt.start()?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("start    -> {:?}", rt.active_states().names());

    // 3. Script
    for event in [
        Ev::Ev0,
        Ev::Ev1,
        Ev::Ev1,
        Ev::Ev3,
        Ev::Ev1,
        Ev::Ev0,
        Ev::Ev3,
        Ev::Ev0,
        Ev::Ev1,
    ] {
        rt.publish(event);
        tokio::time::sleep(Duration::from_millis(50)).await;
        println!("{:<8} -> {:?}", format!("{event:?}"), rt.active_states().names());
    }

    // 4. Unwind everything
    rt.stop().await?;
    println!("stopped  -> {:?}", rt.active_states().names());
    Ok(())
}
