//! Cascading exit through three levels of composite states:
//!
//! ```text
//! Root ── M1 ── M2 ── M3 ── Leaf
//!   └──── Other                      Root rows: M1 -Leave-> Other, Other -Back-> M1
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use statevisor::{Config, Journal, LifecycleKind, Machine, Runtime, State, StateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Tag {
    Root,
    M1,
    M2,
    M3,
    Leaf,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Ev {
    Leave,
    Back,
}

fn wrap(tag: Tag, inner: Arc<State<Tag, Ev>>) -> Result<Arc<State<Tag, Ev>>, StateError> {
    Machine::builder(tag).initial(inner.tag()).state(inner).build()
}

fn hierarchy() -> Result<Arc<State<Tag, Ev>>, StateError> {
    let m3 = wrap(Tag::M3, State::simple(Tag::Leaf))?;
    let m2 = wrap(Tag::M2, m3)?;
    let m1 = wrap(Tag::M1, m2)?;

    Machine::builder(Tag::Root)
        .initial(Tag::M1)
        .state(m1)
        .state(State::simple(Tag::Other))
        .on(Tag::M1, Ev::Leave, Tag::Other)
        .on(Tag::Other, Ev::Back, Tag::M1)
        .subscribe([Ev::Leave, Ev::Back])
        .build()
}

async fn settles(rt: &Runtime<Tag, Ev>, expected: &[Tag]) {
    let expected: HashSet<Tag> = expected.iter().copied().collect();
    for _ in 0..200 {
        if rt.active_states().snapshot() == expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(rt.active_states().snapshot(), expected);
}

const DEEP: [Tag; 4] = [Tag::M1, Tag::M2, Tag::M3, Tag::Leaf];

#[tokio::test]
async fn test_exit_cascades_innermost_first() -> anyhow::Result<()> {
    let journal = Arc::new(Journal::new());
    let rt = Runtime::builder(Config::default())
        .with_observer(journal.clone())
        .build(hierarchy()?)?;

    rt.start()?;
    settles(&rt, &DEEP).await;
    rt.publish(Ev::Leave);
    settles(&rt, &[Tag::Other]).await;

    let steps = journal.steps(&[LifecycleKind::Entered, LifecycleKind::Exited]);
    assert_eq!(
        steps,
        vec![
            (LifecycleKind::Entered, Tag::M1),
            (LifecycleKind::Entered, Tag::M2),
            (LifecycleKind::Entered, Tag::M3),
            (LifecycleKind::Entered, Tag::Leaf),
            (LifecycleKind::Exited, Tag::Leaf),
            (LifecycleKind::Exited, Tag::M3),
            (LifecycleKind::Exited, Tag::M2),
            (LifecycleKind::Exited, Tag::M1),
            (LifecycleKind::Entered, Tag::Other),
        ]
    );

    rt.stop().await?;
    assert!(rt.active_states().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_reentry_restarts_every_level() -> anyhow::Result<()> {
    let rt = Runtime::builder(Config::default()).build(hierarchy()?)?;

    rt.start()?;
    settles(&rt, &DEEP).await;
    rt.publish(Ev::Leave);
    settles(&rt, &[Tag::Other]).await;
    rt.publish(Ev::Back);
    settles(&rt, &DEEP).await;

    rt.stop().await?;
    assert!(rt.active_states().is_empty());
    assert!(!rt.is_running());
    Ok(())
}
