use std::marker::PhantomData;
use std::sync::Arc;

use super::runtime::Runtime;
use crate::{
    core::Config,
    error::RuntimeError,
    events::{Bus, Event},
    observers::{ActiveStates, Observe, ObserverSet},
    states::{Context, State, StateTag},
};

/// Builder for constructing a [`Runtime`] around a root machine.
pub struct RuntimeBuilder<S, E> {
    cfg: Config,
    observers: Vec<Arc<dyn Observe<S>>>,
    _events: PhantomData<fn() -> E>,
}

impl<S: StateTag, E: Event> RuntimeBuilder<S, E> {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            observers: Vec::new(),
            _events: PhantomData,
        }
    }

    /// Replaces the lifecycle observers.
    ///
    /// The runtime's own [`ActiveStates`] registry is always installed first.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe<S>>>) -> Self {
        self.observers = observers;
        self
    }

    /// Adds one lifecycle observer.
    pub fn with_observer(mut self, observer: Arc<dyn Observe<S>>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Builds the runtime:
    /// - checks the root is a machine
    /// - creates the hierarchy's bus
    /// - subscribes every machine's inbox, walking the whole tree
    pub fn build(self, root: Arc<State<S, E>>) -> Result<Runtime<S, E>, RuntimeError> {
        if !root.is_composite() {
            return Err(RuntimeError::RootNotComposite {
                root: format!("{:?}", root.tag()),
            });
        }

        let bus = Bus::new(self.cfg.unknown_events);
        wire(&bus, &root);

        let active = Arc::new(ActiveStates::new());
        let mut observers: Vec<Arc<dyn Observe<S>>> = Vec::with_capacity(self.observers.len() + 1);
        observers.push(active.clone());
        observers.extend(self.observers);

        let ctx = Context::new(bus, Arc::new(ObserverSet::new(observers)), self.cfg);
        Ok(Runtime::new_internal(ctx, root, active))
    }
}

fn wire<S: StateTag, E: Event>(bus: &Bus<E>, state: &State<S, E>) {
    let Some(machine) = state.as_machine() else {
        return;
    };
    bus.subscribe_to(machine.subscriptions().iter().copied(), machine.inbox());
    for sub in machine.sub_states() {
        wire(bus, sub);
    }
}
