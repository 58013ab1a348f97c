// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process lifecycle events and a fault-isolated listener fan-out.
//!
//! `corral-comms` registers a listener here to turn state transitions
//! into broadcasts; this crate has no dependency on `corral-comms`
//! itself, keeping the dependency edge pointing the other way.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use corral_core::{Pid, StateLabel};
use corral_persistence::{Bundle, LoadContext, PersistError, SaveContext, Savable};
use parking_lot::Mutex;
use serde_json::Value;

/// A notable moment in a process's lifecycle, fired after the
/// corresponding state has already been persisted.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    StateChanged { pid: Pid, from: StateLabel, to: StateLabel },
    Paused { pid: Pid, message: Option<String> },
    Playing { pid: Pid },
    OutputEmitted { pid: Pid, name: String, value: Value },
    Finished { pid: Pid, result: Value, successful: bool },
    Excepted { pid: Pid, message: String },
    Killed { pid: Pid, message: Option<String> },
}

type Listener = dyn Fn(&ProcessEvent) + Send + Sync;

/// A registered listener. `name` gives it an identity a save can record;
/// listeners registered anonymously via [`EventTable::register`] fire
/// like any other but leave no trace in a saved bundle, since there is
/// nothing a load could use to reconstruct an arbitrary closure.
struct NamedListener {
    name: Option<String>,
    f: Arc<Listener>,
}

/// An ordered list of listeners fired in registration order on every
/// event. A listener that panics is caught and logged; it never
/// prevents listeners registered after it from running.
#[derive(Clone, Default)]
pub struct EventTable {
    listeners: Arc<Mutex<Vec<NamedListener>>>,
}

impl EventTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: impl Fn(&ProcessEvent) + Send + Sync + 'static) {
        self.listeners.lock().push(NamedListener { name: None, f: Arc::new(listener) });
    }

    /// Register a listener under a stable name, so that it survives a
    /// save as an entry in [`EventTable::listener_names`]. Reattaching the
    /// actual closure on load is the registering subsystem's own
    /// responsibility (e.g. `corral-comms` re-attaches its bridge
    /// listener whenever it wires itself up to a loaded process);
    /// `EventTable` only remembers which names were present.
    pub fn register_named(
        &self,
        name: impl Into<String>,
        listener: impl Fn(&ProcessEvent) + Send + Sync + 'static,
    ) {
        self.listeners.lock().push(NamedListener { name: Some(name.into()), f: Arc::new(listener) });
    }

    /// The names of every currently-registered named listener, in
    /// registration order.
    pub fn listener_names(&self) -> Vec<String> {
        self.listeners.lock().iter().filter_map(|l| l.name.clone()).collect()
    }

    /// Fire `event` to every registered listener, in registration order,
    /// isolating each from the others' panics.
    pub fn fire(&self, event: &ProcessEvent) {
        let listeners: Vec<Arc<Listener>> =
            self.listeners.lock().iter().map(|l| Arc::clone(&l.f)).collect();
        for listener in listeners {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| listener(event)));
            if let Err(payload) = result {
                let message = panic_message(&payload);
                tracing::error!(%message, "process event listener panicked");
            }
        }
    }
}

impl Savable for EventTable {
    const CLASS_NAME: &'static str = "corral.process.EventTable";

    /// Persists only the names of named listeners (comment 4's "list of
    /// listeners, which must themselves be savables"); the closures
    /// behind them are not data and cannot be deep-copied, so a loaded
    /// table starts empty and relies on its owner's re-attachment pass
    /// (see `register_named`) to restore them.
    fn save(&self, _ctx: &SaveContext) -> Bundle {
        let mut bundle = Bundle::new(Self::CLASS_NAME);
        bundle.set_value("listeners", self.listener_names()).expect("listener names serialize");
        bundle
    }

    fn load(bundle: &Bundle, _ctx: &LoadContext) -> Result<Self, PersistError> {
        Self::check_class(bundle)?;
        let _names: Vec<String> = bundle.get_value("listeners")?;
        Ok(Self::new())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn listeners_fire_in_registration_order() {
        let table = EventTable::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let o1 = Arc::clone(&order);
        table.register(move |_| o1.lock().push(1));
        let o2 = Arc::clone(&order);
        table.register(move |_| o2.lock().push(2));
        table.fire(&ProcessEvent::StateChanged {
            pid: Pid::new(),
            from: StateLabel::Created,
            to: StateLabel::Running,
        });
        assert_eq!(*order.lock(), vec![1, 2]);
    }

    #[test]
    fn a_panicking_listener_does_not_block_the_rest() {
        let table = EventTable::new();
        let calls = Arc::new(AtomicUsize::new(0));
        table.register(|_| panic!("boom"));
        let c = Arc::clone(&calls);
        table.register(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        table.fire(&ProcessEvent::Killed { pid: Pid::new(), message: None });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
