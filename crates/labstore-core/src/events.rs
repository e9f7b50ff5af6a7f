//! Event channel: the observer interface the store announces changes through.
//!
//! Listeners run synchronously inside the store operation that triggered
//! them and receive a shared reference to the store, so they read whatever
//! they need directly. A failing listener aborts the emission and its error
//! is returned to the caller of the triggering operation.

use crate::error::{ListenerError, Result, StoreError};
use crate::models::StoreEvent;
use crate::store::Store;

/// Anything the store can announce its events to.
pub trait EventChannel {
    fn emit(&self, event: StoreEvent, store: &Store) -> Result<()>;
}

type Listener = Box<dyn Fn(StoreEvent, &Store) -> std::result::Result<(), ListenerError>>;

/// Default channel: listeners registered per event (or for all events),
/// called in registration order.
#[derive(Default)]
pub struct Emitter {
    listeners: Vec<(Option<StoreEvent>, Listener)>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one event.
    pub fn on<F>(&mut self, event: StoreEvent, listener: F) -> &mut Self
    where
        F: Fn(&Store) -> std::result::Result<(), ListenerError> + 'static,
    {
        self.listeners
            .push((Some(event), Box::new(move |_, store| listener(store))));
        self
    }

    /// Register a listener for every event.
    pub fn on_any<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(StoreEvent, &Store) -> std::result::Result<(), ListenerError> + 'static,
    {
        self.listeners.push((None, Box::new(listener)));
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl EventChannel for Emitter {
    fn emit(&self, event: StoreEvent, store: &Store) -> Result<()> {
        for (filter, listener) in &self.listeners {
            if filter.map_or(true, |wanted| wanted == event) {
                listener(event, store).map_err(|source| StoreError::Listener { event, source })?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
