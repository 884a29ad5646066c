//! Typed event dispatch
//!
//! Handlers are registered per event type and invoked synchronously, in
//! registration order, on the thread that dispatches. There is no global
//! registry: each owner (controller session, transport channel) holds its own
//! dispatchers.

use parking_lot::RwLock;
use std::sync::Arc;

/// Callback type for a single event kind
pub type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Observer list for one event type
pub struct Dispatcher<E> {
    handlers: RwLock<Vec<Handler<E>>>,
}

impl<E> Default for Dispatcher<E> {
    fn default() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }
}

impl<E> Dispatcher<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler
    pub fn subscribe<F>(&self, handler: F)
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.handlers.write().push(Arc::new(handler));
    }

    /// Invoke every handler with `event`
    pub fn dispatch(&self, event: &E) {
        // Snapshot so a handler may subscribe without deadlocking
        let handlers: Vec<Handler<E>> = self.handlers.read().clone();
        for handler in handlers {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}
